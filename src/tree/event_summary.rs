use quick_xml::events::BytesStart;
use quick_xml::name::QName;

use std::fmt;

/// Short description of an xml event for error messages
#[derive(Debug)]
pub(crate) struct EventSummary {
    name: Option<String>,
    e_type: &'static str,
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "element `{name}` with type {}", self.e_type),
            None => write!(f, "unnamed event with type {}", self.e_type),
        }
    }
}

impl EventSummary {
    pub(crate) fn eof() -> Self {
        Self {
            name: None,
            e_type: "eof",
        }
    }

    pub(crate) fn start(bytes: &BytesStart<'_>) -> Self {
        Self {
            name: Some(name_to_string(bytes.name())),
            e_type: "start",
        }
    }
}

pub(crate) fn name_to_string(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries() {
        let start = BytesStart::new("Grid");
        assert_eq!(
            EventSummary::start(&start).to_string(),
            "element `Grid` with type start"
        );
        assert_eq!(EventSummary::eof().to_string(), "unnamed event with type eof");
    }
}
