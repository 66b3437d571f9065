use crate::prelude::*;

/// side-car file that lives next to the document at `document`. A document that already
/// carries the side-car extension gets it appended instead, so the two never coincide.
pub(crate) fn sidecar_path(document: &Path, extension: &str) -> PathBuf {
    let same_extension = document
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case(extension));

    if same_extension {
        let mut name = document.as_os_str().to_os_string();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    } else {
        document.with_extension(extension)
    }
}

/// name of a file relative to the directory of the document that references it
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// format a float with the shortest representation that parses back to the same value
pub(crate) fn shortest_float(value: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format(value).to_string()
}

/// parse a `Dimensions` attribute such as `"10 3"`
pub(crate) fn parse_dimensions(element: &Element) -> Result<Vec<usize>, FormatError> {
    let value = element.require_attribute("Dimensions")?;

    let dims = value
        .split_ascii_whitespace()
        .map(|dim| dim.parse::<usize>())
        .collect::<Result<Vec<_>, _>>();

    match dims {
        Ok(dims) if !dims.is_empty() && crate::array::element_count(&dims).is_some() => Ok(dims),
        _ => Err(InvalidAttributeValue::new(
            element.tag().into(),
            "Dimensions".into(),
            "whitespace separated non-negative integers with an addressable product".into(),
            value.into(),
        )
        .into()),
    }
}

pub(crate) fn format_dimensions(dims: &[usize]) -> String {
    dims.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
