//! Parameters that control how a mesh is written
use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Where the heavy data of a document is stored
pub enum DataFormat {
    /// as text inside each `DataItem`
    Inline,
    /// appended to a `.bin` side-car, referenced by byte offset
    Binary,
    /// as datasets of an HDF5 `.h5` side-car, referenced by path
    #[default]
    Hierarchical,
}

impl DataFormat {
    /// value of the `Format` attribute of a `DataItem`
    pub(crate) fn to_str(&self) -> &'static str {
        match &self {
            Self::Inline => "XML",
            Self::Binary => "Binary",
            Self::Hierarchical => "HDF",
        }
    }

    pub(crate) fn from_xdmf(format: &str) -> Result<Self, UnsupportedFeature> {
        match format.trim() {
            "XML" => Ok(Self::Inline),
            "Binary" => Ok(Self::Binary),
            "HDF" => Ok(Self::Hierarchical),
            other => Err(UnsupportedFeature::DataFormat(other.into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Precision that floating point arrays are written with
pub enum Precision {
    /// every array keeps its element type
    #[default]
    Native,
    /// double precision arrays are narrowed to single precision
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Options for [`write_xdmf`](crate::write_xdmf) and
/// [`TimeSeriesWriter`](crate::TimeSeriesWriter)
pub struct WriteOptions {
    pub data_format: DataFormat,
    pub precision: Precision,
    /// arrays with fewer elements than this are written inline regardless of
    /// `data_format`. Zero disables the routing.
    pub inline_threshold: usize,
}

impl WriteOptions {
    pub fn new(data_format: DataFormat) -> Self {
        Self {
            data_format,
            ..Default::default()
        }
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_inline_threshold(mut self, inline_threshold: usize) -> Self {
        self.inline_threshold = inline_threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = WriteOptions::default();
        assert_eq!(options.data_format, DataFormat::Hierarchical);
        assert_eq!(options.precision, Precision::Native);
        assert_eq!(options.inline_threshold, 0);
    }

    #[test]
    fn format_names() {
        for format in [DataFormat::Inline, DataFormat::Binary, DataFormat::Hierarchical] {
            assert_eq!(DataFormat::from_xdmf(format.to_str()).unwrap(), format);
        }
        assert!(matches!(
            DataFormat::from_xdmf("Base64"),
            Err(UnsupportedFeature::DataFormat(_))
        ));
    }
}
