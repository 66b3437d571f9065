//! `DataItem` elements and the heavy data they reference.
//!
//! [`ReferenceSink`] turns arrays into data items while a document is written and
//! [`ReferenceSource`] turns data items back into arrays, checking that the heavy data
//! agrees with the shape and element type declared in the light data.

use crate::heavy::{inline, Endian, HeavyDataReader, HeavyDataWriter};
use crate::prelude::*;
use crate::utils;

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// What a data item describes, implied by its parent element
pub enum Role {
    Geometry,
    Topology,
    Attribute,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Geometry => "geometry",
            Self::Topology => "topology",
            Self::Attribute => "attribute",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where the heavy data of a data item lives
pub enum Locator {
    /// the values themselves
    Inline(String),
    /// byte offset into a binary side-car. Without a file name the side-car is the one next
    /// to the document.
    Binary { file: Option<String>, offset: u64 },
    /// dataset path inside an HDF5 file. Without a file name the file is the one next to
    /// the document.
    Hierarchical {
        file: Option<String>,
        dataset: String,
    },
}

impl Locator {
    /// Classify the text of a data item by its lexical form: `seek:<offset>` is binary,
    /// `<file>:/<path>` or `/<path>` is hierarchical and anything else is inline values.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let text = text.trim();

        if let Some(offset) = text.strip_prefix("seek:") {
            let offset = offset.trim().parse().map_err(|_| {
                InvalidLocator::new(text.into(), "the offset is not a non-negative integer".into())
            })?;
            return Ok(Self::Binary { file: None, offset });
        }

        if let Some(idx) = text.find(":/") {
            let file = &text[..idx];
            let file = (!file.is_empty()).then(|| file.to_string());
            let dataset = text[idx + 1..].to_string();
            return Ok(Self::Hierarchical { file, dataset });
        }

        if text.starts_with('/') {
            return Ok(Self::Hierarchical {
                file: None,
                dataset: text.into(),
            });
        }

        Ok(Self::Inline(text.into()))
    }

    pub fn data_format(&self) -> DataFormat {
        match self {
            Self::Inline(_) => DataFormat::Inline,
            Self::Binary { .. } => DataFormat::Binary,
            Self::Hierarchical { .. } => DataFormat::Hierarchical,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(text) => write!(f, "{text}"),
            Self::Binary { file: None, offset } => write!(f, "seek:{offset}"),
            Self::Binary {
                file: Some(file), ..
            } => write!(f, "{file}"),
            Self::Hierarchical {
                file: Some(file),
                dataset,
            } => write!(f, "{file}:{dataset}"),
            Self::Hierarchical {
                file: None,
                dataset,
            } => write!(f, "{dataset}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Shape, element type and location of one heavy data array
pub struct DataItem {
    pub role: Role,
    pub dimensions: Vec<usize>,
    pub element_type: ElementType,
    pub locator: Locator,
    pub endian: Endian,
}

impl DataItem {
    pub fn to_element(&self) -> Element {
        let mut element = Element::new("DataItem")
            .with_attribute("DataType", self.element_type.data_type())
            .with_attribute("Precision", self.element_type.precision())
            .with_attribute("Dimensions", utils::format_dimensions(&self.dimensions))
            .with_attribute("Format", self.locator.data_format().to_str());

        if let Locator::Binary { file, offset } = &self.locator {
            element.set_attribute("Endian", self.endian.to_str());
            if file.is_some() {
                element.set_attribute("Seek", offset);
            }
        }

        element.set_text(self.locator.to_string());
        element
    }

    /// Read the description of a data item. The `Format` attribute, when present, decides
    /// how the text is interpreted; otherwise the lexical form of the text does.
    pub fn from_element(role: Role, element: &Element) -> Result<Self, Error> {
        if element.tag() != "DataItem" {
            return Err(FormatError::from(UnexpectedElement::new(
                "DataItem",
                format!("element `{}`", element.tag()),
            ))
            .into());
        }

        let data_type = element.attribute("DataType").unwrap_or("Float");
        let element_type = ElementType::from_xdmf(data_type, element.attribute("Precision"))?;
        let dimensions = utils::parse_dimensions(element)?;
        let text = element.text().unwrap_or_default().trim();

        let locator = match element.attribute("Format") {
            None => Locator::parse(text)?,
            Some(format) => match DataFormat::from_xdmf(format)? {
                DataFormat::Inline => Locator::Inline(text.into()),
                DataFormat::Binary => binary_locator(element, text)?,
                DataFormat::Hierarchical => match Locator::parse(text)? {
                    locator @ Locator::Hierarchical { .. } => locator,
                    _ => {
                        let reason = "expected `<file>:/<dataset>` or `/<dataset>`";
                        return Err(FormatError::from(InvalidLocator::new(text.into(), reason.into())).into());
                    }
                },
            },
        };

        let endian = element
            .attribute("Endian")
            .map(Endian::from_xdmf)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            role,
            dimensions,
            element_type,
            locator,
            endian,
        })
    }
}

/// binary items either use the `seek:<offset>` form, or name the file in the text and give
/// the offset in a `Seek` attribute
fn binary_locator(element: &Element, text: &str) -> Result<Locator, FormatError> {
    if text.starts_with("seek:") {
        return Locator::parse(text);
    }

    if text.is_empty() {
        let reason = "a binary data item needs a `seek:<offset>` or a file name";
        return Err(InvalidLocator::new(text.into(), reason.into()).into());
    }

    let offset = match element.attribute("Seek") {
        Some(_) => element.parse_attribute("Seek", "a non-negative byte offset")?,
        None => 0,
    };

    Ok(Locator::Binary {
        file: Some(text.into()),
        offset,
    })
}

/// Stores arrays through a heavy data backend and describes them as data items
pub struct ReferenceSink {
    backend: HeavyDataWriter,
    precision: Precision,
    inline_threshold: usize,
}

impl ReferenceSink {
    pub fn new(backend: HeavyDataWriter, options: &WriteOptions) -> Self {
        Self {
            backend,
            precision: options.precision,
            inline_threshold: options.inline_threshold,
        }
    }

    /// open the backend `options` asks for, with side-cars next to `document`
    pub fn create(document: &Path, options: &WriteOptions) -> Result<Self, Error> {
        let backend = HeavyDataWriter::create(document, options.data_format)?;
        Ok(Self::new(backend, options))
    }

    pub fn data_format(&self) -> DataFormat {
        self.backend.data_format()
    }

    /// Persist `array` and return the data item that references it. Double precision data
    /// is narrowed first when single precision output was requested.
    pub fn write_reference(
        &mut self,
        role: Role,
        key_hint: &str,
        array: &DataArray,
    ) -> Result<DataItem, Error> {
        if array.shape().is_empty() {
            let reason = format!("{role} array `{key_hint}` has no dimensions");
            return Err(FormatError::from(InvalidMesh::new(reason)).into());
        }

        let array = match self.precision {
            Precision::Native => Cow::Borrowed(array),
            Precision::Single => Cow::Owned(array.to_single_precision()),
        };

        let locator = if array.len() < self.inline_threshold {
            inline::store(&array)
        } else {
            self.backend.store(key_hint, &array)?
        };

        Ok(DataItem {
            role,
            dimensions: array.shape().to_vec(),
            element_type: array.element_type(),
            locator,
            endian: Endian::Native,
        })
    }

    /// flush or finalize the backend. Items written afterwards are not guaranteed to be
    /// readable.
    pub fn finalize(&mut self) -> Result<(), Error> {
        self.backend.finalize()
    }
}

/// Resolves data items of one document to arrays
pub struct ReferenceSource {
    reader: HeavyDataReader,
}

impl ReferenceSource {
    /// heavy data file names are resolved relative to `document`
    pub fn new<P: AsRef<Path>>(document: P) -> Self {
        Self {
            reader: HeavyDataReader::new(document),
        }
    }

    /// Load the array of `item` and check it against the declared dimensions and element
    /// type
    pub fn read_reference(&mut self, item: &DataItem) -> Result<DataArray, Error> {
        let array = self.reader.load(
            &item.locator,
            item.element_type,
            &item.dimensions,
            item.endian,
        )?;

        if array.element_type() != item.element_type {
            let err = TypeMismatch::new(item.role, item.element_type, array.element_type());
            return Err(FormatError::from(err).into());
        }

        if array.shape() != item.dimensions.as_slice() {
            let err = ShapeMismatch::new(item.role, item.dimensions.clone(), array.shape().to_vec());
            return Err(FormatError::from(err).into());
        }

        Ok(array)
    }

    /// parse `element` as a data item and load it
    pub fn read_element(&mut self, role: Role, element: &Element) -> Result<DataArray, Error> {
        let item = DataItem::from_element(role, element)?;
        self.read_reference(&item)
    }
}
