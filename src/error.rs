//! Error types for reading and writing xdmf documents.
//!
//! Every failure surfaces as one [`Error`](crate::Error), which splits into four families:
//! a document that is malformed or inconsistent ([`FormatError`]), a well formed document
//! that uses something this crate does not handle ([`UnsupportedFeature`]), a failure of
//! the underlying files ([`ResourceError`]), and misuse of a time series session
//! ([`SessionError`]). None of them are retried internally.

use crate::prelude::*;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error, From)]
pub enum FormatError {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    Truncated(Truncated),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    MissingElement(MissingElement),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    InvalidAttributeValue(InvalidAttributeValue),
    #[error("{0}")]
    InlineValue(InlineValue),
    #[error("{0}")]
    UnknownCellType(UnknownCellType),
    #[error("{0}")]
    ShapeMismatch(ShapeMismatch),
    #[error("{0}")]
    TypeMismatch(TypeMismatch),
    #[error("{0}")]
    RowCountMismatch(RowCountMismatch),
    #[error("{0}")]
    IndexOutOfBounds(IndexOutOfBounds),
    #[error("{0}")]
    InvalidMesh(InvalidMesh),
    #[error("{0}")]
    InvalidLocator(InvalidLocator),
    #[error("{0}")]
    TruncatedSidecar(TruncatedSidecar),
    #[error("{0}")]
    Container(Container),
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml element: {xml_err}")]
pub struct MalformedXml {
    xml_err: quick_xml::Error,
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml attribute: {att_err}")]
pub struct MalformedAttribute {
    att_err: quick_xml::events::attributes::AttrError,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "document ended before `{open_element}` was closed (document was not finalized)")]
pub struct Truncated {
    open_element: String,
}

#[derive(Display, Debug)]
#[display(fmt = "unexpected element. Expected `{expected_name}`, got {actual_element}")]
pub struct UnexpectedElement {
    expected_name: String,
    actual_element: String,
}

impl UnexpectedElement {
    pub(crate) fn new<T: Into<String>, U: ToString>(expected_name: T, actual_element: U) -> Self {
        Self {
            expected_name: expected_name.into(),
            actual_element: actual_element.to_string(),
        }
    }
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "missing `{child_name}` element inside {element_name} element")]
pub struct MissingElement {
    element_name: String,
    child_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "missing attribute `{attribute_name}` in {element_name} element")]
pub struct MissingAttribute {
    element_name: String,
    attribute_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "could not interpret attribute {attribute_name}=\"{actual_value}\" in {element_name} element: expected {expected}"
)]
pub struct InvalidAttributeValue {
    pub(crate) element_name: String,
    pub(crate) attribute_name: String,
    pub(crate) expected: String,
    pub(crate) actual_value: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "failed to parse inline value `{token}` as {element_type}")]
pub struct InlineValue {
    token: String,
    element_type: ElementType,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "unknown cell type `{name}`")]
pub struct UnknownCellType {
    name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "{role} data item declares dimensions {declared:?} but its heavy data has shape {actual:?}")]
pub struct ShapeMismatch {
    role: Role,
    declared: Vec<usize>,
    actual: Vec<usize>,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "{role} data item declares element type {declared} but its heavy data holds {actual}")]
pub struct TypeMismatch {
    role: Role,
    declared: ElementType,
    actual: ElementType,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "field `{field}` has {actual} rows but its {cell_type} cell block has {expected}")]
pub struct RowCountMismatch {
    field: String,
    cell_type: String,
    expected: usize,
    actual: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "{cell_type} cell {row} references point {index} but the mesh only has {num_points} points")]
pub struct IndexOutOfBounds {
    cell_type: CellType,
    row: usize,
    index: i64,
    num_points: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "inconsistent mesh: {reason}")]
pub struct InvalidMesh {
    reason: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "could not interpret heavy data reference `{text}`: {reason}")]
pub struct InvalidLocator {
    text: String,
    reason: String,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "side-car `{}` holds {available} bytes but a data item needs {needed} bytes at offset {offset}",
    "path.display()"
)]
pub struct TruncatedSidecar {
    path: PathBuf,
    offset: u64,
    needed: u64,
    available: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum Container {
    #[error("`{}` is not a readable hdf5 file: {source}", .path.display())]
    Open { path: PathBuf, source: hdf5::Error },
    #[error("dataset `{dataset}` does not exist in `{}`", .path.display())]
    MissingDataset { path: PathBuf, dataset: String },
    #[error("dataset `{dataset}` in `{}` holds {stored}, which has no xdmf element type", .path.display())]
    UnsupportedType {
        path: PathBuf,
        dataset: String,
        stored: String,
    },
    #[error("could not read dataset `{dataset}` from `{}`: {source}", .path.display())]
    Dataset {
        path: PathBuf,
        dataset: String,
        source: hdf5::Error,
    },
}

#[derive(Debug, thiserror::Error, From)]
pub enum UnsupportedFeature {
    #[error("{0}")]
    DataType(UnsupportedDataType),
    #[error("heavy data format `{0}` is not supported")]
    #[from(ignore)]
    DataFormat(String),
    #[error("attribute center `{0}` is not supported")]
    #[from(ignore)]
    AttributeCenter(String),
    #[error("grid type `{0}` is not supported")]
    #[from(ignore)]
    GridType(String),
    #[error("geometry type `{0}` is not supported")]
    #[from(ignore)]
    GeometryType(String),
    #[error("byte order `{0}` is not supported")]
    #[from(ignore)]
    Endian(String),
    #[error("cell type {0} cannot be written to xdmf")]
    #[from(ignore)]
    CellType(CellType),
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "element type DataType=\"{data_type}\" Precision=\"{precision}\" is not supported")]
pub struct UnsupportedDataType {
    data_type: String,
    precision: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("could not open `{}`: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not create `{}`: {source}", .path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read from `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write to `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write hdf5 file `{}`: {source}", .path.display())]
    Hdf5 { path: PathBuf, source: hdf5::Error },
}

impl ResourceError {
    pub(crate) fn open<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Open { path, source }
    }

    pub(crate) fn create<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Create { path, source }
    }

    pub(crate) fn read<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Read { path, source }
    }

    pub(crate) fn write<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Write { path, source }
    }

    pub(crate) fn hdf5<P: Into<PathBuf>>(path: P) -> impl FnOnce(hdf5::Error) -> Self {
        let path = path.into();
        move |source| Self::Hdf5 { path, source }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("write_topology must be called before any frame is written")]
    TopologyNotWritten,
    #[error("the topology of a time series can only be written once")]
    TopologyAlreadyWritten,
    #[error("the time series session is already closed")]
    Closed,
    #[error("frame {index} requested but the time series only has {count} frames")]
    FrameOutOfRange { index: usize, count: usize },
}

/// Split a `quick_xml` error into an I/O failure or a malformed document
pub(crate) fn from_xml_read(path: Option<&std::path::Path>, err: quick_xml::Error) -> Error {
    match err {
        quick_xml::Error::Io(source) => ResourceError::Read {
            path: path.map(PathBuf::from).unwrap_or_default(),
            source,
        }
        .into(),
        other => FormatError::from(MalformedXml::from(other)).into(),
    }
}
