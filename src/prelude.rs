//! Common traits and types that are useful for working with `xdmf`
#![allow(unused_imports)]

pub use crate::array::{DataArray, ElementType, Numeric};
pub use crate::cell_type::CellType;
pub use crate::mesh::{CellBlock, Mesh};
pub use crate::options::{DataFormat, Precision, WriteOptions};
pub use crate::reference::{ReferenceSink, ReferenceSource, Role};
pub use crate::tree::Element;

pub(crate) use crate::error::{
    Container, FormatError, IndexOutOfBounds, InlineValue, InvalidAttributeValue, InvalidLocator, InvalidMesh,
    MalformedAttribute, MalformedXml, MissingAttribute, MissingElement, ResourceError,
    RowCountMismatch, SessionError, ShapeMismatch, Truncated, TruncatedSidecar, TypeMismatch,
    UnexpectedElement, UnknownCellType, UnsupportedDataType, UnsupportedFeature,
};
pub(crate) use crate::Error;

pub(crate) use derive_more::{Constructor, Display, From};

pub(crate) use ndarray::{Array1, Array2, ArrayD};
pub(crate) use std::collections::BTreeMap;
pub(crate) use std::path::{Path, PathBuf};
