#![doc = include_str!("../README.md")]

pub mod array;
pub mod cell_type;
pub mod codec;
pub mod error;
pub mod heavy;
pub mod mesh;
pub mod options;
pub mod prelude;
mod read_xdmf;
pub mod reference;
pub mod time_series;
pub mod tree;
mod utils;
mod write_xdmf;

pub use array::{DataArray, ElementType, Numeric};
pub use cell_type::CellType;
pub use error::{FormatError, ResourceError, SessionError, UnsupportedFeature};
pub use mesh::{CellBlock, Mesh};
pub use options::{DataFormat, Precision, WriteOptions};
pub use read_xdmf::read_xdmf;
pub use reference::{DataItem, Locator, ReferenceSink, ReferenceSource, Role};
pub use time_series::{Frame, TimeSeriesReader, TimeSeriesWriter};
pub use write_xdmf::write_xdmf;

pub use ndarray;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed xdmf document: {0}")]
    Format(#[from] error::FormatError),
    #[error("unsupported xdmf feature: {0}")]
    Unsupported(#[from] error::UnsupportedFeature),
    #[error("{0}")]
    Resource(#[from] error::ResourceError),
    #[error("time series misuse: {0}")]
    Session(#[from] error::SessionError),
}

impl From<error::Container> for Error {
    fn from(err: error::Container) -> Self {
        Self::Format(err.into())
    }
}
