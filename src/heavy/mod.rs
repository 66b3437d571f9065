//! Heavy data backends.
//!
//! Light data (the document) only ever holds a [`Locator`] for each array. The backends
//! decide where the array itself lives:
//!
//! * [`inline`]: the text of the `DataItem`
//! * [`binary`]: an appended `.bin` side-car, addressed as `seek:<offset>`
//! * [`hierarchical`]: an HDF5 `.h5` side-car, addressed as `<file>:/<dataset>`
//!
//! One document is written through one backend. Reading dispatches item by item, so a
//! document that mixes reference forms still decodes.

pub mod binary;
pub mod hierarchical;
pub mod inline;

pub use binary::{BinaryWriter, Endian};
pub use hierarchical::HierarchicalWriter;

use crate::prelude::*;
use crate::reference::Locator;
use crate::utils;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;

/// The backend a document is being written with
pub enum HeavyDataWriter {
    Inline,
    Binary(BinaryWriter),
    Hierarchical(HierarchicalWriter),
}

impl HeavyDataWriter {
    /// open the side-car resources that a document at `document` needs for `data_format`
    pub fn create(document: &Path, data_format: DataFormat) -> Result<Self, Error> {
        let writer = match data_format {
            DataFormat::Inline => Self::Inline,
            DataFormat::Binary => {
                let path = utils::sidecar_path(document, "bin");
                Self::Binary(BinaryWriter::create(path)?)
            }
            DataFormat::Hierarchical => {
                let path = utils::sidecar_path(document, "h5");
                Self::Hierarchical(HierarchicalWriter::create(path)?)
            }
        };

        Ok(writer)
    }

    pub fn data_format(&self) -> DataFormat {
        match self {
            Self::Inline => DataFormat::Inline,
            Self::Binary(_) => DataFormat::Binary,
            Self::Hierarchical(_) => DataFormat::Hierarchical,
        }
    }

    /// persist `array` and return where it can be found again
    pub fn store(&mut self, key_hint: &str, array: &DataArray) -> Result<Locator, Error> {
        tracing::trace!(
            key_hint,
            shape = ?array.shape(),
            element_type = %array.element_type(),
            data_format = ?self.data_format(),
            "storing heavy data"
        );

        match self {
            Self::Inline => Ok(inline::store(array)),
            Self::Binary(writer) => writer.store(array),
            Self::Hierarchical(writer) => writer.store(key_hint, array),
        }
    }

    /// flush the side-car, or close the HDF5 file
    pub fn finalize(&mut self) -> Result<(), Error> {
        match self {
            Self::Inline => Ok(()),
            Self::Binary(writer) => writer.finalize(),
            Self::Hierarchical(writer) => writer.finalize(),
        }
    }
}

/// Loads heavy data referenced from the document at `document`. Side-cars are opened on
/// first use and kept open for the lifetime of the reader.
pub struct HeavyDataReader {
    document: PathBuf,
    binary_files: HashMap<PathBuf, File>,
    hdf5_files: HashMap<PathBuf, hdf5::File>,
}

impl HeavyDataReader {
    pub fn new<P: AsRef<Path>>(document: P) -> Self {
        Self {
            document: document.as_ref().to_path_buf(),
            binary_files: HashMap::new(),
            hdf5_files: HashMap::new(),
        }
    }

    /// load the array at `locator`. `element_type`, `dims` and `endian` come from the
    /// `DataItem` and are needed by the inline and binary forms. HDF5 datasets return the
    /// stored shape and type unchanged.
    pub fn load(
        &mut self,
        locator: &Locator,
        element_type: ElementType,
        dims: &[usize],
        endian: Endian,
    ) -> Result<DataArray, Error> {
        tracing::trace!(locator = %locator, ?dims, "loading heavy data");

        match locator {
            Locator::Inline(text) => Ok(inline::load(text, element_type, dims)?),
            Locator::Binary { file, offset } => {
                let path = self.resolve(file.as_deref(), "bin");
                let handle = match self.binary_files.entry(path.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        entry.insert(File::open(&path).map_err(ResourceError::open(&path))?)
                    }
                };

                binary::load(handle, &path, *offset, element_type, dims, endian)
            }
            Locator::Hierarchical { file, dataset } => {
                let path = self.resolve(file.as_deref(), "h5");
                let handle = match self.hdf5_files.entry(path.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(hierarchical::open(&path)?),
                };

                hierarchical::load(handle, &path, dataset)
            }
        }
    }

    /// side-car files are named relative to the directory of the document. Without a file
    /// name the default side-car next to the document is used.
    fn resolve(&self, file: Option<&str>, extension: &str) -> PathBuf {
        match file {
            Some(file) => {
                let file = Path::new(file);
                if file.is_absolute() {
                    file.to_path_buf()
                } else {
                    self.document
                        .parent()
                        .map(|dir| dir.join(file))
                        .unwrap_or_else(|| file.to_path_buf())
                }
            }
            None => utils::sidecar_path(&self.document, extension),
        }
    }
}
