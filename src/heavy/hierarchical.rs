//! Heavy data stored as datasets of an HDF5 file next to the document

use crate::prelude::*;
use crate::reference::Locator;
use crate::utils;

use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
use hdf5::H5Type;

/// Stores every array as a new dataset `/data<N>`
pub struct HierarchicalWriter {
    file: Option<hdf5::File>,
    path: PathBuf,
    file_name: String,
    counter: usize,
}

impl HierarchicalWriter {
    pub fn create(path: PathBuf) -> Result<Self, Error> {
        let file_name = utils::file_name(&path);
        let file = hdf5::File::create(&path).map_err(ResourceError::hdf5(&path))?;

        Ok(Self {
            file: Some(file),
            path,
            file_name,
            counter: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn store(&mut self, key_hint: &str, array: &DataArray) -> Result<Locator, Error> {
        let file = self.file.as_ref().ok_or(SessionError::Closed)?;
        let dataset = format!("/data{}", self.counter);

        let written = match array {
            DataArray::Int32(arr) => write_dataset(file, &dataset, arr),
            DataArray::Int64(arr) => write_dataset(file, &dataset, arr),
            DataArray::Float32(arr) => write_dataset(file, &dataset, arr),
            DataArray::Float64(arr) => write_dataset(file, &dataset, arr),
        };
        written.map_err(ResourceError::hdf5(&self.path))?;
        self.counter += 1;

        tracing::trace!(key_hint, dataset = %dataset, "stored hierarchical dataset");

        Ok(Locator::Hierarchical {
            file: Some(self.file_name.clone()),
            dataset,
        })
    }

    /// flush and close the file. Calling this again is a no-op.
    pub(crate) fn finalize(&mut self) -> Result<(), Error> {
        if let Some(file) = self.file.take() {
            file.flush().map_err(ResourceError::hdf5(&self.path))?;
            drop(file);

            tracing::debug!(path = %self.path.display(), datasets = self.counter, "closed hdf5 side-car");
        }

        Ok(())
    }
}

fn write_dataset<NUM: Numeric + H5Type>(
    file: &hdf5::File,
    name: &str,
    array: &ArrayD<NUM>,
) -> hdf5::Result<()> {
    let dataset = file.new_dataset::<NUM>().shape(array.shape().to_vec()).create(name)?;

    if !array.is_empty() {
        let values: Vec<NUM> = array.iter().copied().collect();
        dataset.write_raw(&values)?;
    }

    Ok(())
}

/// open an existing HDF5 side-car for reading
pub(crate) fn open(path: &Path) -> Result<hdf5::File, Error> {
    // a missing file is a resource failure, anything hdf5 cannot read is a format failure
    std::fs::metadata(path).map_err(ResourceError::open(path))?;

    let file = hdf5::File::open(path).map_err(|source| Container::Open {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(file)
}

/// read `dataset` from `file` with its stored shape and element type
pub(crate) fn load(file: &hdf5::File, path: &Path, dataset: &str) -> Result<DataArray, Error> {
    if !file.link_exists(dataset) {
        return Err(Container::MissingDataset {
            path: path.to_path_buf(),
            dataset: dataset.into(),
        }
        .into());
    }

    let access_error = |source| Container::Dataset {
        path: path.to_path_buf(),
        dataset: dataset.into(),
        source,
    };

    let handle = file.dataset(dataset).map_err(access_error)?;
    let descriptor = handle
        .dtype()
        .and_then(|dtype| dtype.to_descriptor())
        .map_err(access_error)?;
    let dims = handle.shape();

    let array = match descriptor {
        TypeDescriptor::Integer(IntSize::U4) => read_dataset::<i32>(&handle, &dims),
        TypeDescriptor::Integer(IntSize::U8) => read_dataset::<i64>(&handle, &dims),
        TypeDescriptor::Float(FloatSize::U4) => read_dataset::<f32>(&handle, &dims),
        TypeDescriptor::Float(FloatSize::U8) => read_dataset::<f64>(&handle, &dims),
        other => {
            return Err(Container::UnsupportedType {
                path: path.to_path_buf(),
                dataset: dataset.into(),
                stored: format!("{other:?}"),
            }
            .into())
        }
    };

    Ok(array.map_err(access_error)?)
}

fn read_dataset<NUM: Numeric + H5Type>(
    handle: &hdf5::Dataset,
    dims: &[usize],
) -> hdf5::Result<DataArray> {
    let values = if dims.iter().any(|&dim| dim == 0) {
        Vec::new()
    } else {
        handle.read_raw::<NUM>()?
    };

    Ok(NUM::wrap(crate::array::shaped_or_flat(values, dims)))
}
