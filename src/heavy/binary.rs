//! Heavy data appended to a raw side-car file and referenced by byte offset

use crate::prelude::*;
use crate::reference::Locator;

use byteorder::{BigEndian, LittleEndian, NativeEndian};

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Byte order of a binary data item
pub enum Endian {
    #[default]
    Native,
    Little,
    Big,
}

impl Endian {
    pub(crate) fn to_str(&self) -> &'static str {
        match &self {
            Self::Native => "Native",
            Self::Little => "Little",
            Self::Big => "Big",
        }
    }

    pub(crate) fn from_xdmf(endian: &str) -> Result<Self, UnsupportedFeature> {
        match endian.trim() {
            "Native" => Ok(Self::Native),
            "Little" => Ok(Self::Little),
            "Big" => Ok(Self::Big),
            other => Err(UnsupportedFeature::Endian(other.into())),
        }
    }
}

/// Appends arrays to the side-car in the order they are stored
pub struct BinaryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    offset: u64,
}

impl BinaryWriter {
    /// create (or truncate) the side-car at `path`
    pub fn create(path: PathBuf) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(ResourceError::create(&path))?;

        tracing::debug!(path = %path.display(), "created binary side-car");

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            offset: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// append the tightly packed native endian bytes of `array`
    pub(crate) fn store(&mut self, array: &DataArray) -> Result<Locator, Error> {
        let bytes = array.to_bytes::<NativeEndian>();
        self.writer
            .write_all(&bytes)
            .map_err(ResourceError::write(&self.path))?;

        let offset = self.offset;
        self.offset += bytes.len() as u64;

        Ok(Locator::Binary { file: None, offset })
    }

    pub(crate) fn finalize(&mut self) -> Result<(), Error> {
        self.writer.flush().map_err(ResourceError::write(&self.path))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(ResourceError::write(&self.path))?;

        tracing::debug!(path = %self.path.display(), bytes = self.offset, "flushed binary side-car");
        Ok(())
    }
}

/// read `product(dims)` elements at `offset` of the side-car `file`
pub(crate) fn load(
    file: &mut File,
    path: &Path,
    offset: u64,
    element_type: ElementType,
    dims: &[usize],
    endian: Endian,
) -> Result<DataArray, Error> {
    let available = file
        .metadata()
        .map_err(ResourceError::read(path))?
        .len()
        .saturating_sub(offset);

    let needed = crate::array::element_count(dims)
        .and_then(|count| count.checked_mul(element_type.size()))
        .map_or(u64::MAX, |bytes| bytes as u64);

    if needed > available {
        let err = TruncatedSidecar::new(path.to_path_buf(), offset, needed, available);
        return Err(FormatError::from(err).into());
    }

    let mut bytes = vec![0; needed as usize];
    file.seek(SeekFrom::Start(offset))
        .map_err(ResourceError::read(path))?;
    file.read_exact(&mut bytes)
        .map_err(ResourceError::read(path))?;

    let array = match endian {
        Endian::Native => DataArray::from_bytes::<NativeEndian>(&bytes, element_type, dims),
        Endian::Little => DataArray::from_bytes::<LittleEndian>(&bytes, element_type, dims),
        Endian::Big => DataArray::from_bytes::<BigEndian>(&bytes, element_type, dims),
    };

    Ok(array)
}
