use crate::codec;
use crate::prelude::*;
use crate::tree;

/// Read the first grid of the document at `path` as a mesh.
///
/// Heavy data is resolved item by item, so a document may mix inline values, binary
/// offsets and HDF5 datasets. For a time series document this returns the shared
/// topology without any frame data; use [`TimeSeriesReader`](crate::TimeSeriesReader) to
/// read the frames.
///
/// ```no_run
/// let mesh = xdmf::read_xdmf("./triangle.xdmf").unwrap();
/// println!("{} points in {} blocks", mesh.num_points(), mesh.cells.len());
/// ```
pub fn read_xdmf<P: AsRef<Path>>(path: P) -> Result<Mesh, Error> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading xdmf mesh");

    let root = tree::parse_file(path)?;
    let grid = first_grid(&root)?;

    let mut source = ReferenceSource::new(path);
    codec::decode(grid, &mut source)
}

/// the `Domain` element of a document
pub(crate) fn domain(root: &Element) -> Result<&Element, FormatError> {
    if root.tag() != "Xdmf" {
        let err = UnexpectedElement::new("Xdmf", format!("element `{}`", root.tag()));
        return Err(err.into());
    }

    root.require_child("Domain")
}

fn first_grid(root: &Element) -> Result<&Element, FormatError> {
    domain(root)?.require_child("Grid")
}
