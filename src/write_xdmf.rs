use crate::codec;
use crate::prelude::*;
use crate::tree;

pub(crate) const XDMF_VERSION: &str = "3.0";
pub(crate) const XINCLUDE_NAMESPACE: &str = "http://www.w3.org/2001/XInclude";

/// Write `mesh` to the document at `path`.
///
/// Heavy data goes where `options.data_format` asks for: inline in the document, or into a
/// `.bin` / `.h5` side-car with the same stem as `path`. The side-car is finalized before
/// the document is written. The mesh is validated before any file is touched.
///
/// ```no_run
/// use xdmf::{ndarray::array, CellBlock, CellType, DataFormat, Mesh, WriteOptions};
///
/// let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
/// let cells = vec![CellBlock::new(CellType::Triangle, array![[0, 1, 2]])];
/// let mesh = Mesh::new(points, cells).with_point_data("u", array![0.0, 1.0, 2.0]);
///
/// let options = WriteOptions::new(DataFormat::Binary);
/// xdmf::write_xdmf("./triangle.xdmf", &mesh, &options).unwrap();
/// ```
pub fn write_xdmf<P: AsRef<Path>>(path: P, mesh: &Mesh, options: &WriteOptions) -> Result<(), Error> {
    let path = path.as_ref();

    tracing::debug!(
        path = %path.display(),
        points = mesh.num_points(),
        blocks = mesh.cells.len(),
        data_format = ?options.data_format,
        "writing xdmf mesh"
    );

    // an invalid mesh must not truncate the side-car of an existing document
    mesh.validate()?;

    let mut sink = ReferenceSink::create(path, options)?;
    let grid = codec::encode(mesh, &mut sink)?;
    sink.finalize()?;

    let root = document_root(Element::new("Domain").with_child(grid));
    tree::serialize_file(&root, path)?;

    Ok(())
}

/// the `Xdmf` root element wrapping `domain`
pub(crate) fn document_root(domain: Element) -> Element {
    Element::new("Xdmf")
        .with_attribute("Version", XDMF_VERSION)
        .with_attribute("xmlns:xi", XINCLUDE_NAMESPACE)
        .with_child(domain)
}
