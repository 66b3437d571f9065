mod common;

use xdmf::ndarray::{array, Array1, Array2};
use xdmf::{CellBlock, CellType, DataArray, DataFormat, Mesh, WriteOptions};

fn round_trip(data_format: DataFormat) {
    common::init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.xdmf");
    let mesh = common::cube_mesh();

    xdmf::write_xdmf(&path, &mesh, &WriteOptions::new(data_format)).unwrap();
    let read_back = xdmf::read_xdmf(&path).unwrap();

    assert_eq!(read_back, mesh);
    assert_eq!(read_back.point_data["velocity"].shape(), &[10, 3]);
}

#[test]
fn inline_round_trip() {
    round_trip(DataFormat::Inline);
}

#[test]
fn binary_round_trip() {
    round_trip(DataFormat::Binary);
}

#[test]
fn hierarchical_round_trip() {
    round_trip(DataFormat::Hierarchical);
}

#[test]
fn sidecars_follow_the_data_format() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = common::cube_mesh();

    let inline = dir.path().join("inline.xdmf");
    xdmf::write_xdmf(&inline, &mesh, &WriteOptions::new(DataFormat::Inline)).unwrap();
    assert!(!dir.path().join("inline.bin").exists());
    assert!(!dir.path().join("inline.h5").exists());

    let binary = dir.path().join("binary.xdmf");
    xdmf::write_xdmf(&binary, &mesh, &WriteOptions::new(DataFormat::Binary)).unwrap();
    assert!(dir.path().join("binary.bin").exists());

    let hierarchical = dir.path().join("hierarchical.xdmf");
    xdmf::write_xdmf(&hierarchical, &mesh, &WriteOptions::default()).unwrap();
    let sidecar = std::fs::read(dir.path().join("hierarchical.h5")).unwrap();
    assert_eq!(&sidecar[..8], b"\x89HDF\r\n\x1a\n");
}

#[test]
fn small_arrays_stay_inline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threshold.xdmf");
    let mesh = common::cube_mesh();

    // every array of the cube has fewer than 100 elements
    let options = WriteOptions::new(DataFormat::Binary).with_inline_threshold(100);
    xdmf::write_xdmf(&path, &mesh, &options).unwrap();

    let document = std::fs::read_to_string(&path).unwrap();
    assert!(!document.contains("seek:"));
    assert!(document.contains("Format=\"XML\""));

    assert_eq!(xdmf::read_xdmf(&path).unwrap(), mesh);
}

#[test]
fn two_dimensional_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("square.xdmf");

    let points = array![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let cells = vec![
        CellBlock::new(CellType::Triangle, array![[0, 1, 2]]),
        CellBlock::new(CellType::Line, array![[2, 3], [3, 0]]),
    ];
    let mesh = Mesh::new(points, cells)
        .with_point_data("id", array![1i64, 2, 3, 4])
        .with_cell_data("weight", CellType::Triangle, array![0.5f32])
        .with_cell_data("weight", CellType::Line, array![0.25f32, 0.75]);

    xdmf::write_xdmf(&path, &mesh, &WriteOptions::new(DataFormat::Binary)).unwrap();
    let read_back = xdmf::read_xdmf(&path).unwrap();

    assert_eq!(read_back.dimension(), 2);
    assert_eq!(read_back, mesh);
    assert_eq!(
        read_back.cell_data["weight"][&CellType::Line],
        DataArray::from(array![0.25f32, 0.75])
    );
}

#[test]
fn document_is_xdmf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.xdmf");

    xdmf::write_xdmf(&path, &common::cube_mesh(), &WriteOptions::default()).unwrap();

    let file = std::io::BufReader::new(std::fs::File::open(&path).unwrap());
    let root = xdmf::tree::parse(file).unwrap();

    assert_eq!(root.tag(), "Xdmf");
    let grid = root.child("Domain").unwrap().child("Grid").unwrap();
    assert_eq!(grid.children_named("Topology").count(), 2);
    assert_eq!(grid.children_named("Attribute").count(), 4);

    let geometry = grid.child("Geometry").unwrap();
    assert_eq!(geometry.attribute("GeometryType"), Some("XYZ"));

    let item = geometry.child("DataItem").unwrap();
    assert_eq!(item.attribute("Dimensions"), Some("10 3"));
    assert_eq!(item.attribute("Format"), Some("HDF"));
    assert_eq!(item.text(), Some("cube.h5:/data0"));
}

#[test]
fn document_named_like_its_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = common::cube_mesh();

    let path = dir.path().join("mesh.bin");
    xdmf::write_xdmf(&path, &mesh, &WriteOptions::new(DataFormat::Binary)).unwrap();
    assert!(dir.path().join("mesh.bin.bin").exists());
    assert_eq!(xdmf::read_xdmf(&path).unwrap(), mesh);

    let path = dir.path().join("mesh.h5");
    xdmf::write_xdmf(&path, &mesh, &WriteOptions::new(DataFormat::Hierarchical)).unwrap();
    assert!(dir.path().join("mesh.h5.h5").exists());
    assert_eq!(xdmf::read_xdmf(&path).unwrap(), mesh);
}

/// a 3 x 3 x 3 lattice of points with one quadratic cell of every family on it
fn quadratic_mesh() -> Mesh {
    let points = Array2::from_shape_fn((27, 3), |(i, axis)| ((i / 3usize.pow(axis as u32)) % 3) as f64 * 0.5);
    let lattice = |n: usize| -> Array2<i64> { Array2::from_shape_fn((1, n), |(_, j)| j as i64) };

    let cells = vec![
        CellBlock::new(CellType::Triangle6, lattice(6)),
        CellBlock::new(CellType::Quad8, lattice(8)),
        CellBlock::new(CellType::Tetra10, lattice(10)),
        CellBlock::new(CellType::Hexahedron20, lattice(20)),
    ];
    let pressure: Array1<f64> = Array1::linspace(0.0, 1.0, 27);

    Mesh::new(points, cells)
        .with_point_data("pressure", pressure)
        .with_cell_data("order", CellType::Triangle6, array![2i32])
        .with_cell_data("order", CellType::Quad8, array![2i32])
        .with_cell_data("order", CellType::Tetra10, array![2i32])
        .with_cell_data("order", CellType::Hexahedron20, array![2i32])
}

#[test]
fn quadratic_cells_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = quadratic_mesh();

    for data_format in [DataFormat::Inline, DataFormat::Binary, DataFormat::Hierarchical] {
        let path = dir.path().join(format!("quadratic_{data_format:?}.xdmf"));
        xdmf::write_xdmf(&path, &mesh, &WriteOptions::new(data_format)).unwrap();

        let read_back = xdmf::read_xdmf(&path).unwrap();
        assert_eq!(read_back, mesh, "{data_format:?}");

        let nodes = read_back
            .cells
            .iter()
            .map(|block| (block.cell_type, block.data.ncols()))
            .collect::<Vec<_>>();
        assert_eq!(
            nodes,
            vec![
                (CellType::Triangle6, 6),
                (CellType::Quad8, 8),
                (CellType::Tetra10, 10),
                (CellType::Hexahedron20, 20),
            ]
        );
    }
}
