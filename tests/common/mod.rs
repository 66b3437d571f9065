#![allow(dead_code)]

use xdmf::ndarray::{array, Array1, Array2};
use xdmf::{CellBlock, CellType, Mesh};

/// route `tracing` output of the crate to the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// a unit cube split into one hexahedron and a tetrahedral cap on top
pub fn cube_mesh() -> Mesh {
    let points: Array2<f64> = array![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
        [0.5, 0.5, 1.5],
        [0.1, 0.2, 0.3],
    ];

    let cells = vec![
        CellBlock::new(CellType::Hexahedron, array![[0, 1, 2, 3, 4, 5, 6, 7]]),
        CellBlock::new(CellType::Tetra, array![[4, 5, 6, 8], [4, 6, 7, 8]]),
    ];

    let temperature: Array1<f64> = Array1::linspace(250.0, 350.0, points.nrows());
    let velocity = Array2::from_shape_fn((points.nrows(), 3), |(i, j)| {
        ((i * 3 + j) as f64 * 0.37).sin()
    });

    Mesh::new(points, cells)
        .with_point_data("temperature", temperature)
        .with_point_data("velocity", velocity)
        .with_cell_data("material", CellType::Hexahedron, array![7i32])
        .with_cell_data("material", CellType::Tetra, array![3i32, 4])
}
