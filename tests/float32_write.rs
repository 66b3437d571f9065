mod common;

use xdmf::{DataFormat, ElementType, Precision, WriteOptions};

fn narrowed(data_format: DataFormat) {
    common::init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.xdmf");
    let mesh = common::cube_mesh();

    let options = WriteOptions::new(data_format).with_precision(Precision::Single);
    xdmf::write_xdmf(&path, &mesh, &options).unwrap();

    let read_back = xdmf::read_xdmf(&path).unwrap();

    for (name, original) in &mesh.point_data {
        let data = &read_back.point_data[name];
        assert_eq!(data.element_type(), ElementType::Float32, "field {name}");

        // relative to the magnitude of the values, single precision keeps ~7 digits
        let scale = original.to_f64().iter().fold(1.0f64, |acc, x| acc.max(x.abs()));
        let diff = data.max_abs_diff(original).unwrap();
        assert!(diff / scale < 1e-6, "field {name} differs by {diff}");
    }

    // integer fields keep their type
    assert_eq!(read_back.cell_data, mesh.cell_data);

    let diff = (&read_back.points - &mesh.points)
        .iter()
        .fold(0.0f64, |acc, x| acc.max(x.abs()));
    assert!(diff < 1e-6);
}

#[test]
fn inline_single_precision() {
    narrowed(DataFormat::Inline);
}

#[test]
fn binary_single_precision() {
    narrowed(DataFormat::Binary);
}

#[test]
fn hierarchical_single_precision() {
    narrowed(DataFormat::Hierarchical);
}

#[test]
fn document_declares_single_precision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.xdmf");

    let options = WriteOptions::new(DataFormat::Binary).with_precision(Precision::Single);
    xdmf::write_xdmf(&path, &common::cube_mesh(), &options).unwrap();

    let document = std::fs::read_to_string(&path).unwrap();
    assert!(document.contains("DataType=\"Float\" Precision=\"4\""));
    assert!(!document.contains("DataType=\"Float\" Precision=\"8\""));
}
