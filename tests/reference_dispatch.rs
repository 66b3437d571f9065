//! One document whose data items use all three heavy data forms
mod common;

use std::path::Path;

use xdmf::ndarray::array;
use xdmf::tree::{self, Element};
use xdmf::{CellBlock, CellType, DataFormat, Locator, Mesh, WriteOptions};

fn triangle_mesh() -> Mesh {
    let points = array![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let cells = vec![CellBlock::new(CellType::Triangle, array![[0, 1, 2], [0, 2, 3]])];

    Mesh::new(points, cells)
        .with_point_data("u", array![0.5, 1.5, 2.5, 3.5])
        .with_point_data("v", array![[1.0, -1.0], [2.0, -2.0], [3.0, -3.0], [4.0, -4.0]])
}

fn grid_of(path: &Path) -> Element {
    let file = std::io::BufReader::new(std::fs::File::open(path).unwrap());
    let root = tree::parse(file).unwrap();
    root.child("Domain").unwrap().child("Grid").unwrap().clone()
}

fn attribute<'a>(grid: &'a Element, name: &str) -> &'a Element {
    grid.children_named("Attribute")
        .find(|attribute| attribute.attribute("Name") == Some(name))
        .unwrap()
}

/// the same data item with its binary side-car named in the text and the offset moved to
/// a `Seek` attribute
fn with_named_file(item: &Element, file: &str) -> Element {
    let offset = match Locator::parse(item.text().unwrap()).unwrap() {
        Locator::Binary { offset, .. } => offset,
        other => panic!("expected a binary locator, got {other:?}"),
    };

    let mut item = item.clone();
    item.set_text(file);
    item.set_attribute("Seek", offset);
    item
}

/// the same data item without a `Format` attribute, leaving the text to decide
fn without_format(item: &Element) -> Element {
    let mut bare = Element::new("DataItem");
    for (key, value) in item.attributes().filter(|(key, _)| *key != "Format") {
        bare.set_attribute(key, value);
    }
    bare.set_text(item.text().unwrap());
    bare
}

#[test]
fn mixed_heavy_data_forms() {
    common::init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let mesh = triangle_mesh();

    let inline_path = dir.path().join("inline.xdmf");
    let binary_path = dir.path().join("binary.xdmf");
    let store_path = dir.path().join("store.xdmf");
    xdmf::write_xdmf(&inline_path, &mesh, &WriteOptions::new(DataFormat::Inline)).unwrap();
    xdmf::write_xdmf(&binary_path, &mesh, &WriteOptions::new(DataFormat::Binary)).unwrap();
    xdmf::write_xdmf(&store_path, &mesh, &WriteOptions::new(DataFormat::Hierarchical)).unwrap();

    let inline = grid_of(&inline_path);
    let binary = grid_of(&binary_path);
    let store = grid_of(&store_path);

    // `seek:<offset>` items without a file name resolve to the side-car of the document
    // that holds them
    std::fs::copy(dir.path().join("binary.bin"), dir.path().join("mixed.bin")).unwrap();

    let geometry_item = binary.child("Geometry").unwrap().child("DataItem").unwrap();
    let topology_item = store.child("Topology").unwrap().child("DataItem").unwrap();

    let mixed = Element::new("Grid")
        .with_attribute("Name", "Grid")
        .with_attribute("GridType", "Uniform")
        .with_child(
            Element::new("Geometry")
                .with_attribute("GeometryType", "XY")
                .with_child(with_named_file(geometry_item, "binary.bin")),
        )
        .with_child(
            Element::new("Topology")
                .with_attribute("TopologyType", "Triangle")
                .with_child(without_format(topology_item)),
        )
        .with_child(attribute(&inline, "u").clone())
        .with_child(attribute(&binary, "v").clone());

    let root = Element::new("Xdmf")
        .with_attribute("Version", "3.0")
        .with_child(Element::new("Domain").with_child(mixed));

    let mixed_path = dir.path().join("mixed.xdmf");
    let file = std::fs::File::create(&mixed_path).unwrap();
    tree::serialize(&root, std::io::BufWriter::new(file)).unwrap();

    let grid = grid_of(&mixed_path);
    let formats = [
        grid.child("Geometry").unwrap().child("DataItem").unwrap().attribute("Format"),
        grid.child("Topology").unwrap().child("DataItem").unwrap().attribute("Format"),
        attribute(&grid, "u").child("DataItem").unwrap().attribute("Format"),
        attribute(&grid, "v").child("DataItem").unwrap().attribute("Format"),
    ];
    assert_eq!(formats, [Some("Binary"), None, Some("XML"), Some("Binary")]);

    assert_eq!(xdmf::read_xdmf(&mixed_path).unwrap(), mesh);
}

#[test]
fn lexical_forms_without_format() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = triangle_mesh();

    let path = dir.path().join("bare.xdmf");
    xdmf::write_xdmf(&path, &mesh, &WriteOptions::new(DataFormat::Binary)).unwrap();

    let mut grid = grid_of(&path);
    let item = grid.child_mut("Geometry").unwrap().child_mut("DataItem").unwrap();
    *item = without_format(item);
    assert_eq!(item.attribute("Format"), None);
    assert!(item.text().unwrap().starts_with("seek:"));

    let root = Element::new("Xdmf")
        .with_attribute("Version", "3.0")
        .with_child(Element::new("Domain").with_child(grid));

    let file = std::fs::File::create(&path).unwrap();
    tree::serialize(&root, std::io::BufWriter::new(file)).unwrap();

    assert_eq!(xdmf::read_xdmf(&path).unwrap(), mesh);
}
