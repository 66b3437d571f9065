//! Conversion between a [`Mesh`] and a uniform xdmf `Grid` element.
//!
//! Encoding writes one `Geometry`, one `Topology` per cell block and one `Attribute` per
//! field and block:
//!
//! ```xml
//! <Grid Name="Grid" GridType="Uniform">
//!   <Geometry GeometryType="XYZ"> DataItem </Geometry>
//!   <Topology TopologyType="Triangle" NumberOfElements="2" NodesPerElement="3"> DataItem </Topology>
//!   <Attribute Name="u" AttributeType="Scalar" Center="Node"> DataItem </Attribute>
//!   <Attribute Name="m" AttributeType="Scalar" Center="Cell"> DataItem </Attribute>
//! </Grid>
//! ```
//!
//! The k-th `Cell` attribute with a given name belongs to the k-th `Topology`. Decoding also
//! accepts `X_Y_Z` geometry and a single `Mixed` topology as written by older producers.

use crate::prelude::*;

use ndarray::Axis;

/// Encode `mesh` as a uniform grid named `Grid`, storing every array through `sink`
pub fn encode(mesh: &Mesh, sink: &mut ReferenceSink) -> Result<Element, Error> {
    encode_named(mesh, "Grid", sink)
}

pub(crate) fn encode_named(mesh: &Mesh, name: &str, sink: &mut ReferenceSink) -> Result<Element, Error> {
    mesh.validate()?;

    let mut grid = encode_topology_grid(mesh, name, sink)?;
    encode_attributes(mesh, &mesh.point_data, &mesh.cell_data, sink, &mut grid)?;

    Ok(grid)
}

/// a uniform grid holding only the geometry and topologies of `mesh`
pub(crate) fn encode_topology_grid(
    mesh: &Mesh,
    name: &str,
    sink: &mut ReferenceSink,
) -> Result<Element, Error> {
    mesh.validate_topology()?;

    let mut grid = Element::new("Grid")
        .with_attribute("Name", name)
        .with_attribute("GridType", "Uniform");

    let geometry_type = if mesh.dimension() == 2 { "XY" } else { "XYZ" };
    let points = DataArray::from(mesh.points.clone());
    let item = sink.write_reference(Role::Geometry, "points", &points)?;
    grid.add_child(
        Element::new("Geometry")
            .with_attribute("GeometryType", geometry_type)
            .with_child(item.to_element()),
    );

    for block in &mesh.cells {
        let cells = DataArray::from(block.data.clone());
        let item = sink.write_reference(Role::Topology, block.cell_type.name(), &cells)?;

        grid.add_child(
            Element::new("Topology")
                .with_attribute("TopologyType", block.cell_type.xdmf_name())
                .with_attribute("NumberOfElements", block.num_cells())
                .with_attribute("NodesPerElement", block.cell_type.num_nodes())
                .with_child(item.to_element()),
        );
    }

    Ok(grid)
}

/// append `Attribute` elements for every field to `grid`. Cell fields need an array for
/// every block of `mesh`, in block order.
pub(crate) fn encode_attributes(
    mesh: &Mesh,
    point_data: &BTreeMap<String, DataArray>,
    cell_data: &BTreeMap<String, BTreeMap<CellType, DataArray>>,
    sink: &mut ReferenceSink,
    grid: &mut Element,
) -> Result<(), Error> {
    mesh.validate_point_data(point_data)?;
    mesh.validate_cell_data(cell_data)?;

    for (name, data) in point_data {
        let item = sink.write_reference(Role::Attribute, name, data)?;
        grid.add_child(attribute_element(name, "Node", data).with_child(item.to_element()));
    }

    for (name, blocks) in cell_data {
        for block in &mesh.cells {
            let data = blocks.get(&block.cell_type).ok_or_else(|| {
                let reason = format!(
                    "cell field `{name}` has no data for the {} block",
                    block.cell_type
                );
                FormatError::from(InvalidMesh::new(reason))
            })?;

            let key_hint = format!("{name}/{}", block.cell_type);
            let item = sink.write_reference(Role::Attribute, &key_hint, data)?;
            grid.add_child(attribute_element(name, "Cell", data).with_child(item.to_element()));
        }
    }

    Ok(())
}

fn attribute_element(name: &str, center: &str, data: &DataArray) -> Element {
    Element::new("Attribute")
        .with_attribute("Name", name)
        .with_attribute("AttributeType", attribute_type(data.shape()))
        .with_attribute("Center", center)
}

/// xdmf `AttributeType` implied by the shape of a field
pub(crate) fn attribute_type(shape: &[usize]) -> &'static str {
    match shape {
        [_] | [_, 1] => "Scalar",
        [_, 2] | [_, 3] => "Vector",
        [_, 9] | [_, 3, 3] => "Tensor",
        [_, 6] => "Tensor6",
        _ => "Matrix",
    }
}

/// Decode a uniform grid to a mesh, loading every array through `source`
pub fn decode(grid: &Element, source: &mut ReferenceSource) -> Result<Mesh, Error> {
    let (mut mesh, layouts) = decode_topology_grid(grid, source)?;

    let (point_data, cell_data) = decode_attributes(grid, &mesh, &layouts, source)?;
    mesh.point_data = point_data;
    mesh.cell_data = cell_data;

    mesh.validate()?;
    Ok(mesh)
}

/// How the cells of one `Topology` element map onto the blocks of the mesh
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TopologyLayout {
    num_cells: usize,
    parts: Vec<LayoutPart>,
}

#[derive(Debug, Clone, PartialEq)]
struct LayoutPart {
    /// index into `Mesh::cells`
    block: usize,
    /// cells of the topology that belong to the block. `None` means all of them.
    rows: Option<Vec<usize>>,
}

/// read the geometry and topologies of `grid`. The returned mesh has no fields.
pub(crate) fn decode_topology_grid(
    grid: &Element,
    source: &mut ReferenceSource,
) -> Result<(Mesh, Vec<TopologyLayout>), Error> {
    if grid.tag() != "Grid" {
        let err = UnexpectedElement::new("Grid", format!("element `{}`", grid.tag()));
        return Err(FormatError::from(err).into());
    }

    if let Some(grid_type) = grid.attribute("GridType") {
        if grid_type.trim() != "Uniform" {
            return Err(UnsupportedFeature::GridType(grid_type.into()).into());
        }
    }

    let points = decode_geometry(grid.require_child("Geometry")?, source)?;

    let mut cells: Vec<CellBlock> = Vec::new();
    let mut layouts = Vec::new();

    for topology in grid.children_named("Topology") {
        let layout = decode_topology(topology, source, &mut cells)?;
        layouts.push(layout);
    }

    let mesh = Mesh::new(points, cells);
    mesh.validate_topology()?;

    Ok((mesh, layouts))
}

fn decode_geometry(geometry: &Element, source: &mut ReferenceSource) -> Result<Array2<f64>, Error> {
    let geometry_type = geometry.attribute("GeometryType").unwrap_or("XYZ").trim();

    match geometry_type {
        "XY" | "XYZ" => {
            let dimension = if geometry_type == "XY" { 2 } else { 3 };
            let item = geometry.require_child("DataItem")?;
            let points = source.read_element(Role::Geometry, item)?.to_f64();
            Ok(into_rows(points, dimension, "geometry")?)
        }
        "X_Y" | "X_Y_Z" => {
            let dimension = if geometry_type == "X_Y" { 2 } else { 3 };
            let items = geometry.children_named("DataItem").collect::<Vec<_>>();

            if items.len() != dimension {
                let reason = format!(
                    "{geometry_type} geometry needs {dimension} data items but has {}",
                    items.len()
                );
                return Err(FormatError::from(InvalidMesh::new(reason)).into());
            }

            let columns = items
                .into_iter()
                .map(|item| {
                    let column = source.read_element(Role::Geometry, item)?.to_f64();
                    let len = column.len();
                    Ok(column.into_shape(len).map_err(|_| geometry_error("coordinate arrays must be flat"))?)
                })
                .collect::<Result<Vec<Array1<f64>>, Error>>()?;

            let num_points = columns[0].len();
            if columns.iter().any(|column| column.len() != num_points) {
                return Err(geometry_error("coordinate arrays differ in length").into());
            }

            let views = columns.iter().map(|column| column.view()).collect::<Vec<_>>();
            let points = ndarray::stack(Axis(1), &views)
                .map_err(|_| geometry_error("coordinate arrays could not be combined"))?;
            Ok(points)
        }
        other => Err(UnsupportedFeature::GeometryType(other.into()).into()),
    }
}

fn geometry_error(reason: &str) -> FormatError {
    InvalidMesh::new(reason.into()).into()
}

/// reshape a flat or `[n, columns]` array to `[n, columns]`
fn into_rows<T: Clone>(array: ArrayD<T>, columns: usize, what: &str) -> Result<Array2<T>, FormatError> {
    let len = array.len();

    if columns == 0 || len % columns != 0 {
        let reason = format!("{what} has {len} values which is not a multiple of {columns}");
        return Err(InvalidMesh::new(reason).into());
    }

    if array.ndim() == 2 && array.shape()[1] != columns {
        let reason = format!(
            "{what} has rows of {} values but needs rows of {columns}",
            array.shape()[1]
        );
        return Err(InvalidMesh::new(reason).into());
    }

    let shape = (len / columns, columns);
    array
        .as_standard_layout()
        .into_owned()
        .into_shape(shape)
        .map_err(|_| {
            let reason = format!("{what} cannot be arranged in rows of {columns} values");
            InvalidMesh::new(reason).into()
        })
}

fn decode_topology(
    topology: &Element,
    source: &mut ReferenceSource,
    cells: &mut Vec<CellBlock>,
) -> Result<TopologyLayout, Error> {
    let topology_type = topology.require_attribute("TopologyType")?;
    let item = topology.require_child("DataItem")?;
    let connectivity = source.read_element(Role::Topology, item)?;

    let connectivity = connectivity.to_i64().ok_or_else(|| {
        let err = TypeMismatch::new(Role::Topology, ElementType::Int64, connectivity.element_type());
        FormatError::from(err)
    })?;

    let declared_cells = match topology.attribute("NumberOfElements") {
        Some(_) => Some(topology.parse_attribute::<usize>("NumberOfElements", "a number of cells")?),
        None => None,
    };

    if topology_type.trim().eq_ignore_ascii_case("Mixed") {
        let flat = connectivity.iter().copied().collect::<Vec<i64>>();
        return Ok(decode_mixed(&flat, declared_cells, cells)?);
    }

    let cell_type = CellType::from_xdmf_name(topology_type)?;

    if topology.attribute("NodesPerElement").is_some() {
        let nodes = topology.parse_attribute::<usize>("NodesPerElement", "a number of nodes")?;
        if nodes != cell_type.num_nodes() {
            let name = format!("{topology_type} with {nodes} nodes per element");
            return Err(FormatError::from(UnknownCellType::new(name)).into());
        }
    }

    let data = into_rows(connectivity, cell_type.num_nodes(), "topology")?;
    let num_cells = data.nrows();

    if let Some(declared) = declared_cells {
        if declared != num_cells {
            let reason = format!(
                "{topology_type} topology declares {declared} cells but its data holds {num_cells}"
            );
            return Err(FormatError::from(InvalidMesh::new(reason)).into());
        }
    }

    cells.push(CellBlock::new(cell_type, data));

    Ok(TopologyLayout {
        num_cells,
        parts: vec![LayoutPart {
            block: cells.len() - 1,
            rows: None,
        }],
    })
}

/// split a mixed connectivity into blocks by cell type, in order of first appearance
fn decode_mixed(
    flat: &[i64],
    declared_cells: Option<usize>,
    cells: &mut Vec<CellBlock>,
) -> Result<TopologyLayout, FormatError> {
    let truncated = || FormatError::from(InvalidMesh::new("mixed topology ends inside a cell".into()));

    // (cell type, flat connectivity, cells of the topology that belong to the block)
    let mut blocks: Vec<(CellType, Vec<i64>, Vec<usize>)> = Vec::new();
    let mut pos = 0;
    let mut num_cells = 0;

    while pos < flat.len() {
        let id = flat[pos];
        let cell_type = CellType::from_mixed_id(id)
            .ok_or_else(|| UnknownCellType::new(format!("mixed topology id {id}")))?;
        pos += 1;

        // polyvertex and polyline entries carry their node count
        if matches!(cell_type, CellType::Vertex | CellType::Line) {
            let nodes = *flat.get(pos).ok_or_else(truncated)?;
            if nodes != cell_type.num_nodes() as i64 {
                let name = format!("{} with {nodes} nodes", cell_type.xdmf_name());
                return Err(UnknownCellType::new(name).into());
            }
            pos += 1;
        }

        let end = pos + cell_type.num_nodes();
        let nodes = flat.get(pos..end).ok_or_else(truncated)?;

        match blocks.iter_mut().find(|(existing, _, _)| *existing == cell_type) {
            Some((_, connectivity, rows)) => {
                connectivity.extend_from_slice(nodes);
                rows.push(num_cells);
            }
            None => blocks.push((cell_type, nodes.to_vec(), vec![num_cells])),
        }

        pos = end;
        num_cells += 1;
    }

    if let Some(declared) = declared_cells {
        if declared != num_cells {
            let reason =
                format!("mixed topology declares {declared} cells but its data holds {num_cells}");
            return Err(InvalidMesh::new(reason).into());
        }
    }

    let mut parts = Vec::with_capacity(blocks.len());
    for (cell_type, connectivity, rows) in blocks {
        let data = Array2::from_shape_vec((rows.len(), cell_type.num_nodes()), connectivity)
            .map_err(|_| truncated())?;
        cells.push(CellBlock::new(cell_type, data));
        parts.push(LayoutPart {
            block: cells.len() - 1,
            rows: Some(rows),
        });
    }

    Ok(TopologyLayout { num_cells, parts })
}

/// read the `Attribute` elements of `grid`. Cell attributes are assigned to the topologies
/// described by `layouts` by position.
pub(crate) fn decode_attributes(
    grid: &Element,
    mesh: &Mesh,
    layouts: &[TopologyLayout],
    source: &mut ReferenceSource,
) -> Result<(BTreeMap<String, DataArray>, BTreeMap<String, BTreeMap<CellType, DataArray>>), Error> {
    let mut point_data = BTreeMap::new();
    let mut cell_fields: BTreeMap<String, Vec<DataArray>> = BTreeMap::new();

    for attribute in grid.children_named("Attribute") {
        let name = attribute.require_attribute("Name")?;
        let center = attribute.attribute("Center").unwrap_or("Node").trim();
        let item = attribute.require_child("DataItem")?;

        match center {
            "Node" => {
                let data = source.read_element(Role::Attribute, item)?;
                point_data.insert(name.to_string(), data);
            }
            "Cell" => {
                let data = source.read_element(Role::Attribute, item)?;
                cell_fields.entry(name.to_string()).or_default().push(data);
            }
            other => return Err(UnsupportedFeature::AttributeCenter(other.into()).into()),
        }
    }

    let mut cell_data: BTreeMap<String, BTreeMap<CellType, DataArray>> = BTreeMap::new();

    for (name, arrays) in cell_fields {
        if arrays.len() != layouts.len() {
            let reason = format!(
                "cell field `{name}` appears {} times but the grid has {} topologies",
                arrays.len(),
                layouts.len()
            );
            return Err(FormatError::from(InvalidMesh::new(reason)).into());
        }

        let blocks = cell_data.entry(name.clone()).or_default();

        for (data, layout) in arrays.into_iter().zip(layouts) {
            if data.shape().is_empty() || data.rows() != layout.num_cells {
                let cell_type = match layout.parts.as_slice() {
                    [part] => mesh.cells[part.block].cell_type.to_string(),
                    _ => String::from("mixed"),
                };
                let err = RowCountMismatch::new(name.clone(), cell_type, layout.num_cells, data.rows());
                return Err(FormatError::from(err).into());
            }

            for part in &layout.parts {
                let cell_type = mesh.cells[part.block].cell_type;
                let block_data = match &part.rows {
                    None => data.clone(),
                    Some(rows) => data.select_rows(rows),
                };
                blocks.insert(cell_type, block_data);
            }
        }
    }

    Ok((point_data, cell_data))
}
