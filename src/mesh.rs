//! The canonical unstructured mesh that is encoded to, and decoded from, xdmf grids
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Constructor)]
/// A homogeneous block of cells. Each row of `data` holds the point indices of one cell.
pub struct CellBlock {
    pub cell_type: CellType,
    pub data: Array2<i64>,
}

impl CellBlock {
    pub fn num_cells(&self) -> usize {
        self.data.nrows()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Points, cell blocks and the fields defined on them
pub struct Mesh {
    /// coordinates with shape `[num_points, dimension]`
    pub points: Array2<f64>,
    pub cells: Vec<CellBlock>,
    /// fields with one row per point
    pub point_data: BTreeMap<String, DataArray>,
    /// fields with one array per cell block, each with one row per cell of that block
    pub cell_data: BTreeMap<String, BTreeMap<CellType, DataArray>>,
}

impl Mesh {
    pub fn new(points: Array2<f64>, cells: Vec<CellBlock>) -> Self {
        Self {
            points,
            cells,
            point_data: BTreeMap::new(),
            cell_data: BTreeMap::new(),
        }
    }

    pub fn with_point_data<T: Into<String>, U: Into<DataArray>>(mut self, name: T, data: U) -> Self {
        self.point_data.insert(name.into(), data.into());
        self
    }

    pub fn with_cell_data<T: Into<String>, U: Into<DataArray>>(
        mut self,
        name: T,
        cell_type: CellType,
        data: U,
    ) -> Self {
        self.cell_data
            .entry(name.into())
            .or_default()
            .insert(cell_type, data.into());
        self
    }

    pub fn num_points(&self) -> usize {
        self.points.nrows()
    }

    pub fn dimension(&self) -> usize {
        self.points.ncols()
    }

    pub fn cell_block(&self, cell_type: CellType) -> Option<&CellBlock> {
        self.cells.iter().find(|block| block.cell_type == cell_type)
    }

    /// check every invariant of the mesh: point dimension, connectivity, and the sizes of all
    /// fields
    pub fn validate(&self) -> Result<(), FormatError> {
        self.validate_topology()?;
        self.validate_point_data(&self.point_data)?;
        self.validate_cell_data(&self.cell_data)?;
        Ok(())
    }

    /// check the points and cell blocks only
    pub fn validate_topology(&self) -> Result<(), FormatError> {
        let dimension = self.dimension();
        if !(dimension == 2 || dimension == 3) {
            let reason = format!("points must have 2 or 3 coordinates, found {dimension}");
            return Err(InvalidMesh::new(reason).into());
        }

        let num_points = self.num_points();

        for (idx, block) in self.cells.iter().enumerate() {
            if self.cells[..idx]
                .iter()
                .any(|previous| previous.cell_type == block.cell_type)
            {
                let reason = format!("cell type {} appears in more than one block", block.cell_type);
                return Err(InvalidMesh::new(reason).into());
            }

            let nodes = block.data.ncols();
            if nodes != block.cell_type.num_nodes() {
                let reason = format!(
                    "{} cells have {} nodes but the block stores {nodes} per row",
                    block.cell_type,
                    block.cell_type.num_nodes()
                );
                return Err(InvalidMesh::new(reason).into());
            }

            for (row, cell) in block.data.outer_iter().enumerate() {
                if let Some(index) = cell
                    .iter()
                    .copied()
                    .find(|index| *index < 0 || *index as usize >= num_points)
                {
                    let err = IndexOutOfBounds::new(block.cell_type, row, index, num_points);
                    return Err(err.into());
                }
            }
        }

        Ok(())
    }

    /// check that every field has one row per point
    pub(crate) fn validate_point_data(
        &self,
        point_data: &BTreeMap<String, DataArray>,
    ) -> Result<(), FormatError> {
        let num_points = self.num_points();

        for (name, data) in point_data {
            if data.shape().is_empty() || data.rows() != num_points {
                let reason = format!(
                    "point field `{name}` has shape {:?} but the mesh has {num_points} points",
                    data.shape()
                );
                return Err(InvalidMesh::new(reason).into());
            }
        }

        Ok(())
    }

    /// check that every field names an existing cell block and has one row per cell of it
    pub(crate) fn validate_cell_data(
        &self,
        cell_data: &BTreeMap<String, BTreeMap<CellType, DataArray>>,
    ) -> Result<(), FormatError> {
        for (name, blocks) in cell_data {
            for (cell_type, data) in blocks {
                let block = self.cell_block(*cell_type).ok_or_else(|| {
                    let reason =
                        format!("cell field `{name}` is defined on {cell_type} cells but the mesh has none");
                    FormatError::from(InvalidMesh::new(reason))
                })?;

                if data.shape().is_empty() || data.rows() != block.num_cells() {
                    let err = RowCountMismatch::new(
                        name.clone(),
                        cell_type.to_string(),
                        block.num_cells(),
                        data.rows(),
                    );
                    return Err(err.into());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_triangles() -> Mesh {
        let points = array![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let triangles = CellBlock::new(CellType::Triangle, array![[0, 1, 2], [0, 2, 3]]);
        Mesh::new(points, vec![triangles])
    }

    #[test]
    fn valid_mesh() {
        let mesh = two_triangles()
            .with_point_data("temperature", array![1.0, 2.0, 3.0, 4.0])
            .with_cell_data("material", CellType::Triangle, array![7i32, 8]);

        mesh.validate().unwrap();
        assert_eq!(mesh.num_points(), 4);
        assert_eq!(mesh.dimension(), 2);
    }

    #[test]
    fn index_out_of_bounds() {
        let mut mesh = two_triangles();
        mesh.cells[0].data[[1, 2]] = 4;

        let err = mesh.validate().unwrap_err();
        assert!(matches!(err, FormatError::IndexOutOfBounds(_)));

        mesh.cells[0].data[[1, 2]] = -1;
        let err = mesh.validate().unwrap_err();
        assert!(matches!(err, FormatError::IndexOutOfBounds(_)));
    }

    #[test]
    fn wrong_node_count() {
        let mut mesh = two_triangles();
        mesh.cells.push(CellBlock::new(CellType::Quad, array![[0, 1, 2]]));

        let err = mesh.validate().unwrap_err();
        assert!(matches!(err, FormatError::InvalidMesh(_)));
    }

    #[test]
    fn duplicate_block() {
        let mut mesh = two_triangles();
        mesh.cells.push(mesh.cells[0].clone());

        let err = mesh.validate().unwrap_err();
        assert!(matches!(err, FormatError::InvalidMesh(_)));
    }

    #[test]
    fn field_sizes() {
        let mesh = two_triangles().with_point_data("u", array![1.0, 2.0]);
        assert!(matches!(mesh.validate(), Err(FormatError::InvalidMesh(_))));

        let mesh = two_triangles().with_cell_data("m", CellType::Triangle, array![1, 2, 3]);
        assert!(matches!(mesh.validate(), Err(FormatError::RowCountMismatch(_))));

        let mesh = two_triangles().with_cell_data("m", CellType::Quad, array![1]);
        assert!(matches!(mesh.validate(), Err(FormatError::InvalidMesh(_))));
    }

    #[test]
    fn one_dimensional_points() {
        let mesh = Mesh::new(array![[0.0], [1.0]], vec![]);
        assert!(matches!(mesh.validate(), Err(FormatError::InvalidMesh(_))));
    }
}
