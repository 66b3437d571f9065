//! The cell vocabulary of the canonical mesh and its xdmf topology names
use crate::prelude::*;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Kind of cell stored in a [`CellBlock`](crate::CellBlock)
pub enum CellType {
    Vertex,
    Line,
    Triangle,
    Quad,
    Tetra,
    Pyramid,
    Wedge,
    Hexahedron,
    Line3,
    Triangle6,
    Quad8,
    Tetra10,
    Pyramid13,
    Wedge15,
    Hexahedron20,
}

impl CellType {
    pub const ALL: [CellType; 15] = [
        Self::Vertex,
        Self::Line,
        Self::Triangle,
        Self::Quad,
        Self::Tetra,
        Self::Pyramid,
        Self::Wedge,
        Self::Hexahedron,
        Self::Line3,
        Self::Triangle6,
        Self::Quad8,
        Self::Tetra10,
        Self::Pyramid13,
        Self::Wedge15,
        Self::Hexahedron20,
    ];

    /// number of points that make up one cell
    pub fn num_nodes(self) -> usize {
        match self {
            Self::Vertex => 1,
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad => 4,
            Self::Tetra => 4,
            Self::Pyramid => 5,
            Self::Wedge => 6,
            Self::Hexahedron => 8,
            Self::Line3 => 3,
            Self::Triangle6 => 6,
            Self::Quad8 => 8,
            Self::Tetra10 => 10,
            Self::Pyramid13 => 13,
            Self::Wedge15 => 15,
            Self::Hexahedron20 => 20,
        }
    }

    /// value of `TopologyType` for a uniform topology of this cell type
    pub fn xdmf_name(self) -> &'static str {
        match self {
            Self::Vertex => "Polyvertex",
            Self::Line => "Polyline",
            Self::Triangle => "Triangle",
            Self::Quad => "Quadrilateral",
            Self::Tetra => "Tetrahedron",
            Self::Pyramid => "Pyramid",
            Self::Wedge => "Wedge",
            Self::Hexahedron => "Hexahedron",
            Self::Line3 => "Edge_3",
            Self::Triangle6 => "Triangle_6",
            Self::Quad8 => "Quadrilateral_8",
            Self::Tetra10 => "Tetrahedron_10",
            Self::Pyramid13 => "Pyramid_13",
            Self::Wedge15 => "Wedge_15",
            Self::Hexahedron20 => "Hexahedron_20",
        }
    }

    /// inverse of [`xdmf_name`](Self::xdmf_name). Topology names are matched
    /// without regard to case since producers disagree on it.
    pub fn from_xdmf_name(name: &str) -> Result<Self, FormatError> {
        let name = name.trim();

        Self::ALL
            .into_iter()
            .find(|cell_type| cell_type.xdmf_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownCellType::new(name.into()).into())
    }

    /// type id used inside the connectivity of a `Mixed` topology
    pub fn mixed_id(self) -> i64 {
        match self {
            Self::Vertex => 1,
            Self::Line => 2,
            Self::Triangle => 4,
            Self::Quad => 5,
            Self::Tetra => 6,
            Self::Pyramid => 7,
            Self::Wedge => 8,
            Self::Hexahedron => 9,
            Self::Line3 => 34,
            Self::Triangle6 => 36,
            Self::Quad8 => 37,
            Self::Tetra10 => 38,
            Self::Pyramid13 => 39,
            Self::Wedge15 => 40,
            Self::Hexahedron20 => 48,
        }
    }

    pub fn from_mixed_id(id: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cell_type| cell_type.mixed_id() == id)
    }

    /// lowercase name used for messages and keys
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Line => "line",
            Self::Triangle => "triangle",
            Self::Quad => "quad",
            Self::Tetra => "tetra",
            Self::Pyramid => "pyramid",
            Self::Wedge => "wedge",
            Self::Hexahedron => "hexahedron",
            Self::Line3 => "line3",
            Self::Triangle6 => "triangle6",
            Self::Quad8 => "quad8",
            Self::Tetra10 => "tetra10",
            Self::Pyramid13 => "pyramid13",
            Self::Wedge15 => "wedge15",
            Self::Hexahedron20 => "hexahedron20",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_bijective() {
        for cell_type in CellType::ALL {
            assert_eq!(
                CellType::from_xdmf_name(cell_type.xdmf_name()).unwrap(),
                cell_type
            );
            assert_eq!(CellType::from_mixed_id(cell_type.mixed_id()), Some(cell_type));
        }
    }

    #[test]
    fn names_ignore_case() {
        assert_eq!(
            CellType::from_xdmf_name("QUADRILATERAL").unwrap(),
            CellType::Quad
        );
        assert_eq!(CellType::from_xdmf_name(" triangle ").unwrap(), CellType::Triangle);
    }

    #[test]
    fn unknown_names() {
        let err = CellType::from_xdmf_name("Polygon").unwrap_err();
        assert!(matches!(err, FormatError::UnknownCellType(_)));
        assert_eq!(CellType::from_mixed_id(3), None);
    }
}
