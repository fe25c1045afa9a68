use crate::math::Point3;

use super::polyhedron::Polyhedron;

/// Spatial extent of a geometry node.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// Unbounded region: contains every point.
    Infinite,
    /// Convex region bounded by planar faces.
    Polyhedron(Polyhedron),
}

impl Region {
    /// Returns `true` if `point` belongs to the region.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        match self {
            Self::Infinite => true,
            Self::Polyhedron(p) => p.contains(point),
        }
    }

    #[must_use]
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Polyhedron(_))
    }
}

impl From<Polyhedron> for Region {
    fn from(p: Polyhedron) -> Self {
        Self::Polyhedron(p)
    }
}
