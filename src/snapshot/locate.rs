use crate::material::MaterialIndex;
use crate::math::Point3;

use super::Snapshot;

/// Region claiming a point, and the material found there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Index of the innermost claiming record.
    pub record: usize,
    pub material: MaterialIndex,
}

impl Snapshot {
    /// Finds the innermost region claiming `point`.
    ///
    /// A region containing the point and filled with a medium first lets
    /// its children claim it, in declared order; the first child that does
    /// wins. If none does, the region claims the point itself, unless its
    /// medium is transparent, in which case the decision falls back to its
    /// parent. Regions without a medium claim nothing, children included.
    #[must_use]
    pub fn locate(&self, point: &Point3) -> Option<Location> {
        self.navigate(0, point)
    }

    fn navigate(&self, index: usize, point: &Point3) -> Option<Location> {
        let record = self.records.get(index)?;
        if !record.region.contains(point) {
            return None;
        }
        let medium = record.medium.as_ref()?;

        if let Some(found) = record
            .children
            .iter()
            .find_map(|&child| self.navigate(child, point))
        {
            return Some(found);
        }
        medium.material.map(|material| Location {
            record: index,
            material,
        })
    }
}
