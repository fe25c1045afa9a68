mod build;
mod locate;

pub use build::BuildSnapshot;
pub use locate::Location;

use std::rc::Rc;

use crate::geometry::{NodeId, Region, StoreId};
use crate::material::{MaterialIndex, TableId};
use crate::medium::MediumKind;

/// Medium payload of a snapshot record.
#[derive(Debug, Clone, PartialEq)]
pub struct MediumRecord {
    /// Resolved material index; `None` for a transparent medium.
    pub material: Option<MaterialIndex>,
    /// Density and magnetic field parameters.
    pub kind: MediumKind,
}

impl MediumRecord {
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.material.is_none()
    }
}

/// One geometry node in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    /// Node this record was built from.
    pub node: NodeId,
    pub region: Region,
    pub medium: Option<MediumRecord>,
    /// Record indices of the children, in declared order.
    pub children: Vec<usize>,
}

/// Flattened, read-only view of a geometry tree, ready for an engine.
///
/// Record 0 is the root. A node shared by several parents has a single
/// record referenced by each of them. Nothing in a snapshot aliases the
/// mutable store it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    records: Vec<SnapshotRecord>,
    table: TableId,
}

impl Snapshot {
    /// Returns the root record.
    #[must_use]
    pub fn root(&self) -> &SnapshotRecord {
        &self.records[0]
    }

    #[must_use]
    pub fn records(&self) -> &[SnapshotRecord] {
        &self.records
    }

    #[must_use]
    pub fn record(&self, index: usize) -> Option<&SnapshotRecord> {
        self.records.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`: a snapshot holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the index of the record built from `node`.
    #[must_use]
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.records.iter().position(|r| r.node == node)
    }

    /// Returns the material table the indices refer to.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }
}

/// Everything a cached snapshot depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SnapshotKey {
    store: StoreId,
    root: NodeId,
    revision: u64,
    table: TableId,
}

/// Per-consumer snapshot cache.
///
/// Each transport session owns one slot, so a tree attached to several
/// sessions is cached independently for each of them.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    cached: Option<(SnapshotKey, Rc<Snapshot>)>,
}

impl SnapshotSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot, whether or not it is still current.
    #[must_use]
    pub fn get(&self) -> Option<&Rc<Snapshot>> {
        self.cached.as_ref().map(|(_, snapshot)| snapshot)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cached.is_none()
    }

    /// Drops the cached snapshot.
    pub fn clear(&mut self) {
        self.cached = None;
    }

    fn lookup(&self, key: &SnapshotKey) -> Option<&Rc<Snapshot>> {
        match &self.cached {
            Some((cached, snapshot)) if cached == key => Some(snapshot),
            _ => None,
        }
    }

    fn store(&mut self, key: SnapshotKey, snapshot: Rc<Snapshot>) {
        self.cached = Some((key, snapshot));
    }
}
