use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{MaterialError, Result};
use crate::geometry::{GeometryStore, NodeId};
use crate::material::TableId;
use crate::medium::{MaterialLabel, Medium};

use super::{MediumRecord, Snapshot, SnapshotKey, SnapshotRecord, SnapshotSlot};

/// Builds the snapshot of the tree below a root, reusing the slot's cached
/// snapshot when nothing it depends on has changed.
///
/// Media must have been resolved against `table` beforehand: records embed
/// material indices, not labels.
pub struct BuildSnapshot {
    root: NodeId,
    table: TableId,
}

impl BuildSnapshot {
    /// Creates a new `BuildSnapshot` operation.
    #[must_use]
    pub fn new(root: NodeId, table: TableId) -> Self {
        Self { root, table }
    }

    /// Executes the build.
    ///
    /// The cached snapshot is returned as-is if it was built from the same
    /// store, root and table, and the root has not been invalidated since.
    /// Otherwise the tree is flattened again, every node it contains is
    /// marked valid, and the slot is refilled.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not in the store, or if a named
    /// medium in the tree has no index for the table.
    pub fn execute(
        &self,
        store: &mut GeometryStore,
        slot: &mut SnapshotSlot,
    ) -> Result<Rc<Snapshot>> {
        let root = store.node(self.root)?;
        let key = SnapshotKey {
            store: store.id(),
            root: self.root,
            revision: root.revision(),
            table: self.table,
        };
        if root.is_valid() {
            if let Some(snapshot) = slot.lookup(&key) {
                trace!(root = ?self.root, "geometry snapshot reused");
                return Ok(Rc::clone(snapshot));
            }
        }

        let mut flatten = Flatten {
            store,
            table: self.table,
            records: Vec::new(),
            positions: HashMap::new(),
        };
        flatten.visit(self.root)?;
        let Flatten {
            records, positions, ..
        } = flatten;

        for &node in positions.keys() {
            store.mark_valid(node)?;
        }
        debug!(root = ?self.root, records = records.len(), "rebuilt geometry snapshot");

        let snapshot = Rc::new(Snapshot {
            records,
            table: self.table,
        });
        slot.store(key, Rc::clone(&snapshot));
        Ok(snapshot)
    }
}

/// Depth-first flattening state.
struct Flatten<'a> {
    store: &'a GeometryStore,
    table: TableId,
    records: Vec<SnapshotRecord>,
    positions: HashMap<NodeId, usize>,
}

impl Flatten<'_> {
    fn visit(&mut self, id: NodeId) -> Result<usize> {
        if let Some(&index) = self.positions.get(&id) {
            return Ok(index);
        }

        let store = self.store;
        let node = store.node(id)?;
        let medium = node.medium().map(|m| self.medium_record(m)).transpose()?;
        let index = self.records.len();
        self.records.push(SnapshotRecord {
            node: id,
            region: node.region().clone(),
            medium,
            children: Vec::with_capacity(node.children().len()),
        });
        self.positions.insert(id, index);

        for &child in node.children() {
            let child_index = self.visit(child)?;
            self.records[index].children.push(child_index);
        }
        Ok(index)
    }

    fn medium_record(&self, medium: &Medium) -> Result<MediumRecord> {
        let material = match medium.material() {
            MaterialLabel::Transparent => None,
            MaterialLabel::Named(label) => Some(medium.resolved_index(self.table).ok_or_else(
                || MaterialError::Unresolved {
                    label: label.clone(),
                },
            )?),
        };
        Ok(MediumRecord {
            material,
            kind: medium.kind().clone(),
        })
    }
}
