use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::error::StructuralError;

use super::{GeometryStore, NodeId};

impl GeometryStore {
    /// Returns every transitive parent of `id`, each once, nearest first.
    ///
    /// Shared nodes are visited once even when reachable along several
    /// paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the store.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>, StructuralError> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for (parent, _) in self.node(current)?.parents() {
                if seen.insert(parent) {
                    order.push(parent);
                    queue.push_back(parent);
                }
            }
        }
        Ok(order)
    }

    /// Returns `true` if `ancestor` is a transitive parent of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not in the store.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> Result<bool, StructuralError> {
        Ok(self.ancestors(id)?.contains(&ancestor))
    }

    /// Fails if listing `child` under `parent` would close a cycle.
    ///
    /// The full ancestor closure of `parent` is computed before answering.
    pub(super) fn check_circular(
        &self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), StructuralError> {
        if parent == child || self.ancestors(parent)?.contains(&child) {
            return Err(StructuralError::CircularReference);
        }
        Ok(())
    }

    /// Marks `id` and all of its ancestors invalid, stamping them with a
    /// fresh revision.
    pub(super) fn invalidate(&mut self, id: NodeId) -> Result<(), StructuralError> {
        let mut targets = self.ancestors(id)?;
        targets.push(id);
        let revision = self.bump_revision();
        for &target in &targets {
            let node = self.node_mut(target)?;
            node.valid = false;
            node.revision = revision;
        }
        trace!(nodes = targets.len(), revision, "invalidated geometry");
        Ok(())
    }
}
