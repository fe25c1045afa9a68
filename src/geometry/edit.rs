use std::collections::hash_map::Entry;

use crate::error::StructuralError;
use crate::medium::Medium;

use super::{GeometryStore, NodeId};

// Every edit validates first (existence, cycles, indices) and only then
// mutates, so a rejected edit leaves the store untouched.
impl GeometryStore {
    /// Replaces the child of `parent` at `index` with `child`, returning
    /// the replaced node.
    ///
    /// Assigning a node to the slot it already occupies changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is missing, the edit would create a
    /// cycle, or the index is out of range.
    pub fn set_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<NodeId, StructuralError> {
        self.node(child)?;
        self.check_circular(parent, child)?;
        let old = self.child(parent, index)?;
        if old == child {
            return Ok(old);
        }

        self.unregister(parent, old)?;
        self.node_mut(parent)?.children[index] = child;
        self.register(parent, child)?;
        self.invalidate(parent)?;
        Ok(old)
    }

    /// Inserts `child` before position `index` of `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is missing, the edit would create a
    /// cycle, or `index` is greater than the number of children.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), StructuralError> {
        self.node(child)?;
        self.check_circular(parent, child)?;
        let len = self.children(parent)?.len();
        if index > len {
            return Err(StructuralError::IndexOutOfRange { index, len });
        }

        self.node_mut(parent)?.children.insert(index, child);
        self.register(parent, child)?;
        self.invalidate(parent)
    }

    /// Appends `child` to `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is missing or the edit would create
    /// a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructuralError> {
        self.node(child)?;
        self.check_circular(parent, child)?;

        self.node_mut(parent)?.children.push(child);
        self.register(parent, child)?;
        self.invalidate(parent)
    }

    /// Removes and returns the child of `parent` at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is missing or the index is out of
    /// range.
    pub fn pop_child(&mut self, parent: NodeId, index: usize) -> Result<NodeId, StructuralError> {
        let child = self.child(parent, index)?;

        self.node_mut(parent)?.children.remove(index);
        self.unregister(parent, child)?;
        self.invalidate(parent)?;
        Ok(child)
    }

    /// Removes and returns the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is missing or has no child.
    pub fn pop_last(&mut self, parent: NodeId) -> Result<NodeId, StructuralError> {
        let len = self.children(parent)?.len();
        if len == 0 {
            return Err(StructuralError::IndexOutOfRange { index: 0, len: 0 });
        }
        self.pop_child(parent, len - 1)
    }

    /// Removes the first listing of `child` among `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is missing or does not list `child`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructuralError> {
        let index = self
            .children(parent)?
            .iter()
            .position(|&c| c == child)
            .ok_or(StructuralError::NotAChild)?;
        self.pop_child(parent, index).map(|_| ())
    }

    /// Replaces the medium filling `id`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the store.
    pub fn set_medium(
        &mut self,
        id: NodeId,
        medium: Option<Medium>,
    ) -> Result<Option<Medium>, StructuralError> {
        let old = std::mem::replace(&mut self.node_mut(id)?.medium, medium);
        self.invalidate(id)?;
        Ok(old)
    }

    /// Deletes a node that no parent lists anymore.
    ///
    /// The node's own listings are released: its children lose it as a
    /// parent but stay in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or still listed by a parent.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), StructuralError> {
        let listings = self.node(id)?.parent_listings();
        if listings > 0 {
            return Err(StructuralError::StillReferenced { parents: listings });
        }

        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            self.unregister(id, child)?;
        }
        self.nodes.remove(id);
        Ok(())
    }

    fn register(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructuralError> {
        *self.node_mut(child)?.parents.entry(parent).or_insert(0) += 1;
        Ok(())
    }

    fn unregister(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructuralError> {
        if let Entry::Occupied(mut entry) = self.node_mut(child)?.parents.entry(parent) {
            *entry.get_mut() -= 1;
            if *entry.get() == 0 {
                entry.remove();
            }
        }
        Ok(())
    }
}
