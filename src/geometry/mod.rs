mod edit;
mod polyhedron;
mod region;
mod walk;

pub use polyhedron::{Polyhedron, PolyhedronFace};
pub use region::Region;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::SlotMap;

use crate::error::StructuralError;
use crate::medium::Medium;

slotmap::new_key_type! {
    /// Unique identifier for a node in a geometry store.
    pub struct NodeId;
}

/// Counter for unique [`StoreId`] allocation.
static STORE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a geometry store.
///
/// Node IDs are only meaningful within their store, so snapshot caches
/// key on the pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        Self(STORE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Data associated with a geometry node.
///
/// A node owns the nodes listed in `children`; the same child may be
/// listed several times, by one or by several parents. `parents` is the
/// reverse relation with one count per listing. It never owns anything.
#[derive(Debug, Clone)]
pub struct NodeData {
    region: Region,
    medium: Option<Medium>,
    children: Vec<NodeId>,
    parents: HashMap<NodeId, usize>,
    valid: bool,
    revision: u64,
}

impl NodeData {
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    #[must_use]
    pub fn medium(&self) -> Option<&Medium> {
        self.medium.as_ref()
    }

    /// Returns the children in declared order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Iterates over `(parent, count)` pairs.
    pub fn parents(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.parents.iter().map(|(&id, &count)| (id, count))
    }

    /// Returns how many times `parent` lists this node as a child.
    #[must_use]
    pub fn parent_count(&self, parent: NodeId) -> usize {
        self.parents.get(&parent).copied().unwrap_or(0)
    }

    /// Returns the total number of parent listings.
    #[must_use]
    pub fn parent_listings(&self) -> usize {
        self.parents.values().sum()
    }

    /// Returns `false` if the node or one of its descendants changed since
    /// the last snapshot that included it.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Revision stamp, bumped whenever the node is invalidated.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Arena owning every geometry node of a scene.
///
/// Nodes reference each other via [`NodeId`]s (generational indices), so
/// shared children, back-references and removal never produce dangling
/// pointers or reference cycles.
#[derive(Debug)]
pub struct GeometryStore {
    id: StoreId,
    nodes: SlotMap<NodeId, NodeData>,
    revision: u64,
}

impl Default for GeometryStore {
    fn default() -> Self {
        Self {
            id: StoreId::next(),
            nodes: SlotMap::with_key(),
            revision: 0,
        }
    }
}

impl GeometryStore {
    /// Creates a new, empty geometry store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(&self) -> StoreId {
        self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterates over every node of the store.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }

    // --- Node creation ---

    /// Creates an unbounded region filled with `medium`.
    pub fn create_leaf(&mut self, medium: Option<Medium>) -> NodeId {
        self.insert(Region::Infinite, medium)
    }

    /// Creates a convex polyhedral region filled with `medium`.
    pub fn create_interior(
        &mut self,
        faces: impl Into<Polyhedron>,
        medium: Option<Medium>,
    ) -> NodeId {
        self.insert(Region::Polyhedron(faces.into()), medium)
    }

    /// Creates a convex polyhedral region and appends `children` to it, in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the children does not exist. Nothing is
    /// created in that case.
    pub fn create_interior_with_children(
        &mut self,
        faces: impl Into<Polyhedron>,
        medium: Option<Medium>,
        children: &[NodeId],
    ) -> Result<NodeId, StructuralError> {
        if children.iter().any(|&c| !self.contains(c)) {
            return Err(StructuralError::NodeNotFound);
        }
        let id = self.create_interior(faces, medium);
        for &child in children {
            self.append_child(id, child)?;
        }
        Ok(id)
    }

    fn insert(&mut self, region: Region, medium: Option<Medium>) -> NodeId {
        let revision = self.bump_revision();
        self.nodes.insert(NodeData {
            region,
            medium,
            children: Vec::new(),
            parents: HashMap::new(),
            valid: false,
            revision,
        })
    }

    fn bump_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    // --- Node access ---

    /// Returns the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the store.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, StructuralError> {
        self.nodes.get(id).ok_or(StructuralError::NodeNotFound)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, StructuralError> {
        self.nodes.get_mut(id).ok_or(StructuralError::NodeNotFound)
    }

    /// Returns the children of `id` in declared order.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the store.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], StructuralError> {
        Ok(self.node(id)?.children())
    }

    /// Returns the child of `parent` at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is not in the store or the index is
    /// out of range.
    pub fn child(&self, parent: NodeId, index: usize) -> Result<NodeId, StructuralError> {
        let children = self.children(parent)?;
        children
            .get(index)
            .copied()
            .ok_or(StructuralError::IndexOutOfRange {
                index,
                len: children.len(),
            })
    }

    /// Returns how many times `parent` lists `id` as a child.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the store.
    pub fn parent_count(&self, id: NodeId, parent: NodeId) -> Result<usize, StructuralError> {
        Ok(self.node(id)?.parent_count(parent))
    }

    /// Returns the validity flag of a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not in the store.
    pub fn is_valid(&self, id: NodeId) -> Result<bool, StructuralError> {
        Ok(self.node(id)?.is_valid())
    }

    pub(crate) fn mark_valid(&mut self, id: NodeId) -> Result<(), StructuralError> {
        self.node_mut(id)?.valid = true;
        Ok(())
    }
}
