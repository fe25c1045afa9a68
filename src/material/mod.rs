use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`TableId`] allocation.
static TABLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a material table.
///
/// Two distinct tables always have different IDs, even if they list the
/// same materials. Resolution caches are keyed on this identity rather
/// than on table contents, so dropping a table and building a new one at
/// the same address can never alias a stale resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(u64);

impl TableId {
    /// Allocates a fresh, process-unique table ID. Thread-safe.
    #[must_use]
    pub fn next() -> Self {
        Self(TABLE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a material inside a material table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialIndex(pub usize);

impl fmt::Display for MaterialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lookup from material labels to indices, with a stable identity.
///
/// This is the seam to the physics subsystem: any tabulated physics
/// description that can name its materials can drive medium resolution.
pub trait MaterialLookup {
    /// Returns the identity of this table.
    fn table_id(&self) -> TableId;

    /// Returns the index of the material with the given label, if any.
    fn material_index(&self, label: &str) -> Option<MaterialIndex>;
}

/// In-memory material table.
///
/// Indices are assigned in insertion order. Cloning a table keeps its
/// identity, which is sound because tables are immutable.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    id: TableId,
    names: Vec<String>,
    indices: HashMap<String, MaterialIndex>,
}

impl MaterialTable {
    /// Creates a table from an ordered list of material names.
    ///
    /// Duplicate names keep the index of their first occurrence.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut indices = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            indices.entry(name.clone()).or_insert(MaterialIndex(i));
        }
        Self {
            id: TableId::next(),
            names,
            indices,
        }
    }

    /// Returns the identity of this table.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the name of the material at `index`.
    #[must_use]
    pub fn name(&self, index: MaterialIndex) -> Option<&str> {
        self.names.get(index.0).map(String::as_str)
    }

    /// Returns the number of materials in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the table holds no material.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over `(index, name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (MaterialIndex, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (MaterialIndex(i), name.as_str()))
    }
}

impl MaterialLookup for MaterialTable {
    fn table_id(&self) -> TableId {
        self.id
    }

    fn material_index(&self, label: &str) -> Option<MaterialIndex> {
        self.indices.get(label).copied()
    }
}
