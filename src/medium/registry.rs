use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::material::{MaterialIndex, MaterialLookup, TableId};

use super::{MaterialLabel, Medium, MediumInner, MediumKind, Resolution};

/// Weakly-held collection of every medium created through it.
///
/// The registry never keeps a medium alive. It resolves material labels to
/// indices in batch, and remembers the identity of the last table against
/// which every live medium resolved, so repeated resolution against the
/// same table costs nothing.
///
/// One registry is meant to be created at startup and shared by every
/// call site that creates media or starts a transport.
#[derive(Debug, Default)]
pub struct MediumRegistry {
    media: Vec<Weak<MediumInner>>,
    last_table: Option<TableId>,
}

impl MediumRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a medium and registers it.
    ///
    /// The material index is not resolved yet; this happens on the next
    /// call to [`resolve`](Self::resolve).
    pub fn create(
        &mut self,
        label: impl Into<MaterialLabel>,
        kind: impl Into<MediumKind>,
    ) -> Medium {
        self.register(Medium::new(label.into(), kind.into(), None))
    }

    /// Creates a medium carrying a user-facing name and registers it.
    pub fn create_named(
        &mut self,
        label: impl Into<MaterialLabel>,
        kind: impl Into<MediumKind>,
        name: impl Into<String>,
    ) -> Medium {
        self.register(Medium::new(label.into(), kind.into(), Some(name.into())))
    }

    fn register(&mut self, medium: Medium) -> Medium {
        self.media.push(Rc::downgrade(medium.inner()));
        // The newcomer is unresolved, so the table fast path no longer holds.
        self.last_table = None;
        medium
    }

    /// Resolves the material index of every live medium against `table`.
    ///
    /// Returns `None` on success, or the first medium whose label is not
    /// in `table`. Resolution stops at that medium and its cached index is
    /// cleared; media visited before it keep their new index, later ones
    /// keep whatever they had. A failed resolution is not recorded and
    /// forgets the previous table, so the next call retries whichever table
    /// it is given.
    ///
    /// Calling again with the table of the last successful resolution is
    /// a no-op, unless a medium was created in between.
    pub fn resolve(&mut self, table: &dyn MaterialLookup) -> Option<Medium> {
        let table_id = table.table_id();
        if self.last_table == Some(table_id) {
            trace!(table = %table_id, "media already resolved");
            return None;
        }
        // Media may be left resolved against a mix of tables below, so only
        // a complete pass records one.
        self.last_table = None;

        let pruned = self.prune();
        let mut resolved = 0usize;
        for weak in &self.media {
            let Some(inner) = weak.upgrade() else {
                continue;
            };
            let medium = Medium::from_inner(inner);
            let MaterialLabel::Named(label) = medium.material() else {
                continue;
            };
            if let Some(index) = table.material_index(label) {
                medium.set_resolution(Some(Resolution {
                    table: table_id,
                    index,
                }));
                resolved += 1;
            } else {
                warn!(table = %table_id, material = %label, "unknown material");
                medium.set_resolution(None);
                return Some(medium);
            }
        }

        debug!(table = %table_id, resolved, pruned, "resolved media");
        self.last_table = Some(table_id);
        None
    }

    /// Drops the entries of media that no longer exist, returning how many
    /// were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.media.len();
        self.media.retain(|weak| weak.strong_count() > 0);
        before - self.media.len()
    }

    /// Returns the number of registered entries, including dead ones not
    /// yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.media.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    /// Returns the number of media still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.media.iter().filter(|w| w.strong_count() > 0).count()
    }

    /// Iterates over the media still alive, in creation order.
    pub fn media(&self) -> impl Iterator<Item = Medium> + '_ {
        self.media
            .iter()
            .filter_map(Weak::upgrade)
            .map(Medium::from_inner)
    }

    /// Returns the table of the last successful resolution.
    #[must_use]
    pub fn active_table(&self) -> Option<TableId> {
        self.last_table
    }

    /// Returns the index of `medium` in the active table, if resolved.
    #[must_use]
    pub fn index_of(&self, medium: &Medium) -> Option<MaterialIndex> {
        self.last_table.and_then(|table| medium.resolved_index(table))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::material::MaterialTable;
    use crate::medium::Uniform;

    /// Table wrapper counting the lookups made against it.
    struct CountingTable {
        table: MaterialTable,
        lookups: Cell<usize>,
    }

    impl CountingTable {
        fn new(names: &[&str]) -> Self {
            Self {
                table: MaterialTable::new(names.iter().copied()),
                lookups: Cell::new(0),
            }
        }
    }

    impl MaterialLookup for CountingTable {
        fn table_id(&self) -> TableId {
            self.table.id()
        }

        fn material_index(&self, label: &str) -> Option<MaterialIndex> {
            self.lookups.set(self.lookups.get() + 1);
            self.table.material_index(label)
        }
    }

    #[test]
    fn resolves_against_table() {
        let mut registry = MediumRegistry::new();
        let t1 = MaterialTable::new(["Air", "Water", "Rock", "Iron"]);
        let iron = registry.create("Iron", Uniform::new());

        assert_eq!(iron.resolved_index(t1.id()), None);
        assert!(registry.resolve(&t1).is_none());
        assert_eq!(iron.resolved_index(t1.id()), Some(MaterialIndex(3)));
        assert_eq!(registry.index_of(&iron), Some(MaterialIndex(3)));
        assert_eq!(registry.active_table(), Some(t1.id()));
    }

    #[test]
    fn swapped_table_missing_material_fails() {
        let mut registry = MediumRegistry::new();
        let t1 = MaterialTable::new(["Air", "Water", "Rock", "Iron"]);
        let t2 = MaterialTable::new(["Air", "Water"]);
        let iron = registry.create("Iron", Uniform::new());

        assert!(registry.resolve(&t1).is_none());
        let missing = registry.resolve(&t2).unwrap();
        assert_eq!(missing, iron);
        assert_eq!(missing.label(), "Iron");
        assert_eq!(iron.resolution(), None);
        assert_eq!(iron.resolved_index(t1.id()), None);
        assert_eq!(registry.index_of(&iron), None);
        assert_eq!(registry.active_table(), None);
    }

    #[test]
    fn second_resolve_with_same_table_does_no_lookup() {
        let mut registry = MediumRegistry::new();
        let table = CountingTable::new(&["Air", "Water"]);
        let air = registry.create("Air", Uniform::new());
        let water = registry.create("Water", Uniform::new());

        assert!(registry.resolve(&table).is_none());
        assert_eq!(table.lookups.get(), 2);

        assert!(registry.resolve(&table).is_none());
        assert_eq!(table.lookups.get(), 2);
        assert_eq!(air.resolved_index(table.table_id()), Some(MaterialIndex(0)));
        assert_eq!(water.resolved_index(table.table_id()), Some(MaterialIndex(1)));
    }

    #[test]
    fn new_medium_forces_resolution() {
        let mut registry = MediumRegistry::new();
        let table = MaterialTable::new(["Air", "Water"]);
        let _air = registry.create("Air", Uniform::new());
        assert!(registry.resolve(&table).is_none());

        let water = registry.create("Water", Uniform::new());
        assert_eq!(registry.active_table(), None);
        assert!(registry.resolve(&table).is_none());
        assert_eq!(water.resolved_index(table.id()), Some(MaterialIndex(1)));
    }

    #[test]
    fn failure_stops_at_first_missing() {
        let mut registry = MediumRegistry::new();
        let table = CountingTable::new(&["Air"]);
        let _gold = registry.create("Gold", Uniform::new());
        let air = registry.create("Air", Uniform::new());

        let missing = registry.resolve(&table).unwrap();
        assert_eq!(missing.label(), "Gold");
        assert_eq!(table.lookups.get(), 1);
        assert_eq!(air.resolved_index(table.table_id()), None);
        assert_eq!(registry.active_table(), None);

        // Not recorded: the next call retries and fails again.
        assert!(registry.resolve(&table).is_some());
        assert_eq!(table.lookups.get(), 2);
    }

    #[test]
    fn failed_swap_then_previous_table_resolves_again() {
        let mut registry = MediumRegistry::new();
        let t1 = CountingTable::new(&["Air", "Iron"]);
        let t2 = MaterialTable::new(["Air"]);
        let air = registry.create("Air", Uniform::new());
        let iron = registry.create("Iron", Uniform::new());

        assert!(registry.resolve(&t1).is_none());
        assert_eq!(t1.lookups.get(), 2);
        assert_eq!(registry.resolve(&t2).unwrap(), iron);
        assert_eq!(air.resolved_index(t2.id()), Some(MaterialIndex(0)));

        // Back to the first table: a full pass, not the fast path.
        assert!(registry.resolve(&t1).is_none());
        assert_eq!(t1.lookups.get(), 4);
        assert_eq!(registry.active_table(), Some(t1.table_id()));
        for medium in registry.media() {
            assert!(medium.resolved_index(t1.table_id()).is_some());
        }
        assert_eq!(iron.resolved_index(t1.table_id()), Some(MaterialIndex(1)));
    }

    #[test]
    fn dead_media_are_pruned() {
        let mut registry = MediumRegistry::new();
        let table = MaterialTable::new(["Air"]);
        let air = registry.create("Air", Uniform::new());
        let unknown = registry.create("Unobtainium", Uniform::new());
        assert_eq!(registry.len(), 2);

        drop(unknown);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.len(), 2);

        assert!(registry.resolve(&table).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.media().next().unwrap(), air);
    }

    #[test]
    fn registry_does_not_keep_media_alive() {
        let mut registry = MediumRegistry::new();
        let medium = registry.create("Air", Uniform::new());
        let weak = Rc::downgrade(medium.inner());
        drop(medium);
        assert!(weak.upgrade().is_none());
        assert_eq!(registry.prune(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn transparent_media_are_skipped() {
        let mut registry = MediumRegistry::new();
        let table = CountingTable::new(&["Air"]);
        let void = registry.create(MaterialLabel::Transparent, Uniform::new());

        assert!(registry.resolve(&table).is_none());
        assert_eq!(table.lookups.get(), 0);
        assert_eq!(void.resolution(), None);
    }

    #[test]
    fn named_media_keep_their_name() {
        let mut registry = MediumRegistry::new();
        let rock = registry.create_named("StandardRock", Uniform::new(), "ground");
        assert_eq!(rock.name(), Some("ground"));
        assert_eq!(rock.label(), "StandardRock");
    }
}
