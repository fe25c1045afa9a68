mod config;

pub use config::{
    DecayMode, Direction, EnergyLossMode, EventLimits, ScatteringMode, SessionConfig,
};

use std::rc::Rc;

use tracing::debug;

use crate::error::{EngineError, MaterialError, Result, SessionError};
use crate::geometry::{GeometryStore, NodeId};
use crate::material::{MaterialLookup, TableId};
use crate::medium::MediumRegistry;
use crate::snapshot::{BuildSnapshot, Snapshot, SnapshotSlot};

/// Everything an engine needs for one batch, besides the states.
#[derive(Debug, Clone, Copy)]
pub struct TransportRequest<'a> {
    /// Geometry to transport through, with resolved material indices.
    pub snapshot: &'a Snapshot,
    /// Table the snapshot's material indices refer to.
    pub table: TableId,
    pub config: &'a SessionConfig,
}

/// External engine stepping particles through a snapshot.
pub trait TransportEngine {
    /// Per-particle state, opaque to this crate.
    type State;

    /// Transports every state of the batch.
    ///
    /// # Errors
    ///
    /// Returns the engine's own failure, which is forwarded unchanged.
    fn transport(
        &mut self,
        request: TransportRequest<'_>,
        states: &mut [Self::State],
    ) -> std::result::Result<(), EngineError>;
}

/// A transport context: one material table, one attached geometry, and
/// the snapshot cache for that geometry.
///
/// Before each batch the session resolves media against its table, then
/// builds (or reuses) the snapshot of the attached root, and only then
/// calls the engine. Several sessions may share one geometry store; each
/// keeps its own cache.
pub struct TransportSession {
    table: Rc<dyn MaterialLookup>,
    config: SessionConfig,
    root: Option<NodeId>,
    slot: SnapshotSlot,
}

impl TransportSession {
    /// Creates a session bound to `table`, with no geometry attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(table: Rc<dyn MaterialLookup>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table,
            config,
            root: None,
            slot: SnapshotSlot::new(),
        })
    }

    /// Attaches the geometry below `root`.
    ///
    /// Attaching the root already attached changes nothing; any other root
    /// drops the cached snapshot.
    pub fn attach(&mut self, root: NodeId) {
        if self.root == Some(root) {
            return;
        }
        debug!(?root, "attached geometry");
        self.root = Some(root);
        self.slot.clear();
    }

    /// Detaches the geometry, returning the previous root.
    pub fn detach(&mut self) -> Option<NodeId> {
        self.slot.clear();
        self.root.take()
    }

    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replaces the engine settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; the current one is
    /// kept in that case.
    pub fn set_config(&mut self, config: SessionConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    #[must_use]
    pub fn table(&self) -> &Rc<dyn MaterialLookup> {
        &self.table
    }

    /// Swaps the material table, dropping the cached snapshot.
    pub fn set_table(&mut self, table: Rc<dyn MaterialLookup>) {
        self.table = table;
        self.slot.clear();
    }

    /// Returns the last snapshot built by this session.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Rc<Snapshot>> {
        self.slot.get()
    }

    /// Transports a batch of states through the attached geometry.
    ///
    /// Returns the number of states handed to the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if a live medium's material is not in the table, if
    /// no geometry is attached, if the snapshot cannot be built, or if the
    /// engine fails. The engine is not called in the first three cases.
    pub fn transport<E: TransportEngine>(
        &mut self,
        store: &mut GeometryStore,
        registry: &mut MediumRegistry,
        engine: &mut E,
        states: &mut [E::State],
    ) -> Result<usize> {
        if let Some(missing) = registry.resolve(&*self.table) {
            return Err(MaterialError::Unresolved {
                label: missing.label().into(),
            }
            .into());
        }

        let root = self.root.ok_or(SessionError::MissingGeometry)?;
        let table = self.table.table_id();
        let snapshot = BuildSnapshot::new(root, table).execute(store, &mut self.slot)?;

        let request = TransportRequest {
            snapshot: &snapshot,
            table,
            config: &self.config,
        };
        engine.transport(request, states)?;
        Ok(states.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::GeomediaError;
    use crate::geometry::Polyhedron;
    use crate::material::{MaterialIndex, MaterialTable};
    use crate::math::{Point3, Vector3};
    use crate::medium::Uniform;

    /// Engine recording the calls it receives.
    #[derive(Default)]
    struct RecordingEngine {
        snapshots: Vec<Rc<Snapshot>>,
        fail: Option<String>,
    }

    impl TransportEngine for RecordingEngine {
        type State = Point3;

        fn transport(
            &mut self,
            request: TransportRequest<'_>,
            states: &mut [Point3],
        ) -> std::result::Result<(), EngineError> {
            if let Some(message) = &self.fail {
                return Err(EngineError::new(message.clone()));
            }
            assert_eq!(request.snapshot.table(), request.table);
            self.snapshots.push(Rc::new(request.snapshot.clone()));
            for state in states.iter_mut() {
                state.z -= 1.0;
            }
            Ok(())
        }
    }

    fn cube() -> Polyhedron {
        Polyhedron::cuboid(Point3::origin(), Vector3::new(1.0, 1.0, 1.0)).unwrap()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn transport_resolves_builds_and_runs() {
        init_tracing();
        let mut registry = MediumRegistry::new();
        let mut store = GeometryStore::new();
        let table = Rc::new(MaterialTable::new(["Air", "StandardRock"]));
        let rock = registry.create("StandardRock", Uniform::new());
        let root = store.create_leaf(Some(rock));

        let mut session = TransportSession::new(table.clone(), SessionConfig::default()).unwrap();
        session.attach(root);
        let mut engine = RecordingEngine::default();
        let mut states = vec![Point3::origin(); 10];

        let n = session
            .transport(&mut store, &mut registry, &mut engine, &mut states)
            .unwrap();
        assert_eq!(n, 10);
        assert!(states.iter().all(|s| (s.z + 1.0).abs() < 1e-12));
        assert_eq!(
            engine.snapshots[0].root().medium.as_ref().unwrap().material,
            Some(MaterialIndex(1))
        );
        assert_eq!(registry.active_table(), Some(table.id()));
    }

    #[test]
    fn repeated_transport_reuses_snapshot() {
        init_tracing();
        let mut registry = MediumRegistry::new();
        let mut store = GeometryStore::new();
        let table = Rc::new(MaterialTable::new(["Air"]));
        let air = registry.create("Air", Uniform::new());
        let root = store.create_leaf(Some(air));

        let mut session = TransportSession::new(table, SessionConfig::default()).unwrap();
        session.attach(root);
        let mut engine = RecordingEngine::default();

        session
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();
        let first = session.snapshot().unwrap().clone();
        session
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();
        assert!(Rc::ptr_eq(&first, session.snapshot().unwrap()));

        let child = store.create_interior(cube(), None);
        store.append_child(root, child).unwrap();
        session
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();
        assert!(!Rc::ptr_eq(&first, session.snapshot().unwrap()));
        assert_eq!(session.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn unknown_material_aborts_before_engine() {
        let mut registry = MediumRegistry::new();
        let mut store = GeometryStore::new();
        let table = Rc::new(MaterialTable::new(["Air"]));
        let iron = registry.create("Iron", Uniform::new());
        let root = store.create_leaf(Some(iron));

        let mut session = TransportSession::new(table, SessionConfig::default()).unwrap();
        session.attach(root);
        let mut engine = RecordingEngine::default();

        let err = session
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap_err();
        assert_eq!(err.to_string(), "bad material 'Iron'");
        assert!(engine.snapshots.is_empty());
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn missing_geometry_fails() {
        let mut registry = MediumRegistry::new();
        let mut store = GeometryStore::new();
        let table = Rc::new(MaterialTable::new(["Air"]));
        let mut session = TransportSession::new(table, SessionConfig::default()).unwrap();
        let mut engine = RecordingEngine::default();

        let err = session
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap_err();
        assert!(matches!(
            err,
            GeomediaError::Session(SessionError::MissingGeometry)
        ));
        assert!(engine.snapshots.is_empty());
    }

    #[test]
    fn engine_failure_is_forwarded() {
        let mut registry = MediumRegistry::new();
        let mut store = GeometryStore::new();
        let table = Rc::new(MaterialTable::new(["Air"]));
        let root = store.create_leaf(None);
        let mut session = TransportSession::new(table, SessionConfig::default()).unwrap();
        session.attach(root);
        let mut engine = RecordingEngine {
            fail: Some("out of memory".into()),
            ..RecordingEngine::default()
        };

        let err = session
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap_err();
        assert!(matches!(err, GeomediaError::Engine(ref e) if e.message == "out of memory"));
    }

    #[test]
    fn swapping_table_rebuilds_with_new_indices() {
        let mut registry = MediumRegistry::new();
        let mut store = GeometryStore::new();
        let water = registry.create("Water", Uniform::new());
        let root = store.create_leaf(Some(water));
        let t1 = Rc::new(MaterialTable::new(["Air", "Water"]));
        let t2 = Rc::new(MaterialTable::new(["Water"]));

        let mut session = TransportSession::new(t1, SessionConfig::default()).unwrap();
        session.attach(root);
        let mut engine = RecordingEngine::default();
        session
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();

        session.set_table(t2.clone());
        assert!(session.snapshot().is_none());
        session
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.table(), t2.id());
        assert_eq!(
            snapshot.root().medium.as_ref().unwrap().material,
            Some(MaterialIndex(0))
        );
    }

    #[test]
    fn sessions_sharing_a_tree_stay_current() {
        let mut registry = MediumRegistry::new();
        let mut store = GeometryStore::new();
        let table = Rc::new(MaterialTable::new(["Air"]));
        let root = store.create_leaf(None);
        let mut one = TransportSession::new(table.clone(), SessionConfig::default()).unwrap();
        let mut two = TransportSession::new(table, SessionConfig::default()).unwrap();
        one.attach(root);
        two.attach(root);
        let mut engine = RecordingEngine::default();

        one.transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();
        two.transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();

        let child = store.create_leaf(None);
        store.append_child(root, child).unwrap();
        one.transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();
        two.transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();
        assert_eq!(two.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn failure_in_one_session_does_not_break_another() {
        init_tracing();
        let mut registry = MediumRegistry::new();
        let mut store = GeometryStore::new();
        let t1 = Rc::new(MaterialTable::new(["Air", "Iron"]));
        let t2 = Rc::new(MaterialTable::new(["Air"]));
        let air = registry.create("Air", Uniform::new());
        let iron = registry.create("Iron", Uniform::new());
        let root = store.create_leaf(Some(air));
        let block = store.create_interior(cube(), Some(iron.clone()));
        store.append_child(root, block).unwrap();

        let mut one = TransportSession::new(t1.clone(), SessionConfig::default()).unwrap();
        let mut two = TransportSession::new(t2, SessionConfig::default()).unwrap();
        one.attach(root);
        two.attach(root);
        let mut engine = RecordingEngine::default();

        one.transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();
        let err = two
            .transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap_err();
        assert_eq!(err.to_string(), "bad material 'Iron'");

        let extra = store.create_leaf(None);
        store.append_child(root, extra).unwrap();
        one.transport(&mut store, &mut registry, &mut engine, &mut [])
            .unwrap();

        let snapshot = one.snapshot().unwrap();
        assert_eq!(snapshot.len(), 3);
        let bi = snapshot.position_of(block).unwrap();
        assert_eq!(
            snapshot.records()[bi].medium.as_ref().unwrap().material,
            Some(MaterialIndex(1))
        );
        assert_eq!(iron.resolved_index(t1.id()), Some(MaterialIndex(1)));
        assert_eq!(engine.snapshots.len(), 2);
    }

    #[test]
    fn attach_and_detach() {
        let table = Rc::new(MaterialTable::new(["Air"]));
        let mut store = GeometryStore::new();
        let a = store.create_leaf(None);
        let b = store.create_leaf(None);
        let mut session = TransportSession::new(table, SessionConfig::default()).unwrap();

        session.attach(a);
        session.attach(b);
        assert_eq!(session.root(), Some(b));
        assert_eq!(session.detach(), Some(b));
        assert_eq!(session.root(), None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let table = Rc::new(MaterialTable::new(["Air"]));
        let bad = SessionConfig {
            accuracy: 2.0,
            ..SessionConfig::default()
        };
        assert!(TransportSession::new(table.clone(), bad.clone()).is_err());

        let mut session = TransportSession::new(table, SessionConfig::default()).unwrap();
        assert!(session.set_config(bad).is_err());
        assert_eq!(session.config(), &SessionConfig::default());
    }
}
