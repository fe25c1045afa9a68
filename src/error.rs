use thiserror::Error;

/// Top-level error type for the geomedia crate.
#[derive(Debug, Error)]
pub enum GeomediaError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Material(#[from] MaterialError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors raised by edits of a geometry tree.
///
/// These are always detected before any mutation is applied, so the tree
/// is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("circular geometry reference")]
    CircularReference,

    #[error("child index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("geometry node not found")]
    NodeNotFound,

    #[error("node is not a child of this parent")]
    NotAChild,

    #[error("node is still referenced by {parents} parent(s)")]
    StillReferenced { parents: usize },

    #[error("degenerate polyhedron face: {0}")]
    DegenerateFace(String),
}

/// Errors related to material resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaterialError {
    #[error("bad material '{label}'")]
    Unresolved { label: String },
}

/// Errors related to transport sessions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no geometry attached to the session")]
    MissingGeometry,
}

/// Errors related to session and medium configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("bad {kind} mode ('{value}')")]
    BadMode { kind: &'static str, value: String },

    #[error("accuracy {0} is out of range (0, 1]")]
    Accuracy(f64),

    #[error("{limit} limit must be non-negative, got {value}")]
    NegativeLimit { limit: &'static str, value: f64 },

    #[error("invalid medium: {0}")]
    InvalidMedium(String),
}

/// Failure reported by an external transport engine.
///
/// The message is forwarded as-is; it is never interpreted here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("transport engine failed: {message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    /// Creates an engine error carrying the engine's own message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Convenience type alias for results using [`GeomediaError`].
pub type Result<T> = std::result::Result<T, GeomediaError>;
