mod gradient;
mod registry;
mod uniform;

pub use gradient::{Gradient, GradientProfile};
pub use registry::MediumRegistry;
pub use uniform::Uniform;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::material::{MaterialIndex, TableId};
use crate::math::{Point3, Vector3};

/// Label of the material filling a medium.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MaterialLabel {
    /// No material: the region is see-through and defers to its parent.
    Transparent,
    /// A material name, resolved against a material table.
    Named(String),
}

impl MaterialLabel {
    /// Name used for the transparent sentinel.
    pub const TRANSPARENT: &'static str = "Transparent";

    /// Returns the label as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Transparent => Self::TRANSPARENT,
            Self::Named(name) => name,
        }
    }

    #[must_use]
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }
}

impl From<&str> for MaterialLabel {
    fn from(s: &str) -> Self {
        if s.is_empty() || s == Self::TRANSPARENT {
            Self::Transparent
        } else {
            Self::Named(s.into())
        }
    }
}

impl From<String> for MaterialLabel {
    fn from(s: String) -> Self {
        if s.is_empty() || s == Self::TRANSPARENT {
            Self::Transparent
        } else {
            Self::Named(s)
        }
    }
}

impl fmt::Display for MaterialLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical parameters of a medium.
#[derive(Debug, Clone, PartialEq)]
pub enum MediumKind {
    /// Constant density and magnetic field.
    Uniform(Uniform),
    /// Density varying along an axis.
    Gradient(Gradient),
}

impl MediumKind {
    /// Returns the magnetic field of the medium, if any.
    #[must_use]
    pub fn magnet(&self) -> Option<&Vector3> {
        match self {
            Self::Uniform(u) => u.magnet(),
            Self::Gradient(g) => g.magnet(),
        }
    }

    /// Returns the density at `point`, or `None` when the tabulated
    /// material density applies.
    #[must_use]
    pub fn density_at(&self, point: &Point3) -> Option<f64> {
        match self {
            Self::Uniform(u) => u.density(),
            Self::Gradient(g) => Some(g.density_at(point)),
        }
    }
}

impl From<Uniform> for MediumKind {
    fn from(u: Uniform) -> Self {
        Self::Uniform(u)
    }
}

impl From<Gradient> for MediumKind {
    fn from(g: Gradient) -> Self {
        Self::Gradient(g)
    }
}

/// A material index cached for one specific table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub table: TableId,
    pub index: MaterialIndex,
}

#[derive(Debug)]
pub(crate) struct MediumInner {
    label: MaterialLabel,
    kind: MediumKind,
    name: Option<String>,
    resolution: Cell<Option<Resolution>>,
}

/// Shared handle to a medium.
///
/// Media are created through a [`MediumRegistry`], which only keeps a weak
/// reference: a medium lives as long as some geometry node or user handle
/// holds it. Label and parameters are fixed at construction; only the
/// cached material index changes, and only through registry resolution.
#[derive(Debug, Clone)]
pub struct Medium(Rc<MediumInner>);

impl Medium {
    pub(crate) fn from_inner(inner: Rc<MediumInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn inner(&self) -> &Rc<MediumInner> {
        &self.0
    }

    fn new(label: MaterialLabel, kind: MediumKind, name: Option<String>) -> Self {
        Self(Rc::new(MediumInner {
            label,
            kind,
            name,
            resolution: Cell::new(None),
        }))
    }

    /// Returns the material label.
    #[must_use]
    pub fn material(&self) -> &MaterialLabel {
        &self.0.label
    }

    /// Returns the material label as text.
    #[must_use]
    pub fn label(&self) -> &str {
        self.0.label.as_str()
    }

    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.0.label.is_transparent()
    }

    #[must_use]
    pub fn kind(&self) -> &MediumKind {
        &self.0.kind
    }

    /// Returns the user-facing name of the medium, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Returns the last resolution of this medium, whatever its table.
    #[must_use]
    pub fn resolution(&self) -> Option<Resolution> {
        self.0.resolution.get()
    }

    /// Returns the cached material index if it was resolved against
    /// `table`, `None` otherwise.
    #[must_use]
    pub fn resolved_index(&self, table: TableId) -> Option<MaterialIndex> {
        self.0
            .resolution
            .get()
            .filter(|r| r.table == table)
            .map(|r| r.index)
    }

    pub(crate) fn set_resolution(&self, resolution: Option<Resolution>) {
        self.0.resolution.set(resolution);
    }

    /// Returns `true` if both handles refer to the same medium.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Medium {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Medium {}
