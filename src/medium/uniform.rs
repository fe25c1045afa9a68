use crate::error::ConfigError;
use crate::math::{Vector3, TOLERANCE};

/// Parameters of a medium with uniform properties.
///
/// A `density` of `None` means the tabulated density of the material is
/// used by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniform {
    density: Option<f64>,
    magnet: Option<Vector3>,
}

impl Uniform {
    /// Creates uniform parameters with the material's own density and no
    /// magnetic field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the density, in kg/m^3.
    ///
    /// # Errors
    ///
    /// Returns an error if the density is not strictly positive.
    pub fn with_density(mut self, density: f64) -> Result<Self, ConfigError> {
        if !density.is_finite() || density <= TOLERANCE {
            return Err(ConfigError::InvalidMedium(format!(
                "uniform density must be positive, got {density}"
            )));
        }
        self.density = Some(density);
        Ok(self)
    }

    /// Sets a constant magnetic field, in T.
    #[must_use]
    pub fn with_magnet(mut self, magnet: Vector3) -> Self {
        self.magnet = Some(magnet);
        self
    }

    /// Returns the density override, if any.
    #[must_use]
    pub fn density(&self) -> Option<f64> {
        self.density
    }

    /// Returns the magnetic field, if any.
    #[must_use]
    pub fn magnet(&self) -> Option<&Vector3> {
        self.magnet.as_ref()
    }
}
