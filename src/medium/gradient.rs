use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::math::{Point3, Vector3, TOLERANCE};

/// Shape of a density gradient along its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientProfile {
    /// `rho(z) = rho0 * (1 + (z - z0) / lambda)`, floored at zero beyond
    /// `z0 - lambda`.
    Linear,
    /// `rho(z) = rho0 * exp((z - z0) / lambda)`.
    Exponential,
}

impl fmt::Display for GradientProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Exponential => f.write_str("exponential"),
        }
    }
}

impl FromStr for GradientProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            _ => Err(ConfigError::BadMode {
                kind: "gradient",
                value: s.into(),
            }),
        }
    }
}

/// Parameters of a medium whose density varies along an axis.
///
/// The coordinate `z` used by the profile is the projection of the
/// position onto the (normalised) axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    profile: GradientProfile,
    lambda: f64,
    z0: f64,
    rho0: f64,
    axis: Vector3,
    magnet: Option<Vector3>,
}

impl Gradient {
    /// Creates a gradient along `axis`.
    ///
    /// # Errors
    ///
    /// Returns an error if `lambda` is zero, `rho0` is not positive, or the
    /// axis is zero-length.
    pub fn new(
        profile: GradientProfile,
        lambda: f64,
        z0: f64,
        rho0: f64,
        axis: Vector3,
    ) -> Result<Self, ConfigError> {
        if !lambda.is_finite() || lambda.abs() < TOLERANCE {
            return Err(ConfigError::InvalidMedium(
                "gradient length must be non-zero".into(),
            ));
        }
        if !rho0.is_finite() || rho0 <= TOLERANCE {
            return Err(ConfigError::InvalidMedium(format!(
                "gradient reference density must be positive, got {rho0}"
            )));
        }
        let len = axis.norm();
        if len < TOLERANCE {
            return Err(ConfigError::InvalidMedium(
                "gradient axis must be non-zero".into(),
            ));
        }
        Ok(Self {
            profile,
            lambda,
            z0,
            rho0,
            axis: axis / len,
            magnet: None,
        })
    }

    /// Sets a constant magnetic field, in T.
    #[must_use]
    pub fn with_magnet(mut self, magnet: Vector3) -> Self {
        self.magnet = Some(magnet);
        self
    }

    #[must_use]
    pub fn profile(&self) -> GradientProfile {
        self.profile
    }

    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    #[must_use]
    pub fn z0(&self) -> f64 {
        self.z0
    }

    #[must_use]
    pub fn rho0(&self) -> f64 {
        self.rho0
    }

    /// Returns the unit gradient axis.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    #[must_use]
    pub fn magnet(&self) -> Option<&Vector3> {
        self.magnet.as_ref()
    }

    /// Evaluates the density at `point`.
    ///
    /// The linear profile reaches zero at `z = z0 - lambda` and stays there
    /// past it; a density is never negative.
    #[must_use]
    pub fn density_at(&self, point: &Point3) -> f64 {
        let z = self.axis.dot(&point.coords);
        match self.profile {
            GradientProfile::Linear => {
                (self.rho0 * (1.0 + (z - self.z0) / self.lambda)).max(0.0)
            }
            GradientProfile::Exponential => self.rho0 * ((z - self.z0) / self.lambda).exp(),
        }
    }
}
