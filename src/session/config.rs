use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// How continuous energy losses are simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyLossMode {
    Disabled,
    /// Continuous slowing down approximation.
    Csda,
    /// Continuous losses plus catastrophic events.
    Mixed,
    /// Mixed, with straggling of the continuous part.
    #[default]
    Straggled,
}

/// How particle decays are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecayMode {
    Disabled,
    #[default]
    Weighted,
    Randomised,
}

/// Direction of the Monte Carlo flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// How multiple scattering is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScatteringMode {
    Disabled,
    #[default]
    Mixed,
}

impl fmt::Display for EnergyLossMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Csda => "csda",
            Self::Mixed => "mixed",
            Self::Straggled => "straggled",
        })
    }
}

impl FromStr for EnergyLossMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "csda" => Ok(Self::Csda),
            "mixed" => Ok(Self::Mixed),
            "straggled" => Ok(Self::Straggled),
            _ => Err(bad_mode("energy loss", s)),
        }
    }
}

impl fmt::Display for DecayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Weighted => "weighted",
            Self::Randomised => "randomised",
        })
    }
}

impl FromStr for DecayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "weighted" => Ok(Self::Weighted),
            "randomised" => Ok(Self::Randomised),
            _ => Err(bad_mode("decay", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        })
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            _ => Err(bad_mode("direction", s)),
        }
    }
}

impl fmt::Display for ScatteringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Mixed => "mixed",
        })
    }
}

impl FromStr for ScatteringMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "mixed" => Ok(Self::Mixed),
            _ => Err(bad_mode("scattering", s)),
        }
    }
}

fn bad_mode(kind: &'static str, value: &str) -> ConfigError {
    ConfigError::BadMode {
        kind,
        value: value.into(),
    }
}

/// Optional stopping conditions of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventLimits {
    /// Travelled distance, in m.
    pub distance: Option<f64>,
    /// Kinetic energy, in GeV.
    pub energy: Option<f64>,
    /// Column depth, in kg/m^2.
    pub grammage: Option<f64>,
    /// Proper time, in m/c.
    pub time: Option<f64>,
}

impl EventLimits {
    fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("distance", self.distance),
            ("energy", self.energy),
            ("grammage", self.grammage),
            ("time", self.time),
        ];
        for (limit, value) in limits {
            if let Some(value) = value {
                if value.is_nan() || value < 0.0 {
                    return Err(ConfigError::NegativeLimit { limit, value });
                }
            }
        }
        Ok(())
    }
}

/// Engine settings carried by a transport session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Relative accuracy of the stepping, in (0, 1].
    pub accuracy: f64,
    pub energy_loss: EnergyLossMode,
    pub decay: DecayMode,
    pub direction: Direction,
    pub scattering: ScatteringMode,
    pub limits: EventLimits,
    /// Seed of the engine's random stream; `None` lets the engine pick.
    pub random_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            accuracy: 1e-2,
            energy_loss: EnergyLossMode::default(),
            decay: DecayMode::default(),
            direction: Direction::default(),
            scattering: ScatteringMode::default(),
            limits: EventLimits::default(),
            random_seed: None,
        }
    }
}

impl SessionConfig {
    /// Checks that every setting is in range.
    ///
    /// # Errors
    ///
    /// Returns an error if the accuracy is outside (0, 1] or a limit is
    /// negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.accuracy > 0.0 && self.accuracy <= 1.0) {
            return Err(ConfigError::Accuracy(self.accuracy));
        }
        self.limits.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.energy_loss, EnergyLossMode::Straggled);
        assert_eq!(config.direction, Direction::Forward);
    }

    #[test]
    fn accuracy_out_of_range() {
        for accuracy in [0.0, -0.1, 1.5, f64::NAN] {
            let config = SessionConfig {
                accuracy,
                ..SessionConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Accuracy(_))));
        }
    }

    #[test]
    fn negative_limit_is_rejected() {
        let config = SessionConfig {
            limits: EventLimits {
                grammage: Some(-1.0),
                ..EventLimits::default()
            },
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeLimit {
                limit: "grammage",
                value: -1.0
            })
        );
    }

    #[test]
    fn modes_round_trip_through_names() {
        assert_eq!("csda".parse::<EnergyLossMode>().unwrap(), EnergyLossMode::Csda);
        assert_eq!("backward".parse::<Direction>().unwrap(), Direction::Backward);
        assert_eq!("randomised".parse::<DecayMode>().unwrap(), DecayMode::Randomised);
        assert_eq!(ScatteringMode::Disabled.to_string(), "disabled");
    }

    #[test]
    fn bad_mode_names_are_reported() {
        let err = "hybrid".parse::<EnergyLossMode>().unwrap_err();
        assert_eq!(err.to_string(), "bad energy loss mode ('hybrid')");
        assert!("stable".parse::<DecayMode>().is_err());
        assert!("longitudinal".parse::<ScatteringMode>().is_err());
    }
}
