//! Engine configuration
//!
//! Every knob has a default, so `EngineConfig::default()` is a complete
//! configuration for data normalized to 150 phase points per cycle.
//! Both structs are `serde`-enabled with `#[serde(default)]`, so a partial
//! document only overrides the fields it names:
//!
//! ```
//! use gaitkit_engine::config::EngineConfig;
//!
//! let config: EngineConfig = serde_json::from_str(
//!     r#"{ "subject_column": "participant", "thresholds": { "moment_max_magnitude": 250.0 } }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.subject_column, "participant");
//! assert_eq!(config.points_per_cycle, 150);
//! assert_eq!(config.thresholds.moment_max_magnitude, 250.0);
//! assert_eq!(config.thresholds.velocity_max_magnitude, 17.45);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Number of phase points every normalized cycle is resampled to.
pub const DEFAULT_POINTS_PER_CYCLE: usize = 150;

/// Default outlier cut-off, in standard deviations above the mean RMSE.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 2.0;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("points_per_cycle must be at least 1")]
    InvalidPointsPerCycle,
    #[display("{name} must be finite and non-negative, got {value}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
    },
    #[display("cache_capacity must be at least 1 when set")]
    InvalidCacheCapacity,
}

/// Physiological plausibility limits applied by the cycle validator.
///
/// Angles are in radians, angular velocities in rad/s; moments and forces
/// are in whatever unit the source data uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    /// Largest admissible joint angle magnitude.
    pub angle_max_magnitude: f64,
    /// Largest admissible change between adjacent phase points of an angle.
    pub angle_max_jump: f64,
    /// Largest admissible angular velocity magnitude.
    pub velocity_max_magnitude: f64,
    /// Largest admissible joint moment magnitude.
    pub moment_max_magnitude: f64,
    /// Largest admissible force magnitude; forces are only checked for
    /// finiteness when unset.
    pub force_max_magnitude: Option<f64>,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            angle_max_magnitude: PI,
            angle_max_jump: 30.0_f64.to_radians(),
            velocity_max_magnitude: 17.45,
            moment_max_magnitude: 300.0,
            force_max_magnitude: None,
        }
    }
}

impl ValidationThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("angle_max_magnitude", self.angle_max_magnitude)?;
        check_threshold("angle_max_jump", self.angle_max_jump)?;
        check_threshold("velocity_max_magnitude", self.velocity_max_magnitude)?;
        check_threshold("moment_max_magnitude", self.moment_max_magnitude)?;
        if let Some(value) = self.force_max_magnitude {
            check_threshold("force_max_magnitude", value)?;
        }
        Ok(())
    }
}

/// Full configuration surface of [`CycleEngine`](crate::engine::CycleEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Phase points per normalized cycle; must match the source data.
    pub points_per_cycle: usize,
    /// Name of the subject identifier column.
    pub subject_column: String,
    /// Name of the task identifier column.
    pub task_column: String,
    /// Name of the phase or cycle-index column. Optional in the table; when
    /// present it is used to verify row order before reshaping.
    ///
    /// The column holds one of two layouts, told apart by the first cycle:
    ///
    /// - phase values, strictly increasing within every cycle;
    /// - a cycle index, constant within every cycle and different from the
    ///   previous cycle's value.
    pub phase_column: String,
    /// Plausibility limits for the cycle validator.
    pub thresholds: ValidationThresholds,
    /// Default outlier multiplier for
    /// [`find_outlier_cycles`](crate::engine::CycleEngine::find_outlier_cycles).
    pub outlier_threshold: f64,
    /// Maximum number of cached cycle blocks; `None` keeps every block.
    pub cache_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            points_per_cycle: DEFAULT_POINTS_PER_CYCLE,
            subject_column: "subject".into(),
            task_column: "task".into(),
            phase_column: "phase".into(),
            thresholds: ValidationThresholds::default(),
            outlier_threshold: DEFAULT_OUTLIER_THRESHOLD,
            cache_capacity: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points_per_cycle == 0 {
            return Err(ConfigError::InvalidPointsPerCycle);
        }
        self.thresholds.validate()?;
        check_threshold("outlier_threshold", self.outlier_threshold)?;
        if self.cache_capacity == Some(0) {
            return Err(ConfigError::InvalidCacheCapacity);
        }
        Ok(())
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.points_per_cycle, 150);
        assert!((config.thresholds.angle_max_jump - 0.5236).abs() < 1e-4);
        assert!((config.thresholds.angle_max_magnitude - PI).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_points_per_cycle_is_rejected() {
        let config = EngineConfig {
            points_per_cycle: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPointsPerCycle)
        ));
    }

    #[test]
    fn test_bad_thresholds_are_rejected() {
        let mut config = EngineConfig::default();
        config.thresholds.velocity_max_magnitude = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold {
                name: "velocity_max_magnitude",
                ..
            })
        ));

        let mut config = EngineConfig::default();
        config.thresholds.force_max_magnitude = Some(-1.0);
        assert!(config.validate().is_err());

        let config = EngineConfig {
            outlier_threshold: -0.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cache_capacity_is_rejected() {
        let config = EngineConfig {
            cache_capacity: Some(0),
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCacheCapacity)
        ));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = EngineConfig {
            cache_capacity: Some(8),
            ..EngineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
