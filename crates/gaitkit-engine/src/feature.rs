//! Signal feature classification and selection
//!
//! Feature columns are recognized by name. The category decides which
//! plausibility rule the validator applies:
//!
//! | Name contains         | Kind                        |
//! |-----------------------|-----------------------------|
//! | `velocity`            | [`FeatureKind::Velocity`]   |
//! | `angle`               | [`FeatureKind::Angle`]      |
//! | `moment`              | [`FeatureKind::Moment`]     |
//! | `grf`, `force`        | [`FeatureKind::Force`]      |
//!
//! Matching is case-insensitive and runs top to bottom, so a name that
//! mentions both `angle` and `velocity` is a velocity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Columns that identify samples rather than carry a signal. They are never
/// treated as features even if their name happens to match a pattern.
pub const IDENTIFIER_COLUMNS: &[&str] = &[
    "time",
    "time_s",
    "step",
    "cycle",
    "cycle_id",
    "subject_id",
    "task_id",
    "task_info",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Angle,
    Velocity,
    Moment,
    Force,
    Unknown,
}

impl FeatureKind {
    /// Classifies a column by its name.
    ///
    /// ```
    /// use gaitkit_engine::feature::FeatureKind;
    ///
    /// assert_eq!(FeatureKind::classify("knee_flexion_angle_ipsi_rad"), FeatureKind::Angle);
    /// assert_eq!(FeatureKind::classify("hip_flexion_velocity_rad_s"), FeatureKind::Velocity);
    /// assert_eq!(FeatureKind::classify("ankle_moment_Nm_kg"), FeatureKind::Moment);
    /// assert_eq!(FeatureKind::classify("vertical_GRF_BW"), FeatureKind::Force);
    /// assert_eq!(FeatureKind::classify("phase_percent"), FeatureKind::Unknown);
    /// ```
    #[must_use]
    pub fn classify(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("velocity") {
            FeatureKind::Velocity
        } else if name.contains("angle") {
            FeatureKind::Angle
        } else if name.contains("moment") {
            FeatureKind::Moment
        } else if name.contains("grf") || name.contains("force") {
            FeatureKind::Force
        } else {
            FeatureKind::Unknown
        }
    }

    /// Whether the kind is one of the recognized signal categories.
    #[must_use]
    pub fn is_signal(self) -> bool {
        !matches!(self, FeatureKind::Unknown)
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureKind::Angle => "angle",
            FeatureKind::Velocity => "velocity",
            FeatureKind::Moment => "moment",
            FeatureKind::Force => "force",
            FeatureKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Which features a query operates on.
///
/// Query methods take `impl Into<FeatureSelection>`, so both
/// `FeatureSelection::All` and a plain list of names work:
///
/// ```no_run
/// # use gaitkit_engine::{engine::CycleEngine, feature::FeatureSelection};
/// # let engine: CycleEngine = todo!();
/// let all = engine.get_cycles("S1", "walk", FeatureSelection::All);
/// let knee = engine.get_cycles("S1", "walk", &["knee_flexion_angle_rad"]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeatureSelection<'a> {
    /// Every feature discovered at construction.
    #[default]
    All,
    /// Only these names; names that are not numeric columns are dropped.
    Named(&'a [&'a str]),
}

impl<'a> From<&'a [&'a str]> for FeatureSelection<'a> {
    fn from(names: &'a [&'a str]) -> Self {
        FeatureSelection::Named(names)
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for FeatureSelection<'a> {
    fn from(names: &'a [&'a str; N]) -> Self {
        FeatureSelection::Named(names)
    }
}

impl<'a> From<&'a Vec<&'a str>> for FeatureSelection<'a> {
    fn from(names: &'a Vec<&'a str>) -> Self {
        FeatureSelection::Named(names)
    }
}

impl<'a> From<Option<&'a [&'a str]>> for FeatureSelection<'a> {
    fn from(names: Option<&'a [&'a str]>) -> Self {
        names.map_or(FeatureSelection::All, FeatureSelection::Named)
    }
}
