//! Physiological plausibility checks
//!
//! Every feature's phase series within a cycle is checked against the rule
//! of its [`FeatureKind`]; a cycle is valid only if no feature violates any
//! rule. Non-finite samples always violate [`ValidationRule::NonFinite`], so
//! a feature that is entirely `NaN` for a selection invalidates every cycle.

use std::fmt;

use ndarray::ArrayView1;
use serde::Serialize;
use tracing::debug;

use crate::{
    config::ValidationThresholds,
    cycle_block::CycleBlock,
    engine::CycleEngine,
    feature::{FeatureKind, FeatureSelection},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    /// A sample is `NaN` or infinite.
    NonFinite,
    /// An angle sample exceeds `angle_max_magnitude`.
    AngleMagnitude,
    /// Two adjacent angle samples differ by more than `angle_max_jump`.
    AngleJump,
    VelocityMagnitude,
    MomentMagnitude,
    ForceMagnitude,
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationRule::NonFinite => "non-finite value",
            ValidationRule::AngleMagnitude => "angle out of range",
            ValidationRule::AngleJump => "angle discontinuity",
            ValidationRule::VelocityMagnitude => "velocity out of range",
            ValidationRule::MomentMagnitude => "moment out of range",
            ValidationRule::ForceMagnitude => "force out of range",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    pub cycle: usize,
    pub feature: String,
    pub rule: ValidationRule,
}

/// Rules that one phase series breaks, in [`ValidationRule`] order.
#[must_use]
pub fn check_series(
    series: ArrayView1<'_, f64>,
    kind: FeatureKind,
    thresholds: &ValidationThresholds,
) -> Vec<ValidationRule> {
    let mut broken = vec![];
    if series.iter().any(|v| !v.is_finite()) {
        broken.push(ValidationRule::NonFinite);
    }

    let exceeds = |limit: f64| series.iter().any(|v| v.is_finite() && v.abs() > limit);
    match kind {
        FeatureKind::Angle => {
            if exceeds(thresholds.angle_max_magnitude) {
                broken.push(ValidationRule::AngleMagnitude);
            }
            let jumps = series
                .windows(2)
                .into_iter()
                .any(|w| (w[1] - w[0]).abs() > thresholds.angle_max_jump);
            if jumps {
                broken.push(ValidationRule::AngleJump);
            }
        }
        FeatureKind::Velocity => {
            if exceeds(thresholds.velocity_max_magnitude) {
                broken.push(ValidationRule::VelocityMagnitude);
            }
        }
        FeatureKind::Moment => {
            if exceeds(thresholds.moment_max_magnitude) {
                broken.push(ValidationRule::MomentMagnitude);
            }
        }
        FeatureKind::Force => {
            if thresholds.force_max_magnitude.is_some_and(exceeds) {
                broken.push(ValidationRule::ForceMagnitude);
            }
        }
        FeatureKind::Unknown => {}
    }
    broken
}

/// Per-cycle outcome of the plausibility checks over one cycle block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    num_cycles: usize,
    violations: Vec<RuleViolation>,
}

impl ValidationReport {
    /// Checks every (cycle, feature) series of `block`.
    ///
    /// `kinds[j]` is the category of `block.features()[j]`.
    ///
    /// # Panics
    ///
    /// Panics if `kinds` and the block's feature axis differ in length.
    #[must_use]
    pub fn for_block(
        block: &CycleBlock,
        kinds: &[FeatureKind],
        thresholds: &ValidationThresholds,
    ) -> Self {
        assert_eq!(kinds.len(), block.num_features(), "one kind per feature");

        let mut violations = vec![];
        for cycle in 0..block.num_cycles() {
            for (f, (feature, kind)) in block.features().iter().zip(kinds).enumerate() {
                let broken = check_series(block.series(cycle, f), *kind, thresholds);
                violations.extend(broken.into_iter().map(|rule| RuleViolation {
                    cycle,
                    feature: feature.clone(),
                    rule,
                }));
            }
        }
        Self {
            num_cycles: block.num_cycles(),
            violations,
        }
    }

    #[must_use]
    pub fn num_cycles(&self) -> usize {
        self.num_cycles
    }

    /// Every violation, ordered by cycle then feature.
    #[must_use]
    pub fn violations(&self) -> &[RuleViolation] {
        &self.violations
    }

    pub fn violations_for(&self, cycle: usize) -> impl Iterator<Item = &RuleViolation> + '_ {
        self.violations.iter().filter(move |v| v.cycle == cycle)
    }

    #[must_use]
    pub fn is_valid(&self, cycle: usize) -> bool {
        cycle < self.num_cycles && self.violations_for(cycle).next().is_none()
    }

    /// One flag per cycle, `true` for cycles without violations.
    #[must_use]
    pub fn validity_mask(&self) -> Vec<bool> {
        let mut mask = vec![true; self.num_cycles];
        for violation in &self.violations {
            mask[violation.cycle] = false;
        }
        mask
    }

    #[must_use]
    pub fn invalid_cycles(&self) -> Vec<usize> {
        let mut cycles = self.violations.iter().map(|v| v.cycle).collect::<Vec<_>>();
        cycles.dedup();
        cycles
    }
}

impl CycleEngine {
    /// Detailed plausibility report for one selection.
    pub fn validation_report<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
    ) -> ValidationReport {
        let block = self.get_cycles(subject, task, features);
        let kinds = block
            .features()
            .iter()
            .map(|name| self.feature_kind(name).unwrap_or(FeatureKind::Unknown))
            .collect::<Vec<_>>();
        let report = ValidationReport::for_block(&block, &kinds, &self.config().thresholds);
        debug!(
            subject,
            task,
            cycles = report.num_cycles(),
            invalid = report.invalid_cycles().len(),
            "validated cycles"
        );
        report
    }

    /// Validity flag per cycle, empty when the selection has no data.
    pub fn validate_cycles<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
    ) -> Vec<bool> {
        self.validation_report(subject, task, features).validity_mask()
    }
}
