//! RMSE-based outlier cycles
//!
//! Each cycle is scored by its root-mean-square distance from the mean
//! pattern, pooled over every phase point and feature. A cycle is an outlier
//! when its score exceeds `mean + k * std` of all scores.

use gaitkit_stats::descriptive::{finite_mean, finite_std};
use ndarray::{Array2, Axis, s};
use tracing::warn;

use crate::{cycle_block::CycleBlock, engine::CycleEngine, feature::FeatureSelection};

/// Cycles needed before deviation statistics mean anything.
pub const MIN_CYCLES: usize = 2;

impl CycleBlock {
    /// Mean across cycles at every (phase point, feature), ignoring
    /// non-finite samples.
    #[must_use]
    pub fn mean_pattern(&self) -> Array2<f64> {
        let (_, points, features) = self.shape();
        let values = self.values();
        Array2::from_shape_fn((points, features), |(p, f)| {
            finite_mean(values.slice(s![.., p, f]).iter().copied())
        })
    }

    /// RMSE of every cycle against [`CycleBlock::mean_pattern`].
    ///
    /// Only cells where both the sample and the mean are finite count. A
    /// cycle without such cells scores `NaN`. Empty for fewer than
    /// [`MIN_CYCLES`] cycles.
    #[must_use]
    pub fn rmse_scores(&self) -> Vec<f64> {
        if self.num_cycles() < MIN_CYCLES || self.num_features() == 0 {
            return vec![];
        }
        let mean = self.mean_pattern();
        self.values()
            .axis_iter(Axis(0))
            .map(|cycle| {
                let squared = cycle
                    .iter()
                    .zip(&mean)
                    .map(|(v, m)| v - m)
                    .filter(|d| d.is_finite())
                    .map(|d| d * d);
                finite_mean(squared).sqrt()
            })
            .collect()
    }
}

/// Indices of scores above `mean + threshold_std_devs * std`.
///
/// `NaN` scores are never flagged and do not enter the mean or the standard
/// deviation.
#[must_use]
pub fn flag_outliers(scores: &[f64], threshold_std_devs: f64) -> Vec<usize> {
    if scores.len() < MIN_CYCLES {
        return vec![];
    }
    let mean = finite_mean(scores.iter().copied());
    let std = finite_std(scores.iter().copied());
    let cutoff = mean + threshold_std_devs * std;
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score > cutoff)
        .map(|(cycle, _)| cycle)
        .collect()
}

impl CycleEngine {
    /// Per-cycle RMSE from the mean pattern, empty with fewer than
    /// [`MIN_CYCLES`] cycles.
    pub fn outlier_scores<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
    ) -> Vec<f64> {
        let block = self.get_cycles(subject, task, features);
        if !block.is_empty() && block.num_cycles() < MIN_CYCLES {
            warn!(
                subject,
                task,
                cycles = block.num_cycles(),
                "not enough cycles for outlier scoring"
            );
        }
        block.rmse_scores()
    }

    /// Indices of cycles whose RMSE exceeds `mean + k * std` of all cycles.
    ///
    /// `k` is `threshold_std_devs`, or the configured
    /// [`outlier_threshold`](crate::config::EngineConfig::outlier_threshold)
    /// when `None`. Outlier detection looks at every cycle regardless of
    /// plausibility. Fewer than [`MIN_CYCLES`] cycles yield an empty list.
    pub fn find_outlier_cycles<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
        threshold_std_devs: Option<f64>,
    ) -> Vec<usize> {
        let threshold = threshold_std_devs.unwrap_or(self.config().outlier_threshold);
        flag_outliers(&self.outlier_scores(subject, task, features), threshold)
    }
}
