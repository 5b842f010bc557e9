//! Per-phase patterns, range of motion and descriptive summaries
//!
//! All reductions skip non-finite samples. A reduction with no finite input
//! yields `NaN`, never zero.

use std::collections::BTreeMap;

use gaitkit_stats::{
    descriptive::{DescriptiveStats, finite_mean, finite_std},
    percentiles::Quartiles,
};
use ndarray::{ArrayView1, Axis};
use serde::Serialize;

use crate::{cycle_block::CycleBlock, engine::CycleEngine, feature::FeatureSelection};

/// How [`CycleEngine::range_of_motion`] aggregates cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RomMode {
    /// One value per cycle per feature.
    #[default]
    PerCycle,
    /// One value per feature over every cycle and phase point.
    Pooled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RangeOfMotion {
    PerCycle(BTreeMap<String, Vec<f64>>),
    Pooled(BTreeMap<String, f64>),
}

impl RangeOfMotion {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            RangeOfMotion::PerCycle(map) => map.is_empty(),
            RangeOfMotion::Pooled(map) => map.is_empty(),
        }
    }
}

/// Descriptive statistics of every finite sample of one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub q25: f64,
    pub q75: f64,
}

impl FeatureSummary {
    /// Summarizes the finite values, `None` if there are none.
    #[must_use]
    pub fn from_finite<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        let stats = DescriptiveStats::from_sorted(&sorted)?;
        let quartiles = Quartiles::from_sorted(&sorted)?;
        Some(Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            median: stats.median,
            std: stats.std_dev,
            q25: quartiles.q25,
            q75: quartiles.q75,
        })
    }
}

impl CycleBlock {
    /// Mean across cycles at every phase point, per feature.
    #[must_use]
    pub fn mean_patterns(&self) -> BTreeMap<String, Vec<f64>> {
        self.reduce_cycles(|values| finite_mean(values.iter().copied()))
    }

    /// Population standard deviation across cycles at every phase point, per
    /// feature.
    #[must_use]
    pub fn std_patterns(&self) -> BTreeMap<String, Vec<f64>> {
        self.reduce_cycles(|values| finite_std(values.iter().copied()))
    }

    /// Max minus min of every feature, per cycle or pooled.
    #[must_use]
    pub fn range_of_motion(&self, mode: RomMode) -> RangeOfMotion {
        if self.is_empty() {
            return match mode {
                RomMode::PerCycle => RangeOfMotion::PerCycle(BTreeMap::new()),
                RomMode::Pooled => RangeOfMotion::Pooled(BTreeMap::new()),
            };
        }
        let features = self.features().iter().enumerate();
        match mode {
            RomMode::PerCycle => RangeOfMotion::PerCycle(
                features
                    .map(|(f, name)| {
                        let per_cycle = (0..self.num_cycles())
                            .map(|c| finite_range(self.series(c, f).iter().copied()))
                            .collect();
                        (name.clone(), per_cycle)
                    })
                    .collect(),
            ),
            RomMode::Pooled => RangeOfMotion::Pooled(
                features
                    .map(|(f, name)| {
                        let pooled = finite_range(self.feature_values(f).iter().copied());
                        (name.clone(), pooled)
                    })
                    .collect(),
            ),
        }
    }

    /// Summary of every feature that has at least one finite sample.
    #[must_use]
    pub fn summary_statistics(&self) -> BTreeMap<String, FeatureSummary> {
        self.features()
            .iter()
            .enumerate()
            .filter_map(|(f, name)| {
                let summary = FeatureSummary::from_finite(self.feature_values(f).iter().copied())?;
                Some((name.clone(), summary))
            })
            .collect()
    }

    fn reduce_cycles<F>(&self, mut reduce: F) -> BTreeMap<String, Vec<f64>>
    where
        F: FnMut(ArrayView1<'_, f64>) -> f64,
    {
        if self.is_empty() {
            return BTreeMap::new();
        }
        self.features()
            .iter()
            .enumerate()
            .map(|(f, name)| {
                let pattern = self
                    .feature_values(f)
                    .axis_iter(Axis(1))
                    .map(&mut reduce)
                    .collect();
                (name.clone(), pattern)
            })
            .collect()
    }
}

/// Max minus min of the finite values, `NaN` if there are none.
fn finite_range<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .map_or(f64::NAN, |(lo, hi)| hi - lo)
}

impl CycleEngine {
    /// Per-phase mean of each feature across the cycles of one selection.
    ///
    /// Each vector has `points_per_cycle` entries. Returns an empty map when
    /// [`CycleEngine::get_cycles`] has nothing for the selection.
    pub fn mean_patterns<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
    ) -> BTreeMap<String, Vec<f64>> {
        self.get_cycles(subject, task, features).mean_patterns()
    }

    /// Per-phase population standard deviation of each feature.
    ///
    /// A selection with a single cycle yields all-zero vectors.
    pub fn std_patterns<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
    ) -> BTreeMap<String, Vec<f64>> {
        self.get_cycles(subject, task, features).std_patterns()
    }

    pub fn range_of_motion<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
        mode: RomMode,
    ) -> RangeOfMotion {
        self.get_cycles(subject, task, features).range_of_motion(mode)
    }

    pub fn summary_statistics<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
    ) -> BTreeMap<String, FeatureSummary> {
        self.get_cycles(subject, task, features).summary_statistics()
    }
}
