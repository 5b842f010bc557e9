//! Per-phase cross-feature correlation
//!
//! At every phase point independently, the samples of each feature across
//! cycles form one vector, and the Pearson coefficient is taken between every
//! pair of those vectors.

use gaitkit_stats::correlation::pearson;
use ndarray::{Array3, ArrayView2, ArrayView3, s};
use tracing::warn;

use crate::{
    cycle_block::CycleBlock, engine::CycleEngine, feature::FeatureSelection, outlier::MIN_CYCLES,
};

#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum PhaseCorrelations {
    /// `values[[p, i, j]]` correlates `features[i]` with `features[j]` at
    /// phase point `p`. Undefined coefficients are `NaN`.
    Matrix {
        features: Vec<String>,
        values: Array3<f64>,
    },
    /// Fewer than two cycles were available.
    InsufficientData { cycles: usize },
}

impl PhaseCorrelations {
    #[must_use]
    pub fn from_block(block: &CycleBlock) -> Self {
        if block.is_empty() || block.num_cycles() < MIN_CYCLES {
            return PhaseCorrelations::InsufficientData {
                cycles: block.num_cycles(),
            };
        }

        let (_, points, features) = block.shape();
        let mut values = Array3::from_elem((points, features, features), f64::NAN);
        for p in 0..points {
            // (cycle, feature) samples at this phase point
            let at_phase = block.values().slice_move(s![.., p, ..]);
            let columns = (0..features)
                .map(|f| at_phase.column(f).to_vec())
                .collect::<Vec<_>>();
            for i in 0..features {
                for j in i..features {
                    let r = pearson(&columns[i], &columns[j]);
                    values[[p, i, j]] = r;
                    values[[p, j, i]] = r;
                }
            }
        }
        PhaseCorrelations::Matrix {
            features: block.features().to_vec(),
            values,
        }
    }

    /// The `(phase, feature, feature)` array, if there was enough data.
    #[must_use]
    pub fn values(&self) -> Option<ArrayView3<'_, f64>> {
        match self {
            PhaseCorrelations::Matrix { values, .. } => Some(values.view()),
            PhaseCorrelations::InsufficientData { .. } => None,
        }
    }

    /// The `(feature, feature)` matrix at one phase point.
    #[must_use]
    pub fn at_phase(&self, point: usize) -> Option<ArrayView2<'_, f64>> {
        match self {
            PhaseCorrelations::Matrix { values, .. } => Some(values.slice(s![point, .., ..])),
            PhaseCorrelations::InsufficientData { .. } => None,
        }
    }

    #[must_use]
    pub fn features(&self) -> &[String] {
        match self {
            PhaseCorrelations::Matrix { features, .. } => features.as_slice(),
            PhaseCorrelations::InsufficientData { .. } => &[],
        }
    }
}

impl CycleEngine {
    /// Correlation matrices of the selected features at every phase point.
    ///
    /// Returns [`PhaseCorrelations::InsufficientData`] instead of an error
    /// when the selection has fewer than two cycles.
    pub fn phase_correlations<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
    ) -> PhaseCorrelations {
        let block = self.get_cycles(subject, task, features);
        let correlations = PhaseCorrelations::from_block(&block);
        if let PhaseCorrelations::InsufficientData { cycles } = correlations {
            // an empty selection has already been reported by get_cycles
            if cycles > 0 {
                warn!(subject, task, cycles, "not enough cycles for phase correlations");
            }
        }
        correlations
    }
}
