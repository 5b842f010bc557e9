//! Three-axis cycle blocks
//!
//! A [`CycleBlock`] holds the samples of one (subject, task) selection as
//! `(cycle, phase point, feature)`:
//!
//! - axis 0 follows the order in which cycles appear in the source table
//! - axis 1 index `i` is phase position `i / (points_per_cycle - 1)`
//! - axis 2 follows [`CycleBlock::features`]
//!
//! Blocks handed out by the engine are shared with its cache through an
//! `Arc`, so they are read-only by construction.

use ndarray::{Array2, Array3, ArrayView1, ArrayView2, ArrayView3, s};

#[derive(Debug, Clone, PartialEq)]
pub struct CycleBlock {
    values: Array3<f64>,
    features: Vec<String>,
}

impl CycleBlock {
    /// The "no data" block: zero cycles, zero features.
    #[must_use]
    pub fn empty(points_per_cycle: usize) -> Self {
        Self {
            values: Array3::zeros((0, points_per_cycle, 0)),
            features: vec![],
        }
    }

    /// Reshapes `rows` of a table into cycles.
    ///
    /// `rows` must list `num_cycles * points_per_cycle` source row indices in
    /// cycle-major order: each consecutive run of `points_per_cycle` rows is
    /// one cycle. `columns[j]` is the full numeric column of `features[j]`.
    ///
    /// # Panics
    ///
    /// Panics if `rows.len()` is not a multiple of `points_per_cycle`, or
    /// `columns` and `features` differ in length.
    #[must_use]
    pub fn from_rows(
        rows: &[usize],
        points_per_cycle: usize,
        features: Vec<String>,
        columns: &[&[f64]],
    ) -> Self {
        assert!(points_per_cycle > 0, "points_per_cycle must be positive");
        assert_eq!(rows.len() % points_per_cycle, 0, "partial cycle in rows");
        assert_eq!(features.len(), columns.len(), "one column per feature");

        let num_cycles = rows.len() / points_per_cycle;
        let values = Array3::from_shape_fn(
            (num_cycles, points_per_cycle, features.len()),
            |(cycle, point, feature)| columns[feature][rows[cycle * points_per_cycle + point]],
        );
        Self { values, features }
    }

    #[must_use]
    pub fn num_cycles(&self) -> usize {
        self.values.dim().0
    }

    #[must_use]
    pub fn points_per_cycle(&self) -> usize {
        self.values.dim().1
    }

    #[must_use]
    pub fn num_features(&self) -> usize {
        self.values.dim().2
    }

    /// `(cycles, points_per_cycle, features)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_cycles() == 0 || self.num_features() == 0
    }

    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    #[must_use]
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f == name)
    }

    #[must_use]
    pub fn values(&self) -> ArrayView3<'_, f64> {
        self.values.view()
    }

    /// One cycle as `(phase point, feature)`.
    #[must_use]
    pub fn cycle(&self, cycle: usize) -> ArrayView2<'_, f64> {
        self.values.slice(s![cycle, .., ..])
    }

    /// Phase series of one feature within one cycle.
    #[must_use]
    pub fn series(&self, cycle: usize, feature: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![cycle, .., feature])
    }

    /// All cycles of one feature as `(cycle, phase point)`.
    #[must_use]
    pub fn feature_values(&self, feature: usize) -> ArrayView2<'_, f64> {
        self.values.slice(s![.., .., feature])
    }

    /// Undoes the reshape: `(cycles * points_per_cycle, features)` in the
    /// original row order.
    #[must_use]
    pub fn flatten(&self) -> Array2<f64> {
        let (cycles, points, features) = self.values.dim();
        Array2::from_shape_fn((cycles * points, features), |(row, feature)| {
            self.values[[row / points, row % points, feature]]
        })
    }

    /// Copy of the block with axis 2 reordered to `order`.
    ///
    /// Returns `None` if `order` names a feature the block does not hold.
    #[must_use]
    pub fn reordered(&self, order: &[String]) -> Option<Self> {
        let indices = order
            .iter()
            .map(|name| self.feature_index(name))
            .collect::<Option<Vec<_>>>()?;
        let (cycles, points, _) = self.values.dim();
        let values = Array3::from_shape_fn((cycles, points, indices.len()), |(c, p, f)| {
            self.values[[c, p, indices[f]]]
        });
        Some(Self {
            values,
            features: order.to_vec(),
        })
    }
}
