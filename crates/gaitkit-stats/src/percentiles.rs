//! Nearest-rank percentiles and quartiles

/// Lower quartile, median and upper quartile of a sample.
///
/// # Examples
///
/// ```
/// use gaitkit_stats::percentiles::Quartiles;
///
/// let q = Quartiles::from_finite([5.0, 1.0, f64::NAN, 4.0, 2.0, 3.0]).unwrap();
/// assert_eq!((q.q25, q.q50, q.q75), (2.0, 3.0, 4.0));
/// assert_eq!(q.iqr(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
}

impl Quartiles {
    /// Quartiles of the finite values, `None` if there are none.
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
        Self::from_sorted(&sorted)
    }

    /// Quartiles of values already sorted in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );
        if sorted_values.is_empty() {
            return None;
        }
        Some(Self {
            q25: nearest_rank(sorted_values, 25.0),
            q50: nearest_rank(sorted_values, 50.0),
            q75: nearest_rank(sorted_values, 75.0),
        })
    }

    /// Interquartile range.
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q75 - self.q25
    }
}

/// Value at `percentile` (0 to 100) of ascending `sorted_values`.
///
/// Nearest-rank without interpolation: the value at index
/// `floor(n * percentile / 100)`, clamped to the last element. An empty
/// slice yields `NaN`.
///
/// ```
/// use gaitkit_stats::percentiles::nearest_rank;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(nearest_rank(&values, 50.0), 3.0);
/// assert_eq!(nearest_rank(&values, 25.0), 2.0);
/// assert_eq!(nearest_rank(&values, 100.0), 5.0);
/// assert!(nearest_rank(&[], 50.0).is_nan());
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn nearest_rank(sorted_values: &[f64], percentile: f64) -> f64 {
    let Some(last) = sorted_values.len().checked_sub(1) else {
        return f64::NAN;
    };
    let rank = (sorted_values.len() as f64 * percentile.clamp(0.0, 100.0) / 100.0) as usize;
    sorted_values[rank.min(last)]
}
