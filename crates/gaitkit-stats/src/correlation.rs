/// Pearson correlation coefficient over the pairs where both values are finite.
///
/// Returns `NaN` when fewer than two complete pairs remain or when either
/// side has zero variance, since the coefficient is undefined there.
///
/// # Examples
///
/// ```
/// use gaitkit_stats::correlation::pearson;
///
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [2.0, 4.0, 6.0, 8.0];
/// assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
///
/// let flat = [5.0, 5.0, 5.0, 5.0];
/// assert!(pearson(&x, &flat).is_nan());
/// ```
///
/// # Panics
///
/// Panics if `x` and `y` differ in length.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "pearson inputs must have equal length");

    let pairs = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect::<Vec<_>>();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let scale_x = pairs.iter().fold(0.0, |acc: f64, (a, _)| acc.max(a.abs()));
    let scale_y = pairs.iter().fold(0.0, |acc: f64, (_, b)| acc.max(b.abs()));
    if is_flat(var_x, scale_x, n) || is_flat(var_y, scale_y, n) {
        return f64::NAN;
    }
    (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

/// Whether a sum of squared deviations is within rounding noise of zero for
/// `n` values of magnitude up to `scale`.
fn is_flat(sum_sq: f64, scale: f64, n: f64) -> bool {
    let noise = 4.0 * f64::EPSILON * scale;
    sum_sq <= n * noise * noise
}
