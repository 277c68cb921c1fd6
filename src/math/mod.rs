//! Statistical helpers for the selection filters.

/// Adjusted Fisher-Pearson sample skewness.
///
/// This matches the convention most dataframe libraries report:
///
/// `G1 = g1 * sqrt(n * (n - 1)) / (n - 2)` where `g1 = m3 / m2^(3/2)`.
///
/// Returns `None` for fewer than 3 observations or a zero-variance series,
/// where the statistic is undefined.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nf;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / nf;

    if m2 <= 0.0 {
        return None;
    }

    let g1 = m3 / m2.powf(1.5);
    let adjustment = (nf * (nf - 1.0)).sqrt() / (nf - 2.0);
    let skew = g1 * adjustment;
    if skew.is_finite() { Some(skew) } else { None }
}
