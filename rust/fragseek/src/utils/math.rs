/// Natural log of `n!`.
///
/// Exact summation for small `n`, Stirling's series above that.
///
/// ```
/// use fragseek::utils::math::lnfact;
///
/// assert_eq!(lnfact(0), 0.0);
/// assert_eq!(lnfact(1), 0.0);
/// assert!((lnfact(5) - 120f64.ln()).abs() < 1e-10);
/// ```
pub fn lnfact(n: u16) -> f64 {
    if n <= 32 {
        return (2..=n).map(|k| (k as f64).ln()).sum();
    }
    let n = n as f64;
    n * n.ln() - n + 0.5 * (std::f64::consts::TAU * n).ln() + 1.0 / (12.0 * n)
}

/// Median of a slice, `None` when empty. NaN values sort last.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
