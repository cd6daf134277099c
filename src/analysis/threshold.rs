/// Noise-ceiling estimation for one reporting period.
///
/// Hourly meteor counts are Poisson-like with occasional spurious spikes
/// from RF interference and false triggers. The ceiling flags outliers for
/// masking without discarding legitimate high-activity hours: one-sided at
/// mean + 1.28·sd (roughly the 90th percentile under normality), bounded by
/// the true observed maximum so it is at most a no-op when the dispersion
/// estimate pushes past the real peak.

use crate::model::RmobError;

/// Estimates the denoise threshold from one period's flattened counts.
///
/// The dispersion denominator is `n + 1` rather than `n` or `n - 1`. That is
/// statistically unconventional but intentional: RMOB output parity depends
/// on it, so it must not be "corrected".
///
/// Errors with `EmptyDataset` when `counts` is empty; callers guard periods
/// with zero usable rows before reaching this point.
pub fn estimate_threshold(counts: &[u32]) -> Result<f64, RmobError> {
    if counts.is_empty() {
        return Err(RmobError::EmptyDataset);
    }

    let n = counts.len() as f64;
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
    let sum_sq = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>();
    let sd = (sum_sq / (n + 1.0)).sqrt();
    let max = counts.iter().copied().max().unwrap_or(0) as f64;

    Ok((mean + 1.28 * sd).min(max))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
