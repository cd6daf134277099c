/// Statistical aggregation for the RMOB pipeline.
///
/// Submodules:
/// - `diurnal` — per-date, per-hour count aggregation and date-range tracking.
/// - `threshold` — the noise-ceiling estimator used for denoise masking.

pub mod diurnal;
pub mod threshold;
