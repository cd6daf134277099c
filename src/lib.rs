/// RMOB meteor-scatter report generation service.
///
/// Ingests monthly meteor-scatter observation logs, aggregates per-hour
/// detection counts, estimates a statistical noise ceiling for denoise
/// masking, and produces the two RMOB reporting artifacts: the fixed-width
/// text table and the colorgramme chart. Optionally watches the log
/// directory and regenerates on change, then hands finished artifacts to
/// the upload collaborator.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod upload;
pub mod watch;

pub use analysis::diurnal::DiurnalSession;
pub use analysis::threshold::estimate_threshold;
pub use config::Config;
pub use model::{ChartKind, Period, RmobError};
pub use pipeline::generate;
pub use report::colorgramme::Colorgramme;
