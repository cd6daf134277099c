/// End-to-end generation pipeline.
///
/// One invocation runs the whole synchronous chain for a single reporting
/// period: read the observation log, aggregate it, estimate the noise
/// ceiling, export the text table, render and save the colorgramme, then
/// hand both artifact paths to the upload collaborator. Any fatal error
/// aborts the cycle; atomic writes in the exporters guarantee no partial
/// artifact is left behind.

use chrono::Utc;
use std::error::Error;
use std::path::PathBuf;

use crate::analysis::diurnal::DiurnalSession;
use crate::config::Config;
use crate::ingest::logfile;
use crate::logging::{self, Component};
use crate::model::{ChartKind, Period};
use crate::report::colorgramme::Colorgramme;
use crate::report::text::export_text;
use crate::upload::upload_artifacts;

/// The period a zero-argument invocation operates on: the current month.
pub fn current_period() -> Period {
    Period::from_date(Utc::now().date_naive())
}

/// Runs the full pipeline for one period and returns the two artifact
/// paths (text report, colorgramme image).
pub fn generate(config: &Config, period: Period) -> Result<(PathBuf, PathBuf), Box<dyn Error>> {
    let stem = period.file_stem();
    logging::info(Component::System, Some(&stem), "generation cycle started");

    let rows = logfile::read_period_rows(&config.datapath, period)?;
    logging::debug(
        Component::Ingest,
        Some(&stem),
        &format!("read {} raw rows", rows.len()),
    );

    let mut session = DiurnalSession::new();
    let threshold = session.extend(period, &rows)?;
    logging::info(
        Component::Analysis,
        Some(&stem),
        &format!("noise ceiling estimated at {:.2}", threshold),
    );

    let txt_path = export_text(&session, period, config, None)?;

    let mut chart = Colorgramme::new(&session, config);
    chart.render(ChartKind::Month)?;
    let img_path = chart.save(None)?;

    if config.upload.enabled {
        upload_artifacts(&config.upload, &[&txt_path, &img_path])?;
    }

    logging::info(Component::System, Some(&stem), "generation cycle finished");
    Ok((txt_path, img_path))
}
