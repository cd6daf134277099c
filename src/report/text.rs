/// Fixed-width RMOB text table exporter.
///
/// Produces the `{prefix}_{MMYYYY}rmob.TXT` artifact: a month-long diurnal
/// table (one row per calendar day, one 4-wide cell per hour) followed by
/// the station metadata block. Hours with no data and — when denoise
/// masking is on — counts above the period's noise ceiling render as the
/// `"??? "` placeholder, never as a numeric cell.
///
/// The metadata field order (including the `[Latitude ]` label's trailing
/// space) is part of the RMOB ingestion contract and must not be tidied.

use chrono::NaiveDate;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use crate::analysis::diurnal::DiurnalSession;
use crate::config::{Config, GENERATOR_VERSION};
use crate::logging::{self, Component};
use crate::model::{Period, THRESHOLD_SENTINEL};

/// Renders and writes the text report for one period.
///
/// `path` defaults to `{outfile_prefix}_{MMYYYY}rmob.TXT`. The file is
/// written to a temporary sibling and renamed into place so a failed export
/// never leaves a truncated artifact behind.
pub fn export_text(
    session: &DiurnalSession,
    period: Period,
    config: &Config,
    path: Option<PathBuf>,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = path.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}_{}rmob.TXT",
            config.outfile_prefix,
            period.reversed_stem()
        ))
    });

    let body = render_text(session, period, config);

    let tmp = path.with_extension("TXT.tmp");
    fs::write(&tmp, &body)?;
    fs::rename(&tmp, &path)?;

    logging::info(
        Component::Report,
        Some(&period.file_stem()),
        &format!("wrote text report {}", path.display()),
    );
    Ok(path)
}

/// Renders the full report body. Split from `export_text` so tests can
/// check the exact format without going through the filesystem.
pub fn render_text(session: &DiurnalSession, period: Period, config: &Config) -> String {
    let mut out = String::new();
    let info = &config.info;

    // header: lowercase month abbreviation + 24 hour-column labels
    let month_abbr = period.first_day().format("%b").to_string().to_lowercase();
    out.push_str(&month_abbr);
    out.push('|');
    for h in 0..24 {
        out.push_str(&format!(" {:02}h|", h));
    }
    out.push('\n');

    // With denoise off the sentinel disables masking; missing hours still
    // render the placeholder.
    let threshold = if config.denoise {
        session.threshold_for(period).unwrap_or(THRESHOLD_SENTINEL)
    } else {
        THRESHOLD_SENTINEL
    };

    for day in 1..=period.days_in_month() {
        let date = NaiveDate::from_ymd_opt(period.year, period.month, day);
        let counts = date.and_then(|d| session.counts_for(d));

        out.push_str(&format!(" {:02}|", day));
        for h in 0..24u32 {
            match counts.and_then(|c| c.get(&h)) {
                Some(&count) if (count as f64) <= threshold => {
                    out.push_str(&format!("{:<4}|", format!("{:03}", count)));
                }
                _ => out.push_str("??? |"),
            }
        }
        out.push('\n');
    }

    out.push_str(&format!("[Observer]{}\n", info.observer));
    out.push_str(&format!("[Country]{}\n", info.country));
    out.push_str(&format!("[City]{}\n", info.city));
    out.push_str(&format!("[Longitude]{}\n", config.lng));
    out.push_str(&format!("[Latitude ]{}\n", config.lat));
    out.push_str(&format!("[Longitude GMAP]{}\n", format_coord(config.lng_dec)));
    out.push_str(&format!("[Latitude GMAP]{}\n", format_coord(config.lat_dec)));
    out.push_str(&format!("[Frequencies]{}\n", info.frequency));
    out.push_str(&format!("[Antenna]{}\n", info.antenna));
    out.push_str(&format!("[Pre-Amplifier]{}\n", info.preamp));
    out.push_str(&format!("[Receiver]{}\n", info.receiver));
    out.push_str(&format!("[Observing Method]{}\n", info.method));
    out.push_str(&format!("[Remarks]{}\n", info.computer));
    out.push_str(&format!("[Soft FTP]{}\n", GENERATOR_VERSION));
    out.push_str(&format!("[E]{}\n", info.email));

    out
}

/// Decimal-degree rendering for the GMAP lines. Whole-degree values keep an
/// explicit fractional part (`52.0`, `-1.0`), matching what RMOB ingest has
/// always been fed.
fn format_coord(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
