/// Command-line entry point for the RMOB report service.
///
/// Thin wrapper: parse arguments, load configuration, then either run one
/// generation cycle or enter the watch loop.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use rmob_service::config::Config;
use rmob_service::logging::{self, Component, LogLevel};
use rmob_service::model::{ChartKind, Period};
use rmob_service::pipeline::{current_period, generate};
use rmob_service::watch::watch_and_regenerate;

#[derive(Parser, Debug)]
#[command(name = "rmob_service", about = "RMOB meteor-scatter report generator")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "rmob.toml")]
    config: PathBuf,

    /// Reporting period as YYYYMM; defaults to the current month.
    #[arg(short, long)]
    month: Option<String>,

    /// Chart kind to render (only "month" is implemented).
    #[arg(long, default_value = "month")]
    chart: String,

    /// Watch the observation-log directory and regenerate on change.
    #[arg(short, long)]
    watch: bool,

    /// Append log output to this file in addition to the console.
    #[arg(long)]
    log_file: Option<String>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_month(s: &str) -> Result<Period, String> {
    if s.len() != 6 || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("expected YYYYMM, got {:?}", s));
    }
    let year: i32 = s[..4].parse().map_err(|_| format!("bad year in {:?}", s))?;
    let month: u32 = s[4..].parse().map_err(|_| format!("bad month in {:?}", s))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month out of range in {:?}", s));
    }
    Ok(Period { year, month })
}

fn main() -> ExitCode {
    let args = Args::parse();

    let min_level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    logging::init_logger(min_level, args.log_file.as_deref());

    // Validate the chart kind up front; only the monthly colorgramme exists.
    if let Err(e) = ChartKind::parse(&args.chart) {
        logging::error(Component::System, None, &e.to_string());
        return ExitCode::FAILURE;
    }

    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            logging::error(
                Component::System,
                None,
                &format!("failed to load {}: {}", args.config.display(), e),
            );
            return ExitCode::FAILURE;
        }
    };

    let period = match args.month.as_deref().map(parse_month) {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            logging::error(Component::System, None, &e);
            return ExitCode::FAILURE;
        }
        None => current_period(),
    };

    if args.watch {
        if let Err(e) = watch_and_regenerate(&config) {
            logging::error(Component::Watch, None, &format!("watch loop failed: {}", e));
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    match generate(&config, period) {
        Ok((txt, img)) => {
            logging::info(
                Component::System,
                None,
                &format!("artifacts: {} {}", txt.display(), img.display()),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::error(Component::System, None, &format!("generation failed: {}", e));
            ExitCode::FAILURE
        }
    }
}
