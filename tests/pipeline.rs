//! End-to-end pipeline integration tests.
//!
//! Exercise the chain from a raw observation log on disk through
//! aggregation, threshold estimation, text-report export, and colorgramme
//! rendering. The render tests load the font fixture shipped under
//! `tests/fixtures/` so the full pixel path runs without a system font.

use std::fs;
use std::io::Write;

use rmob_service::config::Config;
use rmob_service::ingest::logfile;
use rmob_service::model::{ChartKind, Period, RmobError};
use rmob_service::report::color::color_for;
use rmob_service::report::text::export_text;
use rmob_service::{Colorgramme, DiurnalSession};

/// Real font shipped with the test suite so the render path runs anywhere.
const FIXTURE_FONT: &str = "tests/fixtures/DejaVuSans.ttf";

fn write_log(dir: &std::path::Path, name: &str, lines: &[&str]) {
    let mut f = fs::File::create(dir.join(name)).unwrap();
    for line in lines {
        writeln!(f, "{}", line).unwrap();
    }
}

fn config_for(dir: &std::path::Path) -> Config {
    Config::from_toml_str(&format!(
        r#"
        datapath = "{}"
        outfile_prefix = "{}"
        font_path = "{FIXTURE_FONT}"

        [info]
        observer = "A. Observer"
        country = "UK"
        city = "Testington"
        location = "52 N 1 W"
        frequency = "143.05 MHz"
        antenna = "3-el Yagi"
        receiver = "RTL-SDR"
        method = "SpecLab auto-count"
        email = "obs@example.org"
        "#,
        dir.display().to_string().replace('\\', "/"),
        dir.join("TEST").display().to_string().replace('\\', "/"),
    ))
    .unwrap()
}

#[test]
fn test_log_to_text_report() {
    let dir = tempfile::tempdir().unwrap();
    let period = Period { year: 2023, month: 1 };
    write_log(
        dir.path(),
        "RMOB-202301.dat",
        &[
            "20230101000000,00,5",
            "20230101000000,01,12",
            "20230101000000,02,999",
            "20230115000000,10,8",
            "this row is garbage",
        ],
    );
    let config = config_for(dir.path());

    let rows = logfile::read_period_rows(&config.datapath, period).unwrap();
    let mut session = DiurnalSession::new();
    let threshold = session.extend(period, &rows).unwrap();
    assert!(threshold < 999.0);

    let path = export_text(&session, period, &config, None).unwrap();
    assert!(path.to_string_lossy().ends_with("_012023rmob.TXT"));

    let body = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = body.lines().collect();

    // header + 31 days + 15 metadata lines
    assert_eq!(lines.len(), 1 + 31 + 15);
    assert!(lines[0].starts_with("jan|"));

    // day 1: in-threshold counts numeric, the 999 spike masked
    assert!(lines[1].starts_with(" 01|005 |012 |??? |"));
    // day 15 carries its single hour-10 reading
    let day15: Vec<&str> = lines[15][4..].split_terminator('|').collect();
    assert_eq!(day15[10], "008 ");
    // untouched day is all placeholders
    assert_eq!(lines[20], format!(" 20|{}", "??? |".repeat(24)));

    assert!(body.contains("[Observer]A. Observer"));
    assert!(body.contains("[Latitude ]52 N"));
    assert!(body.contains("[Longitude GMAP]-1.0"));
}

#[test]
fn test_empty_log_fails_before_export() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "RMOB-202301.dat", &["", "no,usable"]);
    let config = config_for(dir.path());
    let period = Period { year: 2023, month: 1 };

    let rows = logfile::read_period_rows(&config.datapath, period).unwrap();
    let mut session = DiurnalSession::new();
    let err = session.extend(period, &rows).unwrap_err();
    assert_eq!(err, RmobError::EmptyDataset);
}

#[test]
fn test_save_requires_render() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "RMOB-202301.dat", &["20230101000000,00,5"]);
    let config = config_for(dir.path());
    let period = Period { year: 2023, month: 1 };

    let rows = logfile::read_period_rows(&config.datapath, period).unwrap();
    let mut session = DiurnalSession::new();
    session.extend(period, &rows).unwrap();

    let chart = Colorgramme::new(&session, &config);
    let err = chart.save(None).unwrap_err();
    assert!(err.to_string().contains("render"));
}

#[test]
fn test_render_and_jpeg_save_produce_canvas_sized_image() {
    let dir = tempfile::tempdir().unwrap();
    assert!(std::path::Path::new(FIXTURE_FONT).exists());
    let period = Period { year: 2023, month: 1 };
    write_log(
        dir.path(),
        "RMOB-202301.dat",
        &[
            "20230101000000,00,5",
            "20230101000000,01,12",
            "20230101000000,02,999",
        ],
    );
    let config = config_for(dir.path());

    let rows = logfile::read_period_rows(&config.datapath, period).unwrap();
    let mut session = DiurnalSession::new();
    session.extend(period, &rows).unwrap();

    let mut chart = Colorgramme::new(&session, &config);
    chart.render(ChartKind::Month).unwrap();
    let path = chart.save(Some(dir.path().join("out.jpg"))).unwrap();

    // the jpg is decodable and exactly canvas-sized
    let img = image::open(&path).unwrap();
    assert_eq!(img.width(), 700);
    assert_eq!(img.height(), 220);
    assert!(!dir.path().join("out.img.tmp").exists());
}

#[test]
fn test_render_heatmap_cells_and_masking() {
    let dir = tempfile::tempdir().unwrap();
    let period = Period { year: 2023, month: 1 };
    write_log(
        dir.path(),
        "RMOB-202301.dat",
        &[
            "20230101000000,00,5",
            "20230101000000,01,12",
            "20230101000000,02,999",
        ],
    );
    let config = config_for(dir.path());

    let rows = logfile::read_period_rows(&config.datapath, period).unwrap();
    let mut session = DiurnalSession::new();
    let threshold = session.extend(period, &rows).unwrap();

    let mut chart = Colorgramme::new(&session, &config);
    chart.render(ChartKind::Month).unwrap();
    // png keeps pixels exact, so cell colors can be asserted directly
    let path = chart.save(Some(dir.path().join("out.png"))).unwrap();
    let img = image::open(&path).unwrap().to_rgb8();

    // day-1 cells start at x=408; hour rows are 8px apart from y=16
    assert_eq!(img.get_pixel(408, 16), &color_for(5.0, threshold));
    assert_eq!(img.get_pixel(408, 24), &color_for(12.0, threshold));
    // the 999 spike exceeds the ceiling → masked gray
    assert_eq!(img.get_pixel(408, 32), &image::Rgb([128, 128, 128]));
    // a day with no data keeps the heatmap canvas black
    assert_eq!(img.get_pixel(416, 16), &image::Rgb([0, 0, 0]));
}

#[test]
fn test_render_with_no_data_in_target_month_is_empty_not_error() {
    let dir = tempfile::tempdir().unwrap();
    // rows dated outside the aggregated period: the session has a threshold
    // but no diurnal entries inside the month being charted
    let period = Period { year: 2023, month: 1 };
    write_log(dir.path(), "RMOB-202301.dat", &["20230215000000,00,5"]);
    let config = config_for(dir.path());

    let rows = logfile::read_period_rows(&config.datapath, period).unwrap();
    let mut session = DiurnalSession::new();
    session.extend(period, &rows).unwrap();

    let mut chart = Colorgramme::new(&session, &config);
    chart.render(ChartKind::Month).unwrap();
    let path = chart.save(Some(dir.path().join("empty.png"))).unwrap();
    let img = image::open(&path).unwrap().to_rgb8();

    assert_eq!(img.dimensions(), (700, 220));
    // heatmap canvas exists but no cell is colored
    assert_eq!(img.get_pixel(408, 16), &image::Rgb([0, 0, 0]));
    assert_eq!(img.get_pixel(520, 100), &image::Rgb([0, 0, 0]));
    // histogram interior stays white: no bars for an empty day
    assert_eq!(img.get_pixel(200, 180), &image::Rgb([255, 255, 255]));
}

#[test]
fn test_reaggregation_is_idempotent_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let period = Period { year: 2023, month: 1 };
    write_log(
        dir.path(),
        "RMOB-202301.dat",
        &["20230101000000,00,5", "20230102000000,01,12"],
    );
    let config = config_for(dir.path());

    let rows = logfile::read_period_rows(&config.datapath, period).unwrap();
    let mut session = DiurnalSession::new();
    session.extend(period, &rows).unwrap();
    let first = export_text(&session, period, &config, None).unwrap();
    let first_body = fs::read_to_string(&first).unwrap();

    session.extend(period, &rows).unwrap();
    let second = export_text(&session, period, &config, None).unwrap();
    let second_body = fs::read_to_string(&second).unwrap();

    assert_eq!(first_body, second_body);
}
