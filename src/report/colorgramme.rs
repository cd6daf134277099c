/// Composite colorgramme chart renderer.
///
/// Builds the 700×220 monthly chart: station info panel top-left, optional
/// logo, one-day hourly histogram bottom-left, month-by-hour heatmap with
/// scale bar on the right, and the footer website line. Pixel offsets are a
/// fixed contract with the RMOB site's expectations — change nothing here
/// without comparing output images side by side.
///
/// Rendering is write-once: `render` builds the canvas in memory, `save`
/// serializes it. Calling `save` first is an invalid-state error.

use ab_glyph::{FontVec, PxScale};
use chrono::{Datelike, NaiveDate};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::analysis::diurnal::DiurnalSession;
use crate::config::{Config, StationInfo};
use crate::logging::{self, Component};
use crate::model::{ChartKind, Period, RmobError, THRESHOLD_SENTINEL};
use crate::report::color::color_for;

const CANVAS_WIDTH: u32 = 700;
const CANVAS_HEIGHT: u32 = 220;

const FONT_SCALE: PxScale = PxScale { x: 13.0, y: 13.0 };
/// Vertical pitch between stacked info-panel lines.
const LINE_PITCH: i32 = 15;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_GRAY: Rgb<u8> = Rgb([64, 64, 64]);
const VALUE_NAVY: Rgb<u8> = Rgb([0, 0, 128]);
const TITLE_GREEN: Rgb<u8> = Rgb([0, 96, 0]);
const BAR_BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const MASKED_FILL: Rgb<u8> = Rgb([255, 192, 192]);
const MASKED_OUTLINE: Rgb<u8> = Rgb([128, 128, 128]);
const UTC_GRAY: Rgb<u8> = Rgb([32, 32, 32]);
const BRAND_BROWN: Rgb<u8> = Rgb([128, 64, 64]);

const BRAND_TEXT: &str = "www.rmob.org";

// ---------------------------------------------------------------------------
// Info-panel field formatting
// ---------------------------------------------------------------------------

/// Closed set of value-formatting strategies for info-panel fields.
/// Anything without an explicit entry renders as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldTransform {
    Identity,
    /// Append a degree symbol (azimuth, elevation).
    Degrees,
    /// One component per line with compass letters spelled out.
    LocationExpand,
}

fn transform_for(field: &str) -> FieldTransform {
    match field {
        "azimuth" | "elevation" => FieldTransform::Degrees,
        "location" => FieldTransform::LocationExpand,
        _ => FieldTransform::Identity,
    }
}

fn apply_transform(transform: FieldTransform, value: &str) -> String {
    match transform {
        FieldTransform::Identity => value.to_string(),
        FieldTransform::Degrees => format!("{}°", value),
        FieldTransform::LocationExpand => value
            .replace(' ', "\n")
            .replace('W', " West")
            .replace('E', " East")
            .replace('N', " North")
            .replace('S', " South"),
    }
}

/// Display label for an info field; defaults to the field name itself.
fn label_for(field: &str) -> &str {
    match field {
        "method" => "Obs.Method",
        "preamp" => "RF preamp.",
        other => other,
    }
}

fn info_value<'a>(info: &'a StationInfo, field: &str) -> &'a str {
    match field {
        "observer" => &info.observer,
        "country" => &info.country,
        "city" => &info.city,
        "location" => &info.location,
        "beacon" => &info.beacon,
        "frequency" => &info.frequency,
        "antenna" => &info.antenna,
        "computer" => &info.computer,
        "receiver" => &info.receiver,
        "preamp" => &info.preamp,
        "azimuth" => &info.azimuth,
        "elevation" => &info.elevation,
        "method" => &info.method,
        "website" => &info.website,
        "email" => &info.email,
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Histogram helpers
// ---------------------------------------------------------------------------

/// English ordinal suffix for a day of month (1st, 2nd, 3rd, 4th … 31st).
fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        4..=20 | 24..=30 => "th",
        d => match d % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

/// The highest in-ceiling hour of a day, used for the dashed guide line.
/// Masked (over-ceiling) hours never win the peak.
fn in_ceiling_peak(counts: &BTreeMap<u32, u32>, ceiling: f64) -> Option<(u32, u32)> {
    let mut peak: Option<(u32, u32)> = None;
    for (&hour, &count) in counts {
        if (count as f64) <= ceiling && peak.map_or(true, |(_, c)| count > c) {
            peak = Some((hour, count));
        }
    }
    peak
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

pub struct Colorgramme<'a> {
    session: &'a DiurnalSession,
    config: &'a Config,
    canvas: Option<RgbImage>,
}

impl<'a> Colorgramme<'a> {
    pub fn new(session: &'a DiurnalSession, config: &'a Config) -> Self {
        Colorgramme {
            session,
            config,
            canvas: None,
        }
    }

    /// Renders the requested chart kind into the in-memory canvas.
    pub fn render(&mut self, kind: ChartKind) -> Result<(), Box<dyn Error>> {
        match kind {
            ChartKind::Month => self.render_month(),
        }
    }

    fn render_month(&mut self) -> Result<(), Box<dyn Error>> {
        let period = self.session.last_period().ok_or(RmobError::EmptyDataset)?;

        let font_data = fs::read(&self.config.font_path)?;
        let font = FontVec::try_from_vec(font_data)?;

        let mut img = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, WHITE);

        let bottom = self.draw_info(&mut img, &font);
        if bottom < 112 {
            draw_text_mut(&mut img, BLACK, 15, 120, FONT_SCALE, &font, "Hourly count");
            draw_text_mut(&mut img, BLACK, 15, 135, FONT_SCALE, &font, "histogram");
        }
        self.draw_logo(&mut img);
        self.draw_histogram(&mut img, &font, period);
        self.draw_heatmap(&mut img, &font, period);
        self.draw_footer(&mut img, &font);

        self.canvas = Some(img);
        Ok(())
    }

    /// Ceiling above which an hour is drawn masked. Denoise off disables
    /// masking entirely.
    fn mask_ceiling(&self, period: Period) -> f64 {
        if self.config.denoise {
            self.session
                .threshold_for(period)
                .unwrap_or(THRESHOLD_SENTINEL)
        } else {
            f64::INFINITY
        }
    }

    /// Value both panels scale against: the period threshold under denoise,
    /// the observed peak otherwise. Never zero, so bar/ramp math stays
    /// finite even for an all-zero month.
    fn chart_scale(&self, period: Period) -> f64 {
        let scale = if self.config.denoise {
            self.session
                .threshold_for(period)
                .unwrap_or(THRESHOLD_SENTINEL)
        } else {
            self.session.peak_count_for(period).unwrap_or(0) as f64
        };
        if scale > 0.0 {
            scale
        } else {
            1.0
        }
    }

    // -- info panel ---------------------------------------------------------

    fn draw_info(&self, img: &mut RgbImage, font: &FontVec) -> i32 {
        let (x0, y0) = (3, 1);

        let mut y = self.draw_info_column(
            img,
            font,
            x0,
            y0,
            &["observer", "country", "city", "computer"],
            57,
        );
        y = self.draw_info_column(
            img,
            font,
            x0,
            y,
            &["antenna", "preamp", "azimuth", "elevation"],
            57,
        );
        let bottom = self.draw_info_column(img, font, x0, y, &["email"], 57);

        let y = self.draw_info_column(
            img,
            font,
            x0 + 200,
            y0,
            &["location", "beacon", "frequency", "receiver"],
            57,
        );
        self.draw_info_column(img, font, x0 + 200, y, &["method"], 75);

        bottom
    }

    fn draw_info_column(
        &self,
        img: &mut RgbImage,
        font: &FontVec,
        x: i32,
        mut y: i32,
        fields: &[&str],
        value_offset: i32,
    ) -> i32 {
        for &field in fields {
            let raw = info_value(&self.config.info, field);
            if raw.is_empty() {
                continue;
            }

            let mut label = String::new();
            let base = label_for(field);
            let mut chars = base.chars();
            if let Some(first) = chars.next() {
                label.extend(first.to_uppercase());
                label.push_str(chars.as_str());
            }
            label.push(':');
            draw_text_mut(img, LABEL_GRAY, x, y, FONT_SCALE, font, &label);

            let value = apply_transform(transform_for(field), raw);
            for line in value.split('\n') {
                draw_text_mut(img, VALUE_NAVY, x + value_offset, y, FONT_SCALE, font, line);
                y += LINE_PITCH;
            }
        }
        y
    }

    // -- logo ---------------------------------------------------------------

    /// Best-effort paste of the station logo. The logo is decorative:
    /// a missing path or undecodable file is silently skipped.
    fn draw_logo(&self, img: &mut RgbImage) {
        let logo_path = &self.config.info.logo;
        if logo_path.is_empty() {
            return;
        }
        if let Ok(logo) = image::open(logo_path) {
            imageops::overlay(img, &logo.to_rgb8(), 10, 164);
        }
    }

    // -- histogram ----------------------------------------------------------

    fn draw_histogram(&self, img: &mut RgbImage, font: &FontVec, period: Period) {
        let (x0, y0) = (120i32, 110i32);
        let ceiling = self.mask_ceiling(period);
        let scale = self.chart_scale(period);

        draw_hollow_rect_mut(img, Rect::at(x0, y0).of_size(246, 96), BLACK);

        // the most recent day of the period with aggregated data
        let target_day = self
            .session
            .diurnal()
            .keys()
            .filter(|d| Period::from_date(**d) == period)
            .max()
            .copied()
            .unwrap_or_else(|| period.first_day());

        self.draw_histogram_title(img, font, x0, y0, target_day);

        let empty = BTreeMap::new();
        let counts = self.session.counts_for(target_day).unwrap_or(&empty);
        let peak = in_ceiling_peak(counts, ceiling);

        for hour in 0..=24u32 {
            let x = x0 + 5 + hour as i32 * 10;

            // x-axis tick, with a label every 4th hour
            draw_line_segment_mut(
                img,
                (x as f32, (y0 + 94) as f32),
                (x as f32, (y0 + 97) as f32),
                BLACK,
            );
            if hour % 4 == 0 {
                let label = format!("{}h", hour);
                draw_text_mut(img, BLACK, x - 4, y0 + 98, FONT_SCALE, font, &label);
            }

            let count = match counts.get(&hour) {
                Some(&c) => c,
                None => continue,
            };

            if (count as f64) > ceiling {
                // masked: full-height bar in the denoise fill
                let rect = Rect::at(x - 3, y0 + 6).of_size(7, 90);
                draw_filled_rect_mut(img, rect, MASKED_FILL);
                draw_hollow_rect_mut(img, rect, MASKED_OUTLINE);
                continue;
            }

            let bar_height = (88.0 * count as f64 / scale).round() as i32;
            let top = y0 + 95 - bar_height;
            let rect = Rect::at(x - 3, top).of_size(7, (bar_height + 1).max(1) as u32);
            draw_filled_rect_mut(img, rect, BAR_BLUE);
            draw_hollow_rect_mut(img, rect, BLACK);

            if peak == Some((hour, count)) {
                // dashed guide from the y-axis to the peak bar
                let mut x1 = x0 - 3;
                while x1 < x - 5 {
                    draw_line_segment_mut(
                        img,
                        (x1 as f32, top as f32),
                        ((x1 + 2) as f32, top as f32),
                        BLACK,
                    );
                    x1 += 6;
                }
                let label = count.to_string();
                let (w, _) = text_size(FONT_SCALE, font, &label);
                draw_text_mut(
                    img,
                    BLACK,
                    x0 - 5 - w as i32,
                    y0 + 90 - bar_height,
                    FONT_SCALE,
                    font,
                    &label,
                );
            }
        }
    }

    fn draw_histogram_title(
        &self,
        img: &mut RgbImage,
        font: &FontVec,
        x0: i32,
        y0: i32,
        date: NaiveDate,
    ) {
        let title = format!(
            "{} {}{} {}",
            date.format("%B"),
            date.day(),
            ordinal_suffix(date.day()),
            date.year()
        );
        let (w, h) = text_size(FONT_SCALE, font, &title);
        let (w, h) = (w as i32, h as i32);
        let title_x = (x0 as f32 + 122.5 - w as f32 / 2.0) as i32;
        let title_y = y0 - h / 2;

        // white backing so the title sits on top of the panel border
        draw_filled_rect_mut(
            img,
            Rect::at(title_x - 3, title_y - 3).of_size((w + 7) as u32, (h + 7) as u32),
            WHITE,
        );
        draw_text_mut(img, TITLE_GREEN, title_x, title_y, FONT_SCALE, font, &title);
    }

    // -- heatmap ------------------------------------------------------------

    fn draw_heatmap(&self, img: &mut RgbImage, font: &FontVec, period: Period) {
        let (x0, y0) = (407i32, 15i32);
        let scale = self.chart_scale(period);

        // heatmap canvas and scale-bar canvas
        draw_filled_rect_mut(img, Rect::at(x0, y0).of_size(248, 192), BLACK);
        draw_filled_rect_mut(img, Rect::at(x0 + 250, y0).of_size(8, 192), BLACK);

        // y-axis hour ticks: full label every 6 hours and at 23, major tick
        // every 3, minor otherwise
        for hour in 0..24i32 {
            let y = y0 + hour * 8 - 2;
            if hour % 6 == 0 || hour == 23 {
                let label = format!("{}h", hour);
                let (w, _) = text_size(FONT_SCALE, font, &label);
                draw_text_mut(img, BLACK, x0 - w as i32 - 4, y, FONT_SCALE, font, &label);
            } else if hour % 3 == 0 {
                draw_line_segment_mut(
                    img,
                    ((x0 - 5) as f32, (y + 6) as f32),
                    ((x0 - 1) as f32, (y + 6) as f32),
                    BLACK,
                );
            } else {
                draw_line_segment_mut(
                    img,
                    ((x0 - 2) as f32, (y + 6) as f32),
                    ((x0 - 1) as f32, (y + 6) as f32),
                    BLACK,
                );
            }
        }

        draw_text_mut(img, UTC_GRAY, x0 - 32, y0 + 20, FONT_SCALE, font, "UTC");

        // x-axis day markers
        draw_text_mut(img, BLACK, x0 + 1, y0 - 14, FONT_SCALE, font, "1");
        draw_text_mut(img, BLACK, x0 + 15, y0 - 14, FONT_SCALE, font, "Days --->");
        draw_text_mut(img, BLACK, x0 + 111, y0 - 14, FONT_SCALE, font, "15");
        draw_text_mut(img, BLACK, x0 + 239, y0 - 14, FONT_SCALE, font, "31");

        // scale bar: the same ramp stretched over a synthetic 0–24 domain
        for hour in 0..24i32 {
            draw_filled_rect_mut(
                img,
                Rect::at(x0 + 251, 16 + hour * 8).of_size(6, 6),
                color_for(hour as f64, 24.0),
            );
        }
        draw_text_mut(img, BLACK, x0 + 260, y0 - 1, FONT_SCALE, font, "0");
        let mid = format!("{}", (scale / 2.0) as i64);
        draw_text_mut(img, BLACK, x0 + 260, y0 + 91, FONT_SCALE, font, &mid);
        let full = format!("{}", scale as i64);
        draw_text_mut(img, BLACK, x0 + 260, y0 + 182, FONT_SCALE, font, &full);

        // heatmap cells: 6×6 at an 8-unit pitch, day across, hour down
        for (date, hours) in self.session.diurnal() {
            if Period::from_date(*date) != period {
                continue;
            }
            let day = date.day() as i32;
            for (&hour, &count) in hours {
                if hour > 23 {
                    continue;
                }
                let x = x0 + day * 8 - 7;
                let y = 16 + hour as i32 * 8;
                draw_filled_rect_mut(
                    img,
                    Rect::at(x, y).of_size(6, 6),
                    color_for(count as f64, scale),
                );
            }
        }
    }

    // -- footer -------------------------------------------------------------

    /// Website (when configured) and the brand string, centered together in
    /// a 250-wide slot by measured text width.
    fn draw_footer(&self, img: &mut RgbImage, font: &FontVec) {
        let (x0, y0) = (412i32, 207i32);

        let website = if self.config.info.website.is_empty() {
            String::new()
        } else {
            format!("{}  |  ", self.config.info.website)
        };
        let website_width = if website.is_empty() {
            0
        } else {
            text_size(FONT_SCALE, font, &website).0 as i32
        };
        let brand_width = text_size(FONT_SCALE, font, BRAND_TEXT).0 as i32;

        let x = x0 + (250 - brand_width - website_width) / 2;
        if !website.is_empty() {
            draw_text_mut(img, LABEL_GRAY, x, y0, FONT_SCALE, font, &website);
        }
        draw_text_mut(img, BRAND_BROWN, x + website_width, y0, FONT_SCALE, font, BRAND_TEXT);
    }

    // -- persistence --------------------------------------------------------

    /// Serializes the rendered canvas. `path` defaults to
    /// `{outfile_prefix}_{MMYYYY}.jpg`; `.jpg` is written at quality 90.
    /// Written via a temporary sibling and renamed into place.
    pub fn save(&self, path: Option<PathBuf>) -> Result<PathBuf, Box<dyn Error>> {
        let canvas = self.canvas.as_ref().ok_or_else(|| {
            RmobError::InvalidState(
                "colorgramme must be render()ed before saving".to_string(),
            )
        })?;
        let period = self.session.last_period().ok_or(RmobError::EmptyDataset)?;

        let path = path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}_{}.jpg",
                self.config.outfile_prefix,
                period.reversed_stem()
            ))
        });

        let format = ImageFormat::from_path(&path)?;
        let tmp = path.with_extension("img.tmp");

        if format == ImageFormat::Jpeg {
            let file = fs::File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut writer, 90);
            canvas.write_with_encoder(encoder)?;
            writer.flush()?;
        } else {
            canvas.save_with_format(&tmp, format)?;
        }
        fs::rename(&tmp, &path)?;

        logging::info(
            Component::Report,
            Some(&period.file_stem()),
            &format!("wrote colorgramme {}", path.display()),
        );
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::from_toml_str(
            r#"
            datapath = "/tmp"
            outfile_prefix = "TEST"

            [info]
            observer = "A. Observer"
            location = "52 N 1 W"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_save_before_render_is_invalid_state() {
        let session = DiurnalSession::new();
        let config = test_config();
        let chart = Colorgramme::new(&session, &config);
        let err = chart.save(None).unwrap_err();
        assert!(err.to_string().contains("invalid state"));
    }

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(4), "th");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(20), "th");
        assert_eq!(ordinal_suffix(21), "st");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(23), "rd");
        assert_eq!(ordinal_suffix(24), "th");
        assert_eq!(ordinal_suffix(30), "th");
        assert_eq!(ordinal_suffix(31), "st");
    }

    #[test]
    fn test_location_expand_transform() {
        let out = apply_transform(FieldTransform::LocationExpand, "52 N 1 W");
        assert_eq!(out, "52\n North\n1\n West");
    }

    #[test]
    fn test_degree_transform() {
        assert_eq!(apply_transform(FieldTransform::Degrees, "270"), "270°");
    }

    #[test]
    fn test_field_labels() {
        assert_eq!(label_for("method"), "Obs.Method");
        assert_eq!(label_for("preamp"), "RF preamp.");
        assert_eq!(label_for("antenna"), "antenna");
    }

    #[test]
    fn test_in_ceiling_peak_skips_masked_hours() {
        let mut counts = BTreeMap::new();
        counts.insert(0u32, 5u32);
        counts.insert(1, 12);
        counts.insert(2, 999);
        assert_eq!(in_ceiling_peak(&counts, 856.0), Some((1, 12)));
        assert_eq!(in_ceiling_peak(&counts, f64::INFINITY), Some((2, 999)));
        assert_eq!(in_ceiling_peak(&BTreeMap::new(), 856.0), None);
    }
}
