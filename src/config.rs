/// Service configuration and station profile.
///
/// Loaded from a TOML file (default `rmob.toml`). The `[info]` table holds
/// the free-text station description fields that end up in the text report's
/// metadata block and the colorgramme's info panel. Missing fields are
/// normalized to empty strings so downstream formatting never branches on
/// presence.
///
/// The station's location string encodes latitude/longitude in
/// degrees-minutes-seconds with hemisphere letters (`"52 N 1 W"`,
/// `"5130N 00057W"`); coordinates are split out and converted to signed
/// decimal degrees at load time.

use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::model::RmobError;

/// Version tag written into the text report's `[Soft FTP]` line.
pub const GENERATOR_VERSION: &str = concat!("rmob_service v", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Configuration tables
// ---------------------------------------------------------------------------

/// Free-text station description fields from the `[info]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StationInfo {
    pub observer: String,
    pub country: String,
    pub city: String,
    pub location: String,
    pub beacon: String,
    pub frequency: String,
    pub antenna: String,
    pub computer: String,
    pub receiver: String,
    pub preamp: String,
    pub azimuth: String,
    pub elevation: String,
    pub method: String,
    pub website: String,
    pub email: String,
    pub logo: String,
}

/// `[upload]` table. Transfer is a collaborator concern; the pipeline only
/// hands over finished artifact paths.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub enabled: bool,
    /// Base URL the artifact filenames are appended to.
    pub url: String,
}

/// `[watch]` table for the polling regeneration loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between observation-log mtime polls.
    pub poll_secs: u64,
    /// Number of poll ticks to hold off after a regeneration before a new
    /// change may trigger another one.
    pub cooldown_ticks: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            poll_secs: 10,
            cooldown_ticks: 6,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    datapath: String,
    outfile_prefix: String,
    #[serde(default = "default_denoise")]
    denoise: bool,
    #[serde(default = "default_font_path")]
    font_path: String,
    #[serde(default)]
    info: StationInfo,
    #[serde(default)]
    upload: UploadConfig,
    #[serde(default)]
    watch: WatchConfig,
}

fn default_denoise() -> bool {
    true
}

fn default_font_path() -> String {
    "resources/ubuntu.ttf".to_string()
}

/// Fully loaded configuration with derived coordinate fields.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the `RMOB-YYYYMM.dat` observation logs.
    pub datapath: String,
    /// Filename prefix for both generated artifacts.
    pub outfile_prefix: String,
    /// When false, over-threshold counts are reported raw instead of masked.
    pub denoise: bool,
    /// TrueType font used by the colorgramme renderer.
    pub font_path: String,
    pub info: StationInfo,
    pub upload: UploadConfig,
    pub watch: WatchConfig,
    /// Latitude half of the location string, e.g. `"52 N"`.
    pub lat: String,
    /// Longitude half of the location string, e.g. `"1 W"`.
    pub lng: String,
    /// Signed decimal degrees (south/west negative).
    pub lat_dec: f64,
    pub lng_dec: f64,
}

impl Config {
    /// Loads and finalizes a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Config::from_toml_str(&text)
    }

    /// Parses a configuration from TOML text. Split out from `load` so
    /// tests can build configs without touching the filesystem.
    pub fn from_toml_str(text: &str) -> Result<Config, Box<dyn Error>> {
        let raw: RawConfig = toml::from_str(text)?;
        let (lat, lng) = parse_location(&raw.info.location)?;
        let lat_dec = dms_to_decimal(&lat)?;
        let lng_dec = dms_to_decimal(&lng)?;
        Ok(Config {
            datapath: raw.datapath,
            outfile_prefix: raw.outfile_prefix,
            denoise: raw.denoise,
            font_path: raw.font_path,
            info: raw.info,
            upload: raw.upload,
            watch: raw.watch,
            lat,
            lng,
            lat_dec,
            lng_dec,
        })
    }
}

// ---------------------------------------------------------------------------
// Coordinate parsing
// ---------------------------------------------------------------------------

fn is_hemisphere(c: char) -> bool {
    matches!(c, 'N' | 'S' | 'E' | 'W' | 'n' | 's' | 'e' | 'w')
}

/// Splits a location string into its latitude and longitude halves.
///
/// Each half is a run of numeric D/M/S components terminated by a hemisphere
/// letter; the letter may be attached to the last number (`"52N"`) or stand
/// alone (`"52 N"`). Component order within the string is free — the N/S
/// half is always returned first.
pub fn parse_location(location: &str) -> Result<(String, String), RmobError> {
    let bad = || RmobError::BadLocation(location.to_string());

    let mut groups: Vec<(String, char)> = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for token in location.split_whitespace() {
        let last = match token.chars().last() {
            Some(c) => c,
            None => continue,
        };
        if is_hemisphere(last) && token.len() > 1 {
            // attached hemisphere letter, e.g. "52N"
            pending.push(token[..token.len() - 1].to_string());
            groups.push((pending.join(" "), last.to_ascii_uppercase()));
            pending.clear();
        } else if is_hemisphere(last) && token.len() == 1 {
            if pending.is_empty() {
                return Err(bad());
            }
            groups.push((pending.join(" "), last.to_ascii_uppercase()));
            pending.clear();
        } else {
            pending.push(token.to_string());
        }
    }

    if groups.len() != 2 || !pending.is_empty() {
        return Err(bad());
    }

    let lat_first = matches!(groups[0].1, 'N' | 'S');
    let (lat, lng) = if lat_first {
        (groups[0].clone(), groups[1].clone())
    } else {
        (groups[1].clone(), groups[0].clone())
    };
    if !matches!(lat.1, 'N' | 'S') || !matches!(lng.1, 'E' | 'W') {
        return Err(bad());
    }

    Ok((
        format!("{} {}", lat.0, lat.1),
        format!("{} {}", lng.0, lng.1),
    ))
}

/// Converts a DMS string with hemisphere letter to signed decimal degrees.
///
/// Components are whitespace/punctuation separated in D M S fractional-S
/// order; missing minutes and seconds default to zero. South and west
/// hemispheres negate the result.
pub fn dms_to_decimal(dms: &str) -> Result<f64, RmobError> {
    let compact: String = dms.chars().filter(|c| !c.is_whitespace()).collect();
    let sign = if compact.chars().any(|c| matches!(c, 's' | 'S' | 'w' | 'W')) {
        -1.0
    } else {
        1.0
    };

    let numbers: Vec<&str> = compact
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .take(4)
        .collect();

    let degree: f64 = numbers
        .first()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RmobError::BadLocation(dms.to_string()))?;
    let minute: f64 = numbers.get(1).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    let second: f64 = numbers.get(2).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    let frac: f64 = numbers
        .get(3)
        .and_then(|s| format!("0.{}", s).parse().ok())
        .unwrap_or(0.0);

    Ok(sign * (degree + minute / 60.0 + (second + frac) / 3600.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
