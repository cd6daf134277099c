/// Core data types for the RMOB report generation service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no rendering logic — only types and the calendar
/// arithmetic they need.

use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// Sentinels
// ---------------------------------------------------------------------------

/// Threshold used when no noise ceiling exists for a period.
/// Effectively disables denoise masking rather than failing the export.
pub const THRESHOLD_SENTINEL: f64 = 999_999.0;

// ---------------------------------------------------------------------------
// Reporting period
// ---------------------------------------------------------------------------

/// One calendar month of observations.
///
/// Periods are keyed throughout the service by the ordinal day number of
/// their first day (`ordinal()`): days counted from 0001-01-01, the
/// proleptic day numbering RMOB tooling exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Builds a period from any date inside the month.
    pub fn from_date(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month. `Period` values are only constructed from
    /// valid dates or validated CLI input, so the fallback is unreachable
    /// in practice.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Days-since-0001-01-01 ordinal of the period's first day.
    /// This is the key used in the session's threshold map.
    pub fn ordinal(&self) -> i32 {
        self.first_day().num_days_from_ce()
    }

    /// Number of calendar days in the month.
    pub fn days_in_month(&self) -> u32 {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        match next {
            Some(d) => d.signed_duration_since(self.first_day()).num_days() as u32,
            None => 31,
        }
    }

    /// `YYYYMM` stem used in observation-log filenames (`RMOB-YYYYMM.dat`).
    pub fn file_stem(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// Reversed `MMYYYY` stem used in artifact filenames.
    pub fn reversed_stem(&self) -> String {
        format!("{:02}{:04}", self.month, self.year)
    }
}

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

/// Chart layouts the renderer knows how to draw.
///
/// Only the single-month colorgramme exists today; the CLI rejects any other
/// requested kind with `RmobError::UnsupportedChart` at the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Month,
}

impl ChartKind {
    pub fn parse(s: &str) -> Result<Self, RmobError> {
        match s {
            "month" => Ok(ChartKind::Month),
            other => Err(RmobError::UnsupportedChart(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when aggregating observations or producing artifacts.
#[derive(Debug, PartialEq)]
pub enum RmobError {
    /// A period contained zero usable count values, so no noise ceiling
    /// can be estimated. Callers must not export a period in this state.
    EmptyDataset,
    /// An operation was called out of order (e.g. `save` before `render`).
    InvalidState(String),
    /// The requested chart kind is not implemented.
    UnsupportedChart(String),
    /// A location or coordinate string could not be interpreted.
    BadLocation(String),
}

impl std::fmt::Display for RmobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RmobError::EmptyDataset => {
                write!(f, "no observation counts available to estimate a threshold from")
            }
            RmobError::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            RmobError::UnsupportedChart(kind) => write!(f, "unsupported chart kind: {}", kind),
            RmobError::BadLocation(s) => write!(f, "unparseable location string: {}", s),
        }
    }
}

impl std::error::Error for RmobError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_ordinal_is_days_from_ce() {
        // 2023-01-01 is day 738521 counted from 0001-01-01
        let p = Period { year: 2023, month: 1 };
        assert_eq!(p.ordinal(), 738_521);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(Period { year: 2023, month: 2 }.days_in_month(), 28);
        assert_eq!(Period { year: 2024, month: 2 }.days_in_month(), 29);
        assert_eq!(Period { year: 2023, month: 12 }.days_in_month(), 31);
        assert_eq!(Period { year: 2023, month: 4 }.days_in_month(), 30);
    }

    #[test]
    fn test_filename_stems() {
        let p = Period { year: 2023, month: 4 };
        assert_eq!(p.file_stem(), "202304");
        assert_eq!(p.reversed_stem(), "042023");
    }

    #[test]
    fn test_chart_kind_parse() {
        assert_eq!(ChartKind::parse("month"), Ok(ChartKind::Month));
        assert_eq!(
            ChartKind::parse("year"),
            Err(RmobError::UnsupportedChart("year".to_string()))
        );
    }
}
