/// Diurnal aggregation session.
///
/// Turns raw observation-log rows into a per-date, per-hour count table and
/// tracks the range of reporting periods seen. The session is explicit,
/// mutable state with `reset()`/`extend()` operations — callers that want a
/// multi-month accumulation call `extend` once per monthly file; callers
/// that want a clean slate call `reset` first.
///
/// No I/O happens here. Row supply is `ingest::logfile`'s job.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::analysis::threshold::estimate_threshold;
use crate::logging::{self, Component};
use crate::model::{Period, RmobError};

/// Per-date, per-hour observation counts. `BTreeMap` on both levels gives
/// the sorted date-then-hour iteration the exporters rely on for
/// deterministic output; duplicate `(date, hour)` rows are last-write-wins,
/// matching raw file order.
pub type DiurnalTable = BTreeMap<NaiveDate, BTreeMap<u32, u32>>;

#[derive(Debug, Default, Clone)]
pub struct DiurnalSession {
    diurnal: DiurnalTable,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    /// Noise ceiling per period, keyed by the period's first-day ordinal.
    /// Overwritten when the same period is aggregated again.
    thresholds: BTreeMap<i32, f64>,
}

impl DiurnalSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all accumulated state, returning the session to its freshly
    /// constructed form.
    pub fn reset(&mut self) {
        self.diurnal.clear();
        self.thresholds.clear();
        self.first_date = None;
        self.last_date = None;
    }

    /// Aggregates one period's raw rows into the session.
    ///
    /// Each usable row has at least 3 comma-separated fields: a date field
    /// whose first 8 characters are `YYYYMMDD`, an hour, and a count.
    /// Malformed rows fail individually and are skipped — never the batch.
    ///
    /// Estimates and stores the period's denoise threshold from the rows
    /// just parsed; a period with zero usable rows leaves the session
    /// untouched and returns `EmptyDataset`.
    pub fn extend(&mut self, period: Period, rows: &[String]) -> Result<f64, RmobError> {
        let mut parsed: DiurnalTable = BTreeMap::new();
        let mut skipped = 0usize;

        for row in rows {
            match parse_row(row) {
                Some((date, hour, count)) => {
                    parsed.entry(date).or_default().insert(hour, count);
                }
                None => {
                    if !row.is_empty() {
                        skipped += 1;
                    }
                }
            }
        }

        if skipped > 0 {
            logging::debug(
                Component::Analysis,
                Some(&period.file_stem()),
                &format!("skipped {} malformed rows", skipped),
            );
        }

        let counts: Vec<u32> = parsed
            .values()
            .flat_map(|hours| hours.values().copied())
            .collect();
        let threshold = estimate_threshold(&counts)?;

        let first = period.first_day();
        self.first_date = Some(match self.first_date {
            Some(d) => d.min(first),
            None => first,
        });
        self.last_date = Some(match self.last_date {
            Some(d) => d.max(first),
            None => first,
        });

        // Whole-date entries replace on re-aggregation of the same period.
        for (date, hours) in parsed {
            self.diurnal.insert(date, hours);
        }
        self.thresholds.insert(period.ordinal(), threshold);

        Ok(threshold)
    }

    pub fn diurnal(&self) -> &DiurnalTable {
        &self.diurnal
    }

    /// Hour→count map for one calendar date, if any rows covered it.
    pub fn counts_for(&self, date: NaiveDate) -> Option<&BTreeMap<u32, u32>> {
        self.diurnal.get(&date)
    }

    /// The period's stored noise ceiling, if it has been aggregated.
    pub fn threshold_for(&self, period: Period) -> Option<f64> {
        self.thresholds.get(&period.ordinal()).copied()
    }

    /// Highest count observed within the given period's month.
    /// Used as the chart scale when denoise masking is switched off.
    pub fn peak_count_for(&self, period: Period) -> Option<u32> {
        self.diurnal
            .iter()
            .filter(|(date, _)| Period::from_date(**date) == period)
            .flat_map(|(_, hours)| hours.values().copied())
            .max()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.first_date
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    /// The most recently aggregated period, the default target for both
    /// exporters.
    pub fn last_period(&self) -> Option<Period> {
        self.last_date.map(Period::from_date)
    }

    pub fn is_empty(&self) -> bool {
        self.diurnal.is_empty()
    }
}

/// Parses one whitespace-stripped row. Returns `None` for anything that
/// does not yield a valid (date, hour, count) triple.
fn parse_row(row: &str) -> Option<(NaiveDate, u32, u32)> {
    let fields: Vec<&str> = row.split(',').collect();
    if fields.len() < 3 {
        return None;
    }

    let date_field = fields[0];
    if date_field.len() < 8 || !date_field.is_char_boundary(8) {
        return None;
    }
    let year: i32 = date_field[..4].parse().ok()?;
    let month: u32 = date_field[4..6].parse().ok()?;
    let day: u32 = date_field[6..8].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let hour: u32 = fields[1].parse().ok()?;
    let count: u32 = fields[2].parse().ok()?;

    Some((date, hour, count))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn january() -> Period {
        Period { year: 2023, month: 1 }
    }

    #[test]
    fn test_scenario_three_rows() {
        let mut session = DiurnalSession::new();
        let t = session
            .extend(
                january(),
                &rows(&["20230101,00,5", "20230101,01,12", "20230101,02,999"]),
            )
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let hours = session.counts_for(date).unwrap();
        assert_eq!(hours.get(&0), Some(&5));
        assert_eq!(hours.get(&1), Some(&12));
        assert_eq!(hours.get(&2), Some(&999));

        // threshold sits far below the 999 spike
        assert!(t < 999.0);
        assert_eq!(session.threshold_for(january()), Some(t));
    }

    #[test]
    fn test_malformed_rows_are_skipped_not_fatal() {
        let mut session = DiurnalSession::new();
        session
            .extend(
                january(),
                &rows(&[
                    "20230101,00,5",
                    "garbage",
                    "20230101,01",        // too few fields
                    "20230101,xx,3",      // bad hour
                    "20230101,02,notnum", // bad count
                    "2023,02,3",          // short date field
                    "",
                ]),
            )
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(session.counts_for(date).unwrap().len(), 1);
    }

    #[test]
    fn test_all_malformed_yields_empty_dataset() {
        let mut session = DiurnalSession::new();
        let err = session.extend(january(), &rows(&["nonsense", ""])).unwrap_err();
        assert_eq!(err, RmobError::EmptyDataset);
        assert!(session.is_empty());
        assert_eq!(session.last_period(), None);
    }

    #[test]
    fn test_duplicate_hour_is_last_write_wins() {
        let mut session = DiurnalSession::new();
        session
            .extend(january(), &rows(&["20230105,07,10", "20230105,07,20"]))
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        assert_eq!(session.counts_for(date).unwrap().get(&7), Some(&20));
    }

    #[test]
    fn test_idempotent_reaggregation() {
        let input = rows(&["20230101,00,5", "20230102,01,12", "20230103,02,999"]);
        let mut session = DiurnalSession::new();
        let t1 = session.extend(january(), &input).unwrap();
        let snapshot = session.diurnal().clone();
        let t2 = session.extend(january(), &input).unwrap();

        assert_eq!(t1, t2);
        assert_eq!(session.diurnal(), &snapshot);
    }

    #[test]
    fn test_multi_period_accumulation_tracks_range() {
        let mut session = DiurnalSession::new();
        session
            .extend(Period { year: 2023, month: 2 }, &rows(&["20230210,03,4"]))
            .unwrap();
        session
            .extend(january(), &rows(&["20230110,03,4"]))
            .unwrap();

        assert_eq!(session.first_date(), NaiveDate::from_ymd_opt(2023, 1, 1));
        // last_date is the max period seen, not the most recent extend call
        assert_eq!(session.last_date(), NaiveDate::from_ymd_opt(2023, 2, 1));
        assert!(session.threshold_for(january()).is_some());
        assert!(session
            .threshold_for(Period { year: 2023, month: 2 })
            .is_some());
    }

    #[test]
    fn test_peak_count_scoped_to_period() {
        let mut session = DiurnalSession::new();
        session
            .extend(january(), &rows(&["20230101,00,5", "20230102,01,40"]))
            .unwrap();
        session
            .extend(Period { year: 2023, month: 2 }, &rows(&["20230201,00,7"]))
            .unwrap();

        assert_eq!(session.peak_count_for(january()), Some(40));
        assert_eq!(
            session.peak_count_for(Period { year: 2023, month: 2 }),
            Some(7)
        );
        assert_eq!(
            session.peak_count_for(Period { year: 2023, month: 3 }),
            None
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = DiurnalSession::new();
        session.extend(january(), &rows(&["20230101,00,5"])).unwrap();
        session.reset();
        assert!(session.is_empty());
        assert_eq!(session.first_date(), None);
        assert_eq!(session.threshold_for(january()), None);
    }
}
