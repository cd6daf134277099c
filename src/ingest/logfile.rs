/// Monthly observation-log file reading.
///
/// One file per reporting period, named `RMOB-YYYYMM.dat`, line-oriented
/// with comma-separated fields: `YYYYMMDDHHMMSS,hour,count[,...]`. All
/// whitespace is stripped before splitting so indented or space-padded
/// exports parse identically.
///
/// This module only supplies raw rows; interpreting them is the
/// aggregator's job (`analysis::diurnal`), which keeps file I/O out of the
/// statistics path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::Period;

/// Path of the observation log covering `period` inside `datapath`.
pub fn period_log_path(datapath: &str, period: Period) -> PathBuf {
    Path::new(datapath).join(format!("RMOB-{}.dat", period.file_stem()))
}

/// Reads one period's observation log into whitespace-stripped rows.
///
/// Rows are returned verbatim apart from whitespace removal; malformed rows
/// are passed through and skipped later by the aggregator.
pub fn read_period_rows(datapath: &str, period: Period) -> io::Result<Vec<String>> {
    let path = period_log_path(datapath, period);
    let contents = fs::read_to_string(&path)?;
    let stripped: String = contents.chars().filter(|c| !matches!(c, ' ' | '\t' | '\r')).collect();
    Ok(stripped.lines().map(str::to_string).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_period_log_path() {
        let p = Period { year: 2023, month: 1 };
        assert_eq!(
            period_log_path("/var/rmob", p),
            PathBuf::from("/var/rmob/RMOB-202301.dat")
        );
    }

    #[test]
    fn test_read_strips_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let p = Period { year: 2023, month: 1 };
        let path = period_log_path(dir.path().to_str().unwrap(), p);
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "20230101000000, 00, 5").unwrap();
        writeln!(f, "  20230101000000 ,01,12").unwrap();
        drop(f);

        let rows = read_period_rows(dir.path().to_str().unwrap(), p).unwrap();
        assert_eq!(rows[0], "20230101000000,00,5");
        assert_eq!(rows[1], "20230101000000,01,12");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = Period { year: 2023, month: 2 };
        assert!(read_period_rows(dir.path().to_str().unwrap(), p).is_err());
    }
}
