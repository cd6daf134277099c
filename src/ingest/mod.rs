/// Observation-log ingestion.
///
/// Submodules:
/// - `logfile` — reads monthly `RMOB-YYYYMM.dat` files into raw rows.

pub mod logfile;
