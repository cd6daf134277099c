/// Observation-log watching with regeneration debounce.
///
/// Polls the current period's `.dat` file mtime on a fixed interval and
/// reruns the pipeline when it changes — but only while a cooldown counter
/// sits at zero. A trigger resets the counter to `cooldown_ticks`, and the
/// counter is decremented once per poll tick, so rapid successive writes to
/// the same file cannot cause a re-trigger storm.
///
/// The pipeline itself has no awareness of this loop; it is always invoked
/// "for the current period" with no other arguments.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, SystemTime};

use crate::config::Config;
use crate::ingest::logfile;
use crate::logging::{self, Component};
use crate::pipeline::{current_period, generate};

/// Debounce gate for change-triggered regeneration.
///
/// Separated from the poll loop so the trigger arithmetic is testable
/// without clocks or files.
#[derive(Debug)]
pub struct DebounceGate {
    cooldown_ticks: u32,
    remaining: u32,
    last_mtime: Option<SystemTime>,
}

impl DebounceGate {
    pub fn new(cooldown_ticks: u32) -> Self {
        DebounceGate {
            cooldown_ticks,
            remaining: 0,
            last_mtime: None,
        }
    }

    /// Advances one poll tick with the file's current mtime (or `None` when
    /// the file is missing). Returns `true` when a regeneration should run
    /// now; doing so resets the cooldown.
    pub fn tick(&mut self, mtime: Option<SystemTime>) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            // remember the newest mtime so changes made during cooldown
            // don't retrigger once it expires
            if mtime.is_some() {
                self.last_mtime = mtime;
            }
            return false;
        }

        let changed = match (self.last_mtime, mtime) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(prev), Some(cur)) => cur != prev,
        };

        if changed {
            self.last_mtime = mtime;
            self.remaining = self.cooldown_ticks;
        }
        changed
    }
}

/// Runs the poll loop forever. Pipeline failures are logged and the loop
/// continues; only a logger-level catastrophe would end it.
pub fn watch_and_regenerate(config: &Config) -> Result<(), Box<dyn Error>> {
    let mut gate = DebounceGate::new(config.watch.cooldown_ticks);
    let interval = Duration::from_secs(config.watch.poll_secs);

    logging::info(
        Component::Watch,
        None,
        &format!(
            "watching {} every {}s (cooldown {} ticks)",
            config.datapath, config.watch.poll_secs, config.watch.cooldown_ticks
        ),
    );

    loop {
        let period = current_period();
        let path = logfile::period_log_path(&config.datapath, period);
        let mtime = file_mtime(&path);

        if gate.tick(mtime) {
            logging::info(
                Component::Watch,
                Some(&period.file_stem()),
                "observation log changed, regenerating",
            );
            if let Err(e) = generate(config, period) {
                logging::error(
                    Component::Watch,
                    Some(&period.file_stem()),
                    &format!("regeneration failed: {}", e),
                );
            }
        }

        thread::sleep(interval);
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
