//! CSV file watcher.
//! Polls the loan file on an interval and reports when its content changes.

use crate::data::loader::{load_loans, LoanRecord, LoaderError};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The check interval has not elapsed yet.
    NotDue,
    /// The file could not be stat'ed; treated as transient.
    Unavailable,
    /// Modification time unchanged.
    Unchanged,
    /// Modification time moved but the parsed rows are identical.
    Touched,
    /// New content; the snapshot has been replaced.
    Changed(Vec<LoanRecord>),
}

/// Tracks the last seen modification time and parsed content of a CSV file.
pub struct CsvWatcher {
    path: PathBuf,
    interval: Duration,
    last_check: Instant,
    last_mtime: Option<SystemTime>,
    snapshot: Vec<LoanRecord>,
}

impl CsvWatcher {
    /// Start watching `path`, treating `initial` as already displayed.
    pub fn new(path: impl Into<PathBuf>, interval: Duration, initial: Vec<LoanRecord>) -> Self {
        let path = path.into();
        let last_mtime = modified_time(&path);
        Self {
            path,
            interval,
            last_check: Instant::now(),
            last_mtime,
            snapshot: initial,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &[LoanRecord] {
        &self.snapshot
    }

    /// Check the file if the interval has elapsed since the last check.
    ///
    /// Stat failures are swallowed; load failures are returned.
    pub fn poll(&mut self, now: Instant) -> Result<PollOutcome, LoaderError> {
        if now.saturating_duration_since(self.last_check) < self.interval {
            return Ok(PollOutcome::NotDue);
        }
        self.last_check = now;

        let Some(mtime) = modified_time(&self.path) else {
            debug!("Could not stat {}, skipping", self.path.display());
            return Ok(PollOutcome::Unavailable);
        };

        if self.last_mtime == Some(mtime) {
            return Ok(PollOutcome::Unchanged);
        }
        self.last_mtime = Some(mtime);

        let records = load_loans(&self.path)?;
        Ok(self.compare_and_store(records))
    }

    /// Reload unconditionally, ignoring interval and modification time.
    pub fn force_reload(&mut self) -> Result<PollOutcome, LoaderError> {
        self.last_check = Instant::now();
        self.last_mtime = modified_time(&self.path);
        let records = load_loans(&self.path)?;
        Ok(self.compare_and_store(records))
    }

    fn compare_and_store(&mut self, records: Vec<LoanRecord>) -> PollOutcome {
        if records == self.snapshot {
            debug!("{} touched without content change", self.path.display());
            return PollOutcome::Touched;
        }
        self.snapshot = records.clone();
        PollOutcome::Changed(records)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::LoanStatus;
    use std::fs::File;

    const HEADER: &str = "loanbalance,loanrate,loantermOrAgeInMonths,loanaddedOrRemovedFlag\n";

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "loan_viewer_watcher_{}_{}.csv",
            std::process::id(),
            name
        ))
    }

    fn write_with_mtime(path: &Path, body: &str, offset_secs: u64) {
        fs::write(path, format!("{HEADER}{body}")).unwrap();
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + offset_secs))
            .unwrap();
    }

    #[test]
    fn test_poll_sequence() {
        let path = temp_path("sequence");
        write_with_mtime(&path, "1000,5,12,added\n", 0);
        let initial = load_loans(&path).unwrap();

        let start = Instant::now();
        let interval = Duration::from_secs(5);
        let mut watcher = CsvWatcher::new(&path, interval, initial);

        // Before the interval elapses nothing is checked, even if the file changed.
        write_with_mtime(&path, "2000,5,12,added\n", 1);
        assert_eq!(watcher.poll(start).unwrap(), PollOutcome::NotDue);

        // First due poll sees the new mtime and new content.
        let t1 = start + interval * 2;
        match watcher.poll(t1).unwrap() {
            PollOutcome::Changed(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].balance, 2000.0);
                assert_eq!(records[0].status, LoanStatus::Added);
            }
            other => panic!("expected Changed, got {other:?}"),
        }

        // Same mtime: unchanged.
        let t2 = t1 + interval;
        assert_eq!(watcher.poll(t2).unwrap(), PollOutcome::Unchanged);

        // New mtime, same rows: touched.
        write_with_mtime(&path, "2000,5,12,added\n", 2);
        let t3 = t2 + interval;
        assert_eq!(watcher.poll(t3).unwrap(), PollOutcome::Touched);

        // File gone: transient, not an error.
        fs::remove_file(&path).unwrap();
        let t4 = t3 + interval;
        assert_eq!(watcher.poll(t4).unwrap(), PollOutcome::Unavailable);
        assert_eq!(watcher.snapshot()[0].balance, 2000.0);
    }

    #[test]
    fn test_malformed_reload_is_error() {
        let path = temp_path("malformed");
        write_with_mtime(&path, "1000,5,12,added\n", 0);
        let initial = load_loans(&path).unwrap();
        let mut watcher = CsvWatcher::new(&path, Duration::ZERO, initial.clone());

        write_with_mtime(&path, "oops,5,12,added\n", 5);
        let result = watcher.poll(Instant::now());
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(LoaderError::MalformedRow { row: 1, .. })));
        assert_eq!(watcher.snapshot(), initial.as_slice());
    }

    #[test]
    fn test_force_reload_bypasses_interval() {
        let path = temp_path("force");
        write_with_mtime(&path, "1000,5,12,added\n", 0);
        let mut watcher = CsvWatcher::new(&path, Duration::from_secs(3600), Vec::new());

        let outcome = watcher.force_reload().unwrap();
        fs::remove_file(&path).ok();

        assert!(matches!(outcome, PollOutcome::Changed(ref r) if r.len() == 1));
    }
}
