use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use stockledger_kernel::{LedgerEvent, Observer, ObserverError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appends one timestamped line per ledger event to a text file.
///
/// The file is opened in append mode for each event and closed right after,
/// so nothing is held open between operations.
#[derive(Debug, Clone)]
pub struct JournalObserver {
    path: PathBuf,
}

impl JournalObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a free-form line (startup/shutdown markers).
    pub fn note(&self, message: &str) -> Result<(), ObserverError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let now = chrono::Local::now().format(TIMESTAMP_FORMAT);
        writeln!(file, "{now} | {message}")?;
        Ok(())
    }
}

impl Observer for JournalObserver {
    fn notify(&self, event: &LedgerEvent) -> Result<(), ObserverError> {
        self.note(&event.to_string())
    }
}
