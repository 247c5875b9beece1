//! File-backed ledger persistence.
//!
//! The whole inventory lives in one binary file written by [`crate::codec`].
//! Saving overwrites the file; loading replaces the inventory contents.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use stockledger_kernel::{Inventory, LedgerEvent, Record};

use crate::codec;
use crate::error::PersistError;

/// Default file name used by the CLI when no path is given.
pub const DEFAULT_LEDGER_FILE: &str = "inventory.dat";

/// What a load found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file could not be opened; the inventory is empty.
    Missing,
    /// The file was decoded; the inventory holds this many records.
    Loaded(usize),
}

/// A binary ledger file at a fixed path.
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the inventory contents with the records stored in the file.
    ///
    /// The inventory is cleared first. A file that cannot be opened is not an
    /// error: the inventory stays empty and [`LoadOutcome::Missing`] is
    /// returned. A file that opens but fails to decode, or holds duplicate ids
    /// or invalid records, returns an error and also leaves the inventory
    /// empty. Whatever the outcome, the history is reset so the resulting
    /// state is the only undo baseline.
    pub fn load_into(&self, inventory: &mut Inventory) -> Result<LoadOutcome, PersistError> {
        inventory.clear();
        inventory.reset_history();

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                tracing::info!(path = %self.path.display(), error = %e, "ledger file not readable, starting empty");
                inventory.record_event(&LedgerEvent::LoadSkipped {
                    source: self.path.display().to_string(),
                });
                return Ok(LoadOutcome::Missing);
            }
        };

        let records = self.read_records(file)?;
        let count = records.len();
        inventory.replace_loaded(records);

        tracing::info!(path = %self.path.display(), count, "ledger loaded");
        inventory.record_event(&LedgerEvent::Loaded {
            source: self.path.display().to_string(),
            count,
        });
        Ok(LoadOutcome::Loaded(count))
    }

    /// Write every record to the file, replacing what was there.
    ///
    /// The inventory itself is never modified, whether or not the write
    /// succeeds.
    pub fn save(&self, inventory: &Inventory) -> Result<(), PersistError> {
        let file = File::create(&self.path).map_err(|e| PersistError::io(&self.path, e))?;
        let mut writer = BufWriter::new(file);
        codec::encode_records(&mut writer, inventory.records())
            .map_err(|e| PersistError::io(&self.path, e))?;
        // BufWriter swallows errors on drop
        writer.flush().map_err(|e| PersistError::io(&self.path, e))?;

        tracing::info!(path = %self.path.display(), count = inventory.len(), "ledger saved");
        inventory.record_event(&LedgerEvent::Saved {
            target: self.path.display().to_string(),
            count: inventory.len(),
        });
        Ok(())
    }

    fn read_records(&self, file: File) -> Result<Vec<Record>, PersistError> {
        let mut reader = BufReader::new(file);
        let records = codec::decode_records(&mut reader).map_err(|source| {
            tracing::warn!(path = %self.path.display(), error = %source, "ledger file corrupt");
            PersistError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(PersistError::DuplicateInFile {
                    path: self.path.clone(),
                    id: record.id(),
                });
            }
            record.validate()?;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockledger_kernel::seed_demo;

    fn populated() -> Inventory {
        let mut inv = Inventory::new();
        seed_demo(&mut inv).unwrap();
        inv.add(Record::new(5, "Releu ăîș", 0, 45.5)).unwrap();
        inv.add(Record::new(6, "", 3, 0.0)).unwrap();
        inv
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(tmp.path().join("inventory.dat"));
        let original = populated();
        file.save(&original).unwrap();

        let mut loaded = Inventory::new();
        assert_eq!(file.load_into(&mut loaded).unwrap(), LoadOutcome::Loaded(6));
        assert_eq!(loaded.records(), original.records());
    }

    #[test]
    fn load_resets_history_to_baseline() {
        let tmp = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(tmp.path().join("inventory.dat"));
        file.save(&populated()).unwrap();

        let mut inv = Inventory::new();
        inv.add(Record::new(99, "stale", 1, 1.0)).unwrap();
        inv.add(Record::new(98, "stale", 1, 1.0)).unwrap();
        file.load_into(&mut inv).unwrap();

        assert!(!inv.exists(99));
        assert_eq!(inv.history().undo_depth(), 1);
        assert_eq!(inv.history().redo_depth(), 0);
    }

    #[test]
    fn missing_file_is_empty_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(tmp.path().join("nope.dat"));
        let mut inv = populated();
        assert_eq!(file.load_into(&mut inv).unwrap(), LoadOutcome::Missing);
        assert!(inv.is_empty());
    }

    #[test]
    fn missing_file_drops_previous_history() {
        let tmp = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(tmp.path().join("nope.dat"));
        let mut inv = populated();
        file.load_into(&mut inv).unwrap();

        assert_eq!(inv.history().undo_depth(), 1);
        assert_eq!(inv.history().redo_depth(), 0);
        inv.undo();
        assert!(inv.is_empty());
        assert!(!inv.undo());
    }

    #[test]
    fn empty_file_loads_zero_records() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("inventory.dat");
        std::fs::write(&path, b"").unwrap();

        let mut inv = Inventory::new();
        assert_eq!(
            LedgerFile::new(&path).load_into(&mut inv).unwrap(),
            LoadOutcome::Loaded(0)
        );
        assert!(inv.is_empty());
    }

    #[test]
    fn truncated_file_fails_and_leaves_inventory_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("inventory.dat");
        let file = LedgerFile::new(&path);
        file.save(&populated()).unwrap();

        let mut data = std::fs::read(&path).unwrap();
        data.truncate(data.len() - 1);
        std::fs::write(&path, &data).unwrap();

        let mut inv = populated();
        let err = file.load_into(&mut inv).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. }));
        assert!(inv.is_empty());
        inv.undo();
        assert!(inv.is_empty());
        assert!(!inv.undo());
    }

    #[test]
    fn duplicate_ids_on_disk_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("inventory.dat");
        let bytes = codec::encode_to_vec(&[
            Record::new(1, "a", 1, 1.0),
            Record::new(1, "b", 2, 2.0),
        ])
        .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let mut inv = Inventory::new();
        let err = LedgerFile::new(&path).load_into(&mut inv).unwrap_err();
        assert!(matches!(err, PersistError::DuplicateInFile { id: 1, .. }));
        assert!(inv.is_empty());
    }

    #[test]
    fn save_to_unwritable_path_keeps_memory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = LedgerFile::new(tmp.path().join("missing_dir").join("inventory.dat"));
        let inv = populated();
        let before = inv.records().to_vec();

        let err = file.save(&inv).unwrap_err();
        assert!(matches!(err, PersistError::Io { .. }));
        assert_eq!(inv.records(), before.as_slice());
    }
}
