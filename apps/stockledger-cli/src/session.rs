//! Startup lifecycle: load the ledger file, fall back to the demo dataset.

use anyhow::{Context, Result, bail};
use stockledger_kernel::{Inventory, Observer, seed_demo};
use stockledger_persist::{LedgerFile, LoadOutcome};

/// The inventory a session works on, plus how its load went.
#[derive(Debug)]
pub struct OpenedLedger {
    pub inventory: Inventory,
    /// The ledger file exists but could not be loaded. Its bytes are still on
    /// disk and must not be overwritten without an explicit override.
    pub load_failed: bool,
}

impl OpenedLedger {
    /// Refuse to save over a ledger file that failed to load, unless `force`.
    pub fn check_writable(&self, file: &LedgerFile, force: bool) -> Result<()> {
        if self.load_failed && !force {
            bail!(
                "{} could not be loaded; refusing to overwrite it (pass --force to save anyway)",
                file.path().display()
            );
        }
        Ok(())
    }
}

/// Build the session inventory from `file`.
///
/// A missing file and an empty file both end up seeded with the demo
/// dataset. A corrupt file is reported on stderr, flagged in
/// [`OpenedLedger::load_failed`], and also falls back to the demo dataset.
pub fn open_inventory(
    file: &LedgerFile,
    observer: impl Observer + 'static,
) -> Result<OpenedLedger> {
    let mut inventory = Inventory::with_observer(observer);

    let load_failed = match file.load_into(&mut inventory) {
        Ok(LoadOutcome::Loaded(count)) => {
            tracing::debug!(path = %file.path().display(), count, "session loaded");
            false
        }
        Ok(LoadOutcome::Missing) => {
            tracing::debug!(path = %file.path().display(), "no ledger file yet");
            false
        }
        Err(e) => {
            eprintln!("Error loading {}: {e}", file.path().display());
            tracing::error!(error = %e, "load failed, continuing with an empty inventory");
            true
        }
    };

    if inventory.is_empty() {
        seed_demo(&mut inventory).context("seeding demo dataset")?;
        tracing::info!(count = inventory.len(), "seeded demo dataset");
    }
    Ok(OpenedLedger {
        inventory,
        load_failed,
    })
}
