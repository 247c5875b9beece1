//! Ledger kernel: the authoritative inventory, its undo/redo history, and the
//! event hook it reports to.
//!
//! # Invariants
//! - Record ids are unique within an inventory.
//! - Quantities are never negative.
//! - Every mutation checkpoints the prior state before applying itself.
//! - Queries never mutate the live record sequence.

pub mod demo;
pub mod event;
pub mod history;
pub mod inventory;

pub use demo::{demo_records, seed_demo};
pub use event::{
    LedgerEvent, NoopObserver, Observer, ObserverError, ObserverSet, SortKey, TracingObserver,
};
pub use history::{DEFAULT_HISTORY_CAPACITY, History, Snapshot};
pub use inventory::{DEFAULT_EXPENSIVE_FLOOR, DEFAULT_LOW_STOCK_THRESHOLD, Inventory};
pub use stockledger_common::{Record, RecordId, ValidationError};
