//! Persistence: the binary ledger file, its record codec, and CSV bulk transfer.
//!
//! # Invariants
//! - The binary layout is fixed per record with no header; length is implied by EOF.
//! - A file that cannot be opened loads as an empty inventory; a file that
//!   opens but does not decode is an error.
//! - Saving never modifies the in-memory inventory.

pub mod bulk;
pub mod codec;
pub mod error;
pub mod file;

pub use bulk::{export_csv, import_csv};
pub use codec::{CodecError, decode_records, encode_records};
pub use error::PersistError;
pub use file::{DEFAULT_LEDGER_FILE, LedgerFile, LoadOutcome};
