//! Shared types for the stock ledger: the inventory record and its validation errors.

pub mod error;
pub mod types;

pub use error::ValidationError;
pub use types::{Record, RecordId};
