use std::path::PathBuf;

use stockledger_common::{RecordId, ValidationError};

use crate::codec::CodecError;

/// Errors from file-backed persistence and bulk import/export.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("ledger file {} contains record id {id} more than once", .path.display())]
    DuplicateInFile { path: PathBuf, id: RecordId },
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from rejected data rather than the filesystem.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
