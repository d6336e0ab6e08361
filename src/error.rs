//! Error types for yakv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::wal::LogState;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for yakv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("key doesn't exist")]
    KeyNotFound,

    #[error("key must not be empty")]
    EmptyKey,

    // -------------------------------------------------------------------------
    // Transaction Log Errors
    // -------------------------------------------------------------------------
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("transaction IDs out of sequence at line {line}: {found} does not follow {last}")]
    Sequence { line: u64, last: u64, found: u64 },

    #[error("failed to append event {id}: {source}")]
    LogWrite {
        id: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot {operation} while the event log is {state}")]
    LogState {
        operation: &'static str,
        state: LogState,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// Whether this error means the log on disk cannot be replayed
    pub fn is_corruption(&self) -> bool {
        matches!(self, KvError::MalformedRecord { .. } | KvError::Sequence { .. })
    }
}
