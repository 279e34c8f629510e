//! Storage errors and their retry classification

use juris_domain::DomainError;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Substrings that mark an error message as transient
///
/// Covers connection loss and pool exhaustion (`P1001`, `P1017`), statement
/// timeouts (`P1008`), and deadlock or serialization conflicts (`40P01`,
/// `40001`, `55P03`) as reported by Postgres-backed deployments.
const RETRYABLE_MARKERS: &[&str] = &[
    "p1001",
    "p1008",
    "p1017",
    "deadlock",
    "connection",
    "timeout",
    "40p01",
    "40001",
    "55p03",
];

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Extraction with ID {0} not found")]
    NotFound(String),

    /// Stored data could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Write rejected by a domain invariant
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// Lock wait or transaction exceeded its time budget
    #[error("Transaction timeout: {0}")]
    Timeout(String),

    /// Connection unavailable
    #[error("Connection error: {0}")]
    Connection(String),

    /// The blocking task running a unit of work died
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl StoreError {
    /// Whether retrying the whole unit of work may succeed
    ///
    /// Timeouts and connection failures always qualify. Database errors
    /// qualify when SQLite reports the database busy, locked or unopenable,
    /// or when the message carries one of the transient markers. Everything
    /// else is fatal.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Timeout(_) | StoreError::Connection(_) => true,
            StoreError::Database(err) => {
                if let Some(
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen,
                ) = err.sqlite_error_code()
                {
                    return true;
                }
                is_retryable_message(&err.to_string())
            }
            StoreError::NotFound(_)
            | StoreError::InvalidData(_)
            | StoreError::Invalid(_)
            | StoreError::Worker(_) => false,
        }
    }
}

/// Whether a backend error message carries a transient marker
pub fn is_retryable_message(message: &str) -> bool {
    let message = message.to_lowercase();
    RETRYABLE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
