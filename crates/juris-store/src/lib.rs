//! Juris Storage Layer
//!
//! Persists extraction records in SQLite and serves the filtered read path.
//!
//! # Architecture
//!
//! - [`Database`]: the process-wide connection, opened once at startup
//! - [`RetryingStore`]: runs units of work in transactions with bounded,
//!   exponentially backed-off retry of transient failures
//! - [`ExtractionRepository`]: create, lookup and correction of records
//! - [`QueryEngine`]: filter, sort and paginate records
//!
//! # Examples
//!
//! ```no_run
//! use juris_store::{Database, ExtractionRepository, QueryEngine, RetryingStore};
//!
//! let store = RetryingStore::new(Database::open("sqlite://juris.db").unwrap());
//! let repository = ExtractionRepository::new(store.clone());
//! let queries = QueryEngine::new(store);
//! ```

#![warn(missing_docs)]

pub mod db;
pub mod error;
pub mod query;
pub mod repository;
pub mod retry;

pub use db::Database;
pub use error::{is_retryable_message, StoreError};
pub use query::{QueryEngine, QueryError};
pub use repository::ExtractionRepository;
pub use retry::{IsolationLevel, RetryingStore, TransactionOptions};

// Units of work receive the transaction directly
pub use rusqlite::Transaction;
