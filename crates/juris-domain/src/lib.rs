//! Juris Domain Layer
//!
//! Core model for the legal document extraction service. This crate performs
//! no I/O: it defines the persisted record, the closed sets the rest of the
//! system validates against (file types, languages, decision types), and the
//! parameter types of the filtered query layer.
//!
//! ## Key Concepts
//!
//! - **ExtractionRecord**: structured metadata produced for one uploaded document
//! - **Language**: the closed set of languages with a schema and prompt
//! - **DecisionType**: per-language enumeration of decision kinds
//! - **ExtractionFilter / ExtractionSort / PaginationInput**: read-path parameters
//! - **Page**: a bounded slice of query results plus continuation metadata

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod date;
pub mod error;
pub mod language;
pub mod query;
pub mod record;

// Re-exports for convenience
pub use date::is_calendar_date;
pub use error::DomainError;
pub use language::Language;
pub use query::{
    ExtractionFilter, ExtractionSort, Page, Pagination, PaginationInput, SortField, SortOrder,
    TextField, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use record::{ExtractionRecord, ExtractionUpdate, FileType, NewExtraction, RecordId};
