//! Validation errors raised by the domain model

use thiserror::Error;

/// Errors produced when input violates a domain invariant
///
/// Every variant describes a client fault: the caller supplied a value the
/// model does not accept. None of them is ever worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A date field is not a `YYYY-MM-DD` calendar date
    #[error("{field} must be in YYYY-MM-DD format, got '{value}'")]
    InvalidDate {
        /// Name of the offending field
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// `dateFrom` is later than `dateTo`
    #[error("dateFrom ({from}) must be less than or equal to dateTo ({to})")]
    InvalidDateRange {
        /// Lower bound supplied
        from: String,
        /// Upper bound supplied
        to: String,
    },

    /// Pagination parameters out of bounds
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    /// Decision type not part of the language's enumeration
    #[error("Decision type '{value}' is not valid for language '{language}'")]
    InvalidDecisionType {
        /// Rejected value
        value: String,
        /// Language code of the record
        language: &'static str,
    },

    /// Language code outside the supported set
    #[error("Unsupported language code: {0}")]
    UnsupportedLanguage(String),

    /// Media type other than HTML or PDF
    #[error("File must be either HTML or PDF (got '{0}')")]
    UnsupportedMediaType(String),

    /// A required text field is empty
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),
}
