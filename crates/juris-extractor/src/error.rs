//! Error types for the extraction pipeline

use juris_domain::{DomainError, FileType};
use juris_llm::LlmError;
use juris_store::StoreError;
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

const MIB: u64 = 1024 * 1024;

/// Byte count in MiB, rounded half up
fn whole_mib(bytes: impl Borrow<u64>) -> u64 {
    let bytes = *bytes.borrow();
    bytes / MIB + u64::from(bytes % MIB >= MIB / 2)
}

/// The byte stream is not a well-formed document of its declared type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// HTML that is not valid UTF-8
    #[error("HTML parsing failed: {0}")]
    Html(String),

    /// Corrupt or unreadable PDF
    #[error("PDF parsing failed: {0}")]
    Pdf(String),
}

/// Pipeline step a processing failure originated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Text extraction
    Parse,
    /// Language detection
    DetectLanguage,
    /// Schema and prompt lookup
    ResolveSchema,
    /// Model invocation and output validation
    Extract,
    /// Record creation
    Persist,
}

impl PipelineStage {
    /// Stable lowercase name used in logs and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Parse => "parse",
            PipelineStage::DetectLanguage => "detect-language",
            PipelineStage::ResolveSchema => "resolve-schema",
            PipelineStage::Extract => "extract",
            PipelineStage::Persist => "persist",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Input rejected by a domain rule (e.g. unsupported media type)
    #[error(transparent)]
    Input(#[from] DomainError),

    /// Payload larger than the ceiling for its type
    #[error("File size exceeds maximum allowed size of {}MB", whole_mib(.limit))]
    FileTooLarge {
        /// Declared file type
        file_type: FileType,
        /// Observed size in bytes
        size: u64,
        /// Ceiling in bytes
        limit: u64,
    },

    /// Extracted text would not fit the model context
    #[error("Document is too long: about {estimated} tokens, limit is {limit}")]
    ContextTooLarge {
        /// Estimated token count
        estimated: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// Document could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Model call failed
    #[error("Model invocation failed: {0}")]
    ModelInvocation(#[from] LlmError),

    /// Model output does not conform to the schema
    #[error("Model output does not match the schema: {0}")]
    SchemaValidation(String),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A pipeline step failed
    #[error("Processing failed at stage '{stage}': {source}")]
    Processing {
        /// Step the failure originated in
        stage: PipelineStage,
        /// Underlying failure
        #[source]
        source: Box<ExtractorError>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Wrap an error as a failure of `stage`
    pub fn at(stage: PipelineStage, source: impl Into<ExtractorError>) -> Self {
        ExtractorError::Processing {
            stage,
            source: Box::new(source.into()),
        }
    }

    /// Whether the caller supplied bad input (as opposed to a server-side failure)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExtractorError::Input(_)
                | ExtractorError::FileTooLarge { .. }
                | ExtractorError::ContextTooLarge { .. }
        )
    }

    /// Originating stage of a processing failure
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            ExtractorError::Processing { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_message_in_whole_mib() {
        let err = ExtractorError::FileTooLarge {
            file_type: FileType::Pdf,
            size: 10 * MIB + 1,
            limit: 10 * MIB,
        };
        assert_eq!(
            err.to_string(),
            "File size exceeds maximum allowed size of 10MB"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_size_message_rounds_to_nearest_mib() {
        let message = |limit: u64| {
            ExtractorError::FileTooLarge {
                file_type: FileType::Html,
                size: limit + 1,
                limit,
            }
            .to_string()
        };
        assert_eq!(message(3 * MIB / 2), "File size exceeds maximum allowed size of 2MB");
        assert_eq!(message(MIB + MIB / 2 - 1), "File size exceeds maximum allowed size of 1MB");
        assert_eq!(message(1024), "File size exceeds maximum allowed size of 0MB");
        assert_eq!(message(5 * MIB), "File size exceeds maximum allowed size of 5MB");
    }

    #[test]
    fn test_processing_carries_stage_and_message() {
        let err = ExtractorError::at(
            PipelineStage::Extract,
            LlmError::Communication("connection refused".to_string()),
        );
        assert_eq!(err.stage(), Some(PipelineStage::Extract));
        assert!(!err.is_client_error());
        let message = err.to_string();
        assert!(message.contains("extract"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_media_type_is_client_error() {
        let err: ExtractorError = DomainError::UnsupportedMediaType("image/png".to_string()).into();
        assert!(err.is_client_error());
        assert_eq!(err.stage(), None);
    }
}
