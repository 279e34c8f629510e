//! Juris Extractor
//!
//! Turns uploaded legal documents into structured, persisted records.
//!
//! # Architecture
//!
//! ```text
//! bytes → TextExtractor → LanguageDetector → SchemaRegistry → ExtractionClient → ExtractionRepository
//! ```
//!
//! The model is called exactly once per document. Only the final insert
//! runs inside a storage transaction, and only that insert is retried.
//!
//! # Example Usage
//!
//! ```no_run
//! use juris_extractor::{ExtractionOrchestrator, PipelineConfig};
//! use juris_llm::MockProvider;
//! use juris_store::{Database, ExtractionRepository, RetryingStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = ExtractionRepository::new(RetryingStore::new(Database::in_memory()?));
//! let model = MockProvider::new("{}");
//! let orchestrator = ExtractionOrchestrator::new(model, repository, PipelineConfig::default());
//!
//! let html = b"<html><body><h1>JUDGMENT</h1></body></html>";
//! let record = orchestrator
//!     .process(html, "text/html", html.len() as u64, Some("judgment.html"))
//!     .await?;
//! println!("Created {}", record.id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod language;
mod orchestrator;
mod parser;
mod prompt;
mod schema;
mod text;

#[cfg(test)]
mod tests;

pub use client::ExtractionClient;
pub use config::{PipelineConfig, DEFAULT_MAX_FILE_SIZE, MIN_CONTEXT_TOKENS, MIN_FILE_SIZE_LIMIT};
pub use error::{ExtractorError, ParseError, PipelineStage};
pub use language::LanguageDetector;
pub use orchestrator::ExtractionOrchestrator;
pub use prompt::system_prompt;
pub use schema::{ExtractionSchema, SchemaRegistry, StructuredResult};
pub use text::{normalize_whitespace, DocumentTextExtractor, TextExtractor};
