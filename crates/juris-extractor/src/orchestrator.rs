//! End-to-end extraction pipeline

use crate::client::ExtractionClient;
use crate::config::PipelineConfig;
use crate::error::{ExtractorError, ParseError, PipelineStage};
use crate::language::LanguageDetector;
use crate::schema::SchemaRegistry;
use crate::text::{DocumentTextExtractor, TextExtractor};
use chrono::Utc;
use juris_domain::{ExtractionRecord, FileType, NewExtraction};
use juris_llm::StructuredModel;
use juris_store::ExtractionRepository;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Rough characters-per-token ratio used for the context ceiling
const CHARS_PER_TOKEN: usize = 4;

/// Turns an uploaded document into a stored record
///
/// Steps run strictly in order: validate type and size, extract text,
/// detect language, resolve schema and prompt, call the model once,
/// persist. The storage transaction covers only the final insert.
pub struct ExtractionOrchestrator<M> {
    text_extractor: Arc<dyn TextExtractor>,
    detector: LanguageDetector,
    registry: SchemaRegistry,
    client: ExtractionClient<M>,
    repository: ExtractionRepository,
    config: PipelineConfig,
}

impl<M: StructuredModel> ExtractionOrchestrator<M> {
    /// Create an orchestrator with the default text extractor and detector
    pub fn new(model: M, repository: ExtractionRepository, config: PipelineConfig) -> Self {
        Self {
            text_extractor: Arc::new(DocumentTextExtractor),
            detector: LanguageDetector::default(),
            registry: SchemaRegistry,
            client: ExtractionClient::new(model, &config),
            repository,
            config,
        }
    }

    /// Replace the text extractor
    pub fn with_text_extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.text_extractor = Arc::new(extractor);
        self
    }

    /// Replace the language detector
    pub fn with_language_detector(mut self, detector: LanguageDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Identifier of the model recorded as each extraction's source
    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Process one uploaded document
    ///
    /// `declared_size` is the size the client announced; the larger of it
    /// and the actual byte count is checked against the ceiling.
    pub async fn process(
        &self,
        bytes: &[u8],
        media_type: &str,
        declared_size: u64,
        original_name: Option<&str>,
    ) -> Result<ExtractionRecord, ExtractorError> {
        let file_name = original_name.unwrap_or("<unnamed>");

        let file_type = FileType::from_media_type(media_type).map_err(|e| {
            warn!("Rejected {}: {}", file_name, e);
            ExtractorError::from(e)
        })?;

        let size = declared_size.max(bytes.len() as u64);
        let limit = self.config.max_file_size(file_type);
        if size > limit {
            warn!(
                "Rejected {}: {} bytes exceeds the {} ceiling of {} bytes",
                file_name, size, file_type, limit
            );
            return Err(ExtractorError::FileTooLarge {
                file_type,
                size,
                limit,
            });
        }

        info!("Processing {} ({}, {} bytes)", file_name, file_type, size);

        let result = self.run_stages(bytes, file_type, original_name).await;
        match &result {
            Ok(record) => info!("Extraction {} created from {}", record.id, file_name),
            Err(e) if e.is_client_error() => warn!("Rejected {}: {}", file_name, e),
            Err(ExtractorError::Processing { stage, source }) => error!(
                "Extraction of {} failed at stage '{}': {}",
                file_name, stage, source
            ),
            Err(e) => error!("Extraction of {} failed: {}", file_name, e),
        }
        result
    }

    async fn run_stages(
        &self,
        bytes: &[u8],
        file_type: FileType,
        original_name: Option<&str>,
    ) -> Result<ExtractionRecord, ExtractorError> {
        let text = self
            .extract_text(bytes, file_type)
            .await
            .map_err(|e| ExtractorError::at(PipelineStage::Parse, e))?;
        debug!("Extracted {} chars of text", text.len());

        if let Some(limit) = self.config.max_context_tokens {
            let estimated = text.chars().count().div_ceil(CHARS_PER_TOKEN);
            if estimated > limit {
                return Err(ExtractorError::ContextTooLarge { estimated, limit });
            }
        }

        let language = self.detector.detect(&text);
        info!("Detected language: {}", language);

        let (schema, system_prompt) = self.registry.for_language(language);

        let structured = self
            .client
            .extract(&text, &schema, system_prompt)
            .await
            .map_err(|e| ExtractorError::at(PipelineStage::Extract, e))?;

        let candidate = NewExtraction {
            file_type,
            original_file_name: original_name.map(str::to_string),
            source: self.client.model_name().to_string(),
            title: structured.title,
            summary: structured.summary,
            conclusion: structured.conclusion,
            decision_type: structured.decision_type,
            date_of_decision: structured.date_of_decision,
            office: structured.office,
            court: structured.court,
            case_number: structured.case_number,
            language,
        };
        candidate
            .validate()
            .map_err(|e| ExtractorError::at(PipelineStage::Persist, e))?;

        // Built before the transaction so every retry inserts the same row
        let record = candidate.into_record(Utc::now());
        self.repository
            .create(&record)
            .await
            .map_err(|e| ExtractorError::at(PipelineStage::Persist, e))?;

        Ok(record)
    }

    /// Run the text extractor off the async executor
    async fn extract_text(&self, bytes: &[u8], file_type: FileType) -> Result<String, ParseError> {
        let extractor = Arc::clone(&self.text_extractor);
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || extractor.extract(&bytes, file_type))
            .await
            .map_err(|e| {
                let message = format!("text extraction task failed: {}", e);
                match file_type {
                    FileType::Html => ParseError::Html(message),
                    FileType::Pdf => ParseError::Pdf(message),
                }
            })?
    }
}
