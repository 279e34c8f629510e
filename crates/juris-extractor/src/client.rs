//! Single-shot model invocation

use crate::config::PipelineConfig;
use crate::error::ExtractorError;
use crate::parser::parse_model_output;
use crate::schema::{ExtractionSchema, StructuredResult};
use juris_llm::{ModelRequest, StructuredModel};
use tracing::debug;

/// Sends a document to the model and validates the answer
///
/// Makes exactly one model call per `extract`; whether to resubmit after a
/// failure is the caller's decision.
pub struct ExtractionClient<M> {
    model: M,
    temperature: f32,
    max_output_tokens: u32,
}

impl<M: StructuredModel> ExtractionClient<M> {
    /// Create a client with the sampling settings of `config`
    pub fn new(model: M, config: &PipelineConfig) -> Self {
        Self {
            model,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Identifier of the underlying model
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Extract structured metadata from `text`
    ///
    /// Fails with `ModelInvocation` when the call fails and with
    /// `SchemaValidation` when the answer does not fit `schema`; both carry
    /// the underlying message.
    pub async fn extract(
        &self,
        text: &str,
        schema: &ExtractionSchema,
        system_prompt: &str,
    ) -> Result<StructuredResult, ExtractorError> {
        let request = ModelRequest::new(system_prompt, text, schema.to_json_schema())
            .with_schema_name(schema.name())
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens);

        debug!(
            "Invoking model {} ({} chars, schema {})",
            self.model.model_name(),
            text.len(),
            request.schema_name
        );

        let raw = self.model.generate_structured(&request).await?;

        debug!("Model answered with {} chars", raw.len());

        parse_model_output(&raw, schema)
    }
}
