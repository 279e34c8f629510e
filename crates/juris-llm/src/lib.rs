//! Juris LLM Provider Layer
//!
//! Pluggable model providers for schema-constrained extraction.
//!
//! # Architecture
//!
//! Every provider implements [`StructuredModel`]: given a system prompt, the
//! document text and a JSON schema, return the model's raw JSON answer. Parsing
//! and schema validation belong to the caller, which keeps providers thin.
//!
//! Providers never retry. A model call is billed per request and may have
//! side effects, so resubmission is the caller's decision.
//!
//! # Providers
//!
//! - `OpenRouterProvider`: OpenAI-compatible chat completions (OpenRouter by default)
//! - `OllamaProvider`: Local Ollama API integration
//! - `MockProvider`: Deterministic mock for testing
//!
//! # Examples
//!
//! ```
//! use juris_llm::{MockProvider, ModelRequest, StructuredModel};
//!
//! # async fn example() {
//! let provider = MockProvider::new(r#"{"title": "Order"}"#);
//! let request = ModelRequest::new("system", "document text", serde_json::json!({}));
//! let raw = provider.generate_structured(&request).await.unwrap();
//! assert_eq!(raw, r#"{"title": "Order"}"#);
//! # }
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openrouter;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;

/// Default sampling temperature for extraction
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default ceiling on generated tokens
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8000;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Non-success HTTP status from the provider
    #[error("API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body as returned
        body: String,
    },

    /// Response did not have the expected envelope
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider could not be constructed
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// A single schema-constrained generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Instruction context
    pub system_prompt: String,

    /// Primary input (the document text)
    pub prompt: String,

    /// JSON schema the answer must satisfy
    pub schema: Value,

    /// Name reported to providers that label schemas
    pub schema_name: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Ceiling on generated tokens
    pub max_output_tokens: u32,
}

impl ModelRequest {
    /// Create a request with default sampling parameters
    pub fn new(system_prompt: impl Into<String>, prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            schema,
            schema_name: "extraction".to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Override the schema name
    pub fn with_schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = name.into();
        self
    }

    /// Override the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the output token ceiling
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// A model that answers with JSON constrained to a schema
#[async_trait]
pub trait StructuredModel: Send + Sync {
    /// Identifier of the model, recorded as the source of each extraction
    fn model_name(&self) -> &str;

    /// Run one generation and return the raw answer text
    ///
    /// Called exactly once per request; implementations must not retry.
    async fn generate_structured(&self, request: &ModelRequest) -> Result<String, LlmError>;
}

#[async_trait]
impl<T: StructuredModel + ?Sized> StructuredModel for Arc<T> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    async fn generate_structured(&self, request: &ModelRequest) -> Result<String, LlmError> {
        (**self).generate_structured(request).await
    }
}

/// Mock LLM provider for deterministic testing
///
/// Returns a pre-configured answer without any network calls, counts
/// invocations and remembers the last request. Clones share state.
///
/// # Examples
///
/// ```
/// use juris_llm::MockProvider;
///
/// let provider = MockProvider::new("{}");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model_name: String,
    outcome: Arc<Mutex<Result<String, LlmError>>>,
    call_count: Arc<Mutex<usize>>,
    last_request: Arc<Mutex<Option<ModelRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a MockProvider answering every request with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model_name: "mock/model".to_string(),
            outcome: Arc::new(Mutex::new(Ok(response.into()))),
            call_count: Arc::new(Mutex::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a MockProvider that fails every request with `error`
    pub fn failing(error: LlmError) -> Self {
        let provider = Self::new("");
        *lock(&provider.outcome) = Err(error);
        provider
    }

    /// Set the model name reported as the record source
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Replace the answer returned from now on
    pub fn set_response(&self, response: impl Into<String>) {
        *lock(&self.outcome) = Ok(response.into());
    }

    /// Get the number of times the model was invoked
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<ModelRequest> {
        lock(&self.last_request).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl StructuredModel for MockProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate_structured(&self, request: &ModelRequest) -> Result<String, LlmError> {
        *lock(&self.call_count) += 1;
        *lock(&self.last_request) = Some(request.clone());
        lock(&self.outcome).clone()
    }
}
