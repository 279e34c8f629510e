//! Configuration for the extraction pipeline

use juris_domain::FileType;
use juris_llm::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};

/// Default ceiling per media type (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Smallest accepted size ceiling
pub const MIN_FILE_SIZE_LIMIT: u64 = 1024;

/// Smallest accepted context-token ceiling
pub const MIN_CONTEXT_TOKENS: usize = 1000;

/// Knobs of the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ceiling for PDF uploads in bytes
    pub max_file_size_pdf: u64,

    /// Ceiling for HTML uploads in bytes
    pub max_file_size_html: u64,

    /// Reject documents whose estimated token count exceeds this
    pub max_context_tokens: Option<usize>,

    /// Sampling temperature for the model call
    pub temperature: f32,

    /// Ceiling on generated tokens
    pub max_output_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_file_size_pdf: DEFAULT_MAX_FILE_SIZE,
            max_file_size_html: DEFAULT_MAX_FILE_SIZE,
            max_context_tokens: None,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl PipelineConfig {
    /// Size ceiling for a file type
    pub fn max_file_size(&self, file_type: FileType) -> u64 {
        match file_type {
            FileType::Html => self.max_file_size_html,
            FileType::Pdf => self.max_file_size_pdf,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_size_pdf < MIN_FILE_SIZE_LIMIT {
            return Err(format!(
                "max_file_size_pdf must be at least {} bytes",
                MIN_FILE_SIZE_LIMIT
            ));
        }
        if self.max_file_size_html < MIN_FILE_SIZE_LIMIT {
            return Err(format!(
                "max_file_size_html must be at least {} bytes",
                MIN_FILE_SIZE_LIMIT
            ));
        }
        if let Some(tokens) = self.max_context_tokens {
            if tokens < MIN_CONTEXT_TOKENS {
                return Err(format!(
                    "max_context_tokens must be at least {}",
                    MIN_CONTEXT_TOKENS
                ));
            }
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
