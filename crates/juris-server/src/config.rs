//! Server configuration
//!
//! Values are resolved in this order: command-line flag, environment
//! variable (a `.env` file is loaded first), TOML file given with
//! `--config`, built-in default. The result is validated once, before the
//! listener binds.

use clap::Parser;
use juris_extractor::{PipelineConfig, DEFAULT_MAX_FILE_SIZE, MIN_CONTEXT_TOKENS, MIN_FILE_SIZE_LIMIT};
use juris_llm::{ollama, openrouter};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default port
pub const DEFAULT_PORT: u16 = 3000;

/// Which model backend serves extractions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// OpenRouter or another OpenAI-compatible API
    #[default]
    #[value(name = "openrouter")]
    OpenRouter,
    /// A local Ollama instance
    Ollama,
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// One or more values are missing or out of range
    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Command-line arguments and their environment fallbacks
#[derive(Debug, Default, Parser)]
#[command(name = "juris-server")]
#[command(version, about = "Structured metadata extraction for legal documents", long_about = None)]
pub struct Cli {
    /// TOML file supplying base values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Storage connection string (e.g. sqlite://juris.db)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Model backend
    #[arg(long, value_enum, env = "MODEL_PROVIDER")]
    pub provider: Option<ModelProvider>,

    /// OpenRouter API key
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_api_key: Option<String>,

    /// Model identifier
    #[arg(long, env = "OPENROUTER_MODEL")]
    pub openrouter_model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENROUTER_BASE_URL")]
    pub openrouter_base_url: Option<String>,

    /// Ollama API endpoint
    #[arg(long, env = "OLLAMA_ENDPOINT")]
    pub ollama_endpoint: Option<String>,

    /// Ollama model name
    #[arg(long, env = "OLLAMA_MODEL")]
    pub ollama_model: Option<String>,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Ceiling for PDF uploads in bytes
    #[arg(long, env = "MAX_FILE_SIZE_PDF")]
    pub max_file_size_pdf: Option<u64>,

    /// Ceiling for HTML uploads in bytes
    #[arg(long, env = "MAX_FILE_SIZE_HTML")]
    pub max_file_size_html: Option<u64>,

    /// Reject documents estimated above this many tokens
    #[arg(long, env = "MAX_CONTEXT_TOKENS")]
    pub max_context_tokens: Option<usize>,

    /// Log filter directive (e.g. info, juris_store=debug)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Values read from a `--config` TOML file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Storage connection string
    pub database_url: Option<String>,
    /// Model backend
    pub provider: Option<ModelProvider>,
    /// OpenRouter API key
    pub openrouter_api_key: Option<String>,
    /// Model identifier
    pub openrouter_model: Option<String>,
    /// API base URL
    pub openrouter_base_url: Option<String>,
    /// Ollama API endpoint
    pub ollama_endpoint: Option<String>,
    /// Ollama model name
    pub ollama_model: Option<String>,
    /// Address to bind
    pub bind_address: Option<String>,
    /// Port
    pub port: Option<u16>,
    /// PDF ceiling in bytes
    pub max_file_size_pdf: Option<u64>,
    /// HTML ceiling in bytes
    pub max_file_size_html: Option<u64>,
    /// Context-token ceiling
    pub max_context_tokens: Option<usize>,
    /// Log filter directive
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Load a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Fully resolved server configuration
#[derive(Clone, PartialEq)]
pub struct ServerConfig {
    /// Storage connection string
    pub database_url: String,

    /// Model backend
    pub provider: ModelProvider,

    /// OpenRouter API key
    pub openrouter_api_key: String,

    /// OpenRouter model identifier
    pub openrouter_model: String,

    /// API base URL
    pub openrouter_base_url: String,

    /// Ollama API endpoint
    pub ollama_endpoint: String,

    /// Ollama model name
    pub ollama_model: String,

    /// Address to bind
    pub bind_address: String,

    /// Port
    pub port: u16,

    /// Ceiling for PDF uploads in bytes
    pub max_file_size_pdf: u64,

    /// Ceiling for HTML uploads in bytes
    pub max_file_size_html: u64,

    /// Context-token ceiling
    pub max_context_tokens: Option<usize>,

    /// Log filter directive
    pub log_level: Option<String>,
}

// Keeps the API key out of logs
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_url", &self.database_url)
            .field("provider", &self.provider)
            .field("openrouter_api_key", &"<redacted>")
            .field("openrouter_model", &self.openrouter_model)
            .field("openrouter_base_url", &self.openrouter_base_url)
            .field("ollama_endpoint", &self.ollama_endpoint)
            .field("ollama_model", &self.ollama_model)
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("max_file_size_pdf", &self.max_file_size_pdf)
            .field("max_file_size_html", &self.max_file_size_html)
            .field("max_context_tokens", &self.max_context_tokens)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ServerConfig {
    /// Resolve and validate the configuration from parsed arguments
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let config = Self::merge(cli, file);
        config.validate()?;
        Ok(config)
    }

    /// Combine arguments with file values, then defaults
    ///
    /// Missing required values become empty strings and are reported by
    /// [`ServerConfig::validate`].
    pub fn merge(cli: Cli, file: FileConfig) -> Self {
        Self {
            database_url: cli.database_url.or(file.database_url).unwrap_or_default(),
            provider: cli.provider.or(file.provider).unwrap_or_default(),
            openrouter_api_key: cli
                .openrouter_api_key
                .or(file.openrouter_api_key)
                .unwrap_or_default(),
            openrouter_model: cli
                .openrouter_model
                .or(file.openrouter_model)
                .unwrap_or_else(|| openrouter::DEFAULT_MODEL.to_string()),
            openrouter_base_url: cli
                .openrouter_base_url
                .or(file.openrouter_base_url)
                .unwrap_or_else(|| openrouter::DEFAULT_BASE_URL.to_string()),
            ollama_endpoint: cli
                .ollama_endpoint
                .or(file.ollama_endpoint)
                .unwrap_or_else(|| ollama::DEFAULT_ENDPOINT.to_string()),
            ollama_model: cli
                .ollama_model
                .or(file.ollama_model)
                .unwrap_or_else(|| ollama::DEFAULT_MODEL.to_string()),
            bind_address: cli
                .bind_address
                .or(file.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            max_file_size_pdf: cli
                .max_file_size_pdf
                .or(file.max_file_size_pdf)
                .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            max_file_size_html: cli
                .max_file_size_html
                .or(file.max_file_size_html)
                .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            max_context_tokens: cli.max_context_tokens.or(file.max_context_tokens),
            log_level: cli.log_level.or(file.log_level),
        }
    }

    /// Check every value, reporting all violations together
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.database_url.trim().is_empty() {
            problems.push("DATABASE_URL is required".to_string());
        }
        match self.provider {
            ModelProvider::OpenRouter => {
                if self.openrouter_api_key.trim().is_empty() {
                    problems.push("OPENROUTER_API_KEY is required".to_string());
                }
                if self.openrouter_model.trim().is_empty() {
                    problems.push("OPENROUTER_MODEL must not be empty".to_string());
                }
                if !is_http_url(&self.openrouter_base_url) {
                    problems.push(format!(
                        "OPENROUTER_BASE_URL must be an http(s) URL, got '{}'",
                        self.openrouter_base_url
                    ));
                }
            }
            ModelProvider::Ollama => {
                if self.ollama_model.trim().is_empty() {
                    problems.push("OLLAMA_MODEL must not be empty".to_string());
                }
                if !is_http_url(&self.ollama_endpoint) {
                    problems.push(format!(
                        "OLLAMA_ENDPOINT must be an http(s) URL, got '{}'",
                        self.ollama_endpoint
                    ));
                }
            }
        }
        if self.port == 0 {
            problems.push("PORT must be at least 1".to_string());
        }
        if self.max_file_size_pdf < MIN_FILE_SIZE_LIMIT {
            problems.push(format!(
                "MAX_FILE_SIZE_PDF must be at least {} bytes",
                MIN_FILE_SIZE_LIMIT
            ));
        }
        if self.max_file_size_html < MIN_FILE_SIZE_LIMIT {
            problems.push(format!(
                "MAX_FILE_SIZE_HTML must be at least {} bytes",
                MIN_FILE_SIZE_LIMIT
            ));
        }
        if matches!(self.max_context_tokens, Some(tokens) if tokens < MIN_CONTEXT_TOKENS) {
            problems.push(format!(
                "MAX_CONTEXT_TOKENS must be at least {}",
                MIN_CONTEXT_TOKENS
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Model identifier of the selected provider
    pub fn model_name(&self) -> &str {
        match self.provider {
            ModelProvider::OpenRouter => &self.openrouter_model,
            ModelProvider::Ollama => &self.ollama_model,
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Pipeline settings derived from this configuration
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_file_size_pdf: self.max_file_size_pdf,
            max_file_size_html: self.max_file_size_html,
            max_context_tokens: self.max_context_tokens,
            ..PipelineConfig::default()
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn required() -> Cli {
        Cli {
            database_url: Some("sqlite::memory:".to_string()),
            openrouter_api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::merge(required(), FileConfig::default());
        assert_eq!(config.openrouter_model, "openai/gpt-5");
        assert_eq!(config.openrouter_base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.max_file_size_pdf, 10 * 1024 * 1024);
        assert_eq!(config.max_file_size_html, 10 * 1024 * 1024);
        assert_eq!(config.max_context_tokens, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_arguments_override_file() {
        let file = FileConfig {
            database_url: Some("sqlite://file.db".to_string()),
            port: Some(9000),
            max_file_size_pdf: Some(4096),
            ..Default::default()
        };
        let cli = Cli {
            port: Some(8080),
            ..required()
        };

        let config = ServerConfig::merge(cli, file);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_file_size_pdf, 4096);
    }

    #[test]
    fn test_all_violations_reported() {
        let cli = Cli {
            port: Some(0),
            max_file_size_html: Some(10),
            max_context_tokens: Some(5),
            ..Default::default()
        };
        let config = ServerConfig::merge(cli, FileConfig::default());

        match config.validate() {
            Err(ConfigError::Invalid(problems)) => {
                assert_eq!(problems.len(), 5);
                assert!(problems[0].contains("DATABASE_URL"));
                assert!(problems[1].contains("OPENROUTER_API_KEY"));
                assert!(problems.iter().any(|p| p.contains("PORT")));
                assert!(problems.iter().any(|p| p.contains("MAX_FILE_SIZE_HTML")));
                assert!(problems.iter().any(|p| p.contains("MAX_CONTEXT_TOKENS")));
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            database_url = "sqlite://juris.db"
            openrouter_api_key = "sk-file"
            port = 4000
            max_context_tokens = 120000
            "#
        )
        .unwrap();

        let loaded = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.port, Some(4000));

        let config = ServerConfig::merge(Cli::default(), loaded);
        assert_eq!(config.database_url, "sqlite://juris.db");
        assert_eq!(config.max_context_tokens, Some(120000));
        assert_eq!(config.pipeline_config().max_context_tokens, Some(120000));
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("jwt_secret = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "juris-server",
            "--database-url",
            "sqlite://flags.db",
            "--port",
            "8081",
            "--max-file-size-pdf",
            "2048",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("sqlite://flags.db"));
        assert_eq!(cli.port, Some(8081));
        assert_eq!(cli.max_file_size_pdf, Some(2048));
    }

    #[test]
    fn test_ollama_needs_no_api_key() {
        let cli = Cli {
            database_url: Some("sqlite::memory:".to_string()),
            provider: Some(ModelProvider::Ollama),
            ..Default::default()
        };
        let config = ServerConfig::merge(cli, FileConfig::default());
        assert_eq!(config.ollama_endpoint, "http://localhost:11434");
        assert_eq!(config.model_name(), "llama3.1");
        assert!(config.validate().is_ok());

        let broken = ServerConfig {
            ollama_endpoint: "localhost:11434".to_string(),
            ..config
        };
        match broken.validate() {
            Err(ConfigError::Invalid(problems)) => {
                assert_eq!(problems.len(), 1);
                assert!(problems[0].contains("OLLAMA_ENDPOINT"));
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_provider_from_flag_and_file() {
        let cli = Cli::try_parse_from(["juris-server", "--provider", "ollama"]).unwrap();
        assert_eq!(cli.provider, Some(ModelProvider::Ollama));
        assert!(Cli::try_parse_from(["juris-server", "--provider", "bedrock"]).is_err());

        let file: FileConfig =
            toml::from_str("provider = \"ollama\"\nollama_model = \"mistral\"").unwrap();
        let config = ServerConfig::merge(Cli::default(), file);
        assert_eq!(config.provider, ModelProvider::Ollama);
        assert_eq!(config.model_name(), "mistral");

        let default = ServerConfig::merge(required(), FileConfig::default());
        assert_eq!(default.provider, ModelProvider::OpenRouter);
        assert_eq!(default.model_name(), "openai/gpt-5");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ServerConfig::merge(required(), FileConfig::default());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains("<redacted>"));
    }
}
