//! Language module - the closed set of supported document languages

use crate::DomainError;
use serde::{Deserialize, Serialize};

/// A language with its own extraction schema and system prompt
///
/// Adding a language means adding a variant here together with its decision
/// types, schema and prompt; the exhaustive matches keep them in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English (`en`)
    #[serde(rename = "en")]
    English,

    /// Danish (`da`)
    #[serde(rename = "da")]
    Danish,
}

/// Decision types for English documents
const ENGLISH_DECISION_TYPES: &[&str] =
    &["JUDGMENT", "ORDER", "RULING", "OPINION", "DECISION", "OTHER"];

/// Decision types for Danish documents
const DANISH_DECISION_TYPES: &[&str] = &["DOM", "KENDELSE", "BESLUTNING", "AFGØRELSE", "ANDET"];

impl Language {
    /// Every supported language
    pub const ALL: [Language; 2] = [Language::English, Language::Danish];

    /// Language used when detection is impossible or lands outside the allow-list
    pub const DEFAULT: Language = Language::Danish;

    /// Two-letter code stored on records
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Danish => "da",
        }
    }

    /// Parse a two-letter code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" => Some(Language::English),
            "da" => Some(Language::Danish),
            _ => None,
        }
    }

    /// The closed enumeration of `decisionType` values for this language
    pub fn decision_types(&self) -> &'static [&'static str] {
        match self {
            Language::English => ENGLISH_DECISION_TYPES,
            Language::Danish => DANISH_DECISION_TYPES,
        }
    }

    /// Whether `value` is one of this language's decision types
    pub fn is_decision_type(&self, value: &str) -> bool {
        self.decision_types().contains(&value)
    }

    /// Validate a decision type against this language's enumeration
    pub fn validate_decision_type(&self, value: &str) -> Result<(), DomainError> {
        if self.is_decision_type(value) {
            Ok(())
        } else {
            Err(DomainError::InvalidDecisionType {
                value: value.to_string(),
                language: self.code(),
            })
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| DomainError::UnsupportedLanguage(s.to_string()))
    }
}
