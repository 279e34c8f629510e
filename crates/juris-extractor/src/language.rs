//! Document language detection

use juris_domain::Language;
use regex::Regex;
use std::sync::LazyLock;
use whatlang::Lang;

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Classifies text into a supported language
///
/// Total and deterministic: empty text, undetectable text and languages
/// outside the allow-list all yield [`Language::DEFAULT`].
#[derive(Debug, Clone, Copy)]
pub struct LanguageDetector {
    fallback: Language,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self {
            fallback: Language::DEFAULT,
        }
    }
}

impl LanguageDetector {
    /// Detector falling back to `fallback` instead of the default language
    pub fn with_fallback(fallback: Language) -> Self {
        Self { fallback }
    }

    /// Language returned when detection does not land in the allow-list
    pub fn fallback(&self) -> Language {
        self.fallback
    }

    /// Detect the language of `text`
    pub fn detect(&self, text: &str) -> Language {
        // Cleaned HTML keeps its tags; only the prose is informative
        let prose = MARKUP.replace_all(text, " ");
        if prose.trim().is_empty() {
            return self.fallback;
        }

        whatlang::detect(&prose)
            .and_then(|info| allowed(info.lang()))
            .unwrap_or(self.fallback)
    }
}

/// The allow-list of detector results
fn allowed(lang: Lang) -> Option<Language> {
    match lang {
        Lang::Eng => Some(Language::English),
        Lang::Dan => Some(Language::Danish),
        _ => None,
    }
}
