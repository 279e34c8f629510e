//! Text extraction from uploaded documents

use crate::error::ParseError;
use juris_domain::FileType;
use lol_html::{doc_comments, element, rewrite_str, RewriteStrSettings};
use regex::Regex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;

/// Elements dropped together with everything inside them
const REMOVED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "iframe", "embed", "object", "link",
];

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("whitespace pattern is valid"));

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline pattern is valid"));

/// Converts a raw document into text for the model
pub trait TextExtractor: Send + Sync {
    /// Extract text from `bytes` of the given type
    fn extract(&self, bytes: &[u8], file_type: FileType) -> Result<String, ParseError>;
}

/// Default extractor: `lol_html` cleanup for HTML and `pdf-extract` for PDFs
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTextExtractor;

impl TextExtractor for DocumentTextExtractor {
    fn extract(&self, bytes: &[u8], file_type: FileType) -> Result<String, ParseError> {
        match file_type {
            FileType::Html => extract_html(bytes),
            FileType::Pdf => extract_pdf(bytes),
        }
    }
}

/// Strip scripts, styles and embedded objects plus inline `style` attributes
///
/// The remaining markup is kept; the model reads headings and tables better
/// with it than without.
pub fn extract_html(bytes: &[u8]) -> Result<String, ParseError> {
    let html = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::Html(format!("document is not valid UTF-8: {}", e)))?;
    Ok(normalize_whitespace(&clean_html(html)?))
}

/// Remove unwanted subtrees, comments and `style` attributes
///
/// The document is tokenized the way a browser would, so a closing tag
/// inside a script string or fallback content inside an `<object>` goes
/// with its element.
fn clean_html(html: &str) -> Result<String, ParseError> {
    let mut element_content_handlers: Vec<_> = REMOVED_ELEMENTS
        .iter()
        .map(|tag| {
            element!(*tag, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();
    element_content_handlers.push(element!("*", |el| {
        el.remove_attribute("style");
        Ok(())
    }));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers,
            document_content_handlers: vec![doc_comments!(|comment| {
                comment.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ParseError::Html(e.to_string()))
}

/// Extract the embedded text of a PDF
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ParseError> {
    // pdf-extract panics on some malformed input instead of returning an error
    let text = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| ParseError::Pdf("malformed document".to_string()))?
        .map_err(|e| ParseError::Pdf(e.to_string()))?;
    Ok(normalize_whitespace(&text))
}

/// Normalise line endings and collapse whitespace runs
///
/// `\r\n` and `\r` become `\n`, runs of spaces and tabs become one space,
/// three or more newlines become two, and the result is trimmed.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}



#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_text_has_no_long_runs(input in "[ a-z\t\r\n]{0,200}") {
            let out = normalize_whitespace(&input);
            prop_assert!(!out.contains("\n\n\n"));
            prop_assert!(!out.contains("  "));
            prop_assert!(!out.contains('\t'));
            prop_assert!(!out.contains('\r'));
            prop_assert_eq!(out.trim(), out.as_str());
        }

        #[test]
        fn normalization_is_idempotent(input in "[ a-z\t\r\n]{0,200}") {
            let once = normalize_whitespace(&input);
            prop_assert_eq!(normalize_whitespace(&once), once);
        }
    }
}
