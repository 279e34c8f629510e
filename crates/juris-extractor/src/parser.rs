//! Parse raw model output into a structured result

use crate::error::ExtractorError;
use crate::schema::{ExtractionSchema, StructuredResult};
use serde_json::Value;

/// Parse the model's answer and validate it against `schema`
pub fn parse_model_output(
    response: &str,
    schema: &ExtractionSchema,
) -> Result<StructuredResult, ExtractorError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractorError::SchemaValidation(format!("JSON parse error: {}", e)))?;

    schema.validate(&json).map_err(ExtractorError::SchemaValidation)
}

/// Extract JSON from response, handling markdown code blocks
///
/// Constrained decoding normally returns bare JSON, but some providers still
/// wrap it in a fenced block.
fn extract_json(response: &str) -> Result<&str, ExtractorError> {
    let trimmed = response.trim();

    if !trimmed.starts_with("```") {
        return Ok(trimmed);
    }

    // Skip the opening fence line (```json or ```) and the closing fence
    let body = trimmed
        .split_once('\n')
        .map(|(_, rest)| rest)
        .ok_or_else(|| ExtractorError::SchemaValidation("Empty code block".to_string()))?;
    let body = body.trim_end();
    Ok(body.strip_suffix("```").unwrap_or(body).trim())
}
