//! Per-language output schemas
//!
//! A schema is both the JSON Schema sent to the model and the validator the
//! answer is checked against. The decision-type enumeration comes from the
//! language, so schema and record validation cannot drift apart.

use crate::prompt::system_prompt;
use juris_domain::{is_calendar_date, Language};
use serde::Serialize;
use serde_json::{json, Map, Value};

const SUMMARY_DESCRIPTION: &str = "A concise summary (200-500 words) covering the factual \
    background and key events, the parties involved, the legal issues, the essential procedural \
    history, the main arguments and the legal principles cited.";

const CONCLUSION_DESCRIPTION: &str = "A concise conclusion (100-300 words) covering the decision \
    or outcome, orders or relief granted, conditions or limitations, deadlines and appeal rights \
    if mentioned.";

const DATE_DESCRIPTION: &str = "Date of the decision in YYYY-MM-DD format (date only, no time), \
    or null if the document states none.";

const NULLABLE_FIELDS: [&str; 4] = ["dateOfDecision", "office", "court", "caseNumber"];

const REQUIRED_TEXT_FIELDS: [&str; 3] = ["title", "summary", "conclusion"];

/// A validated model answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResult {
    /// Document title
    pub title: String,
    /// Decision date (`YYYY-MM-DD`)
    pub date_of_decision: Option<String>,
    /// Administrative office
    pub office: Option<String>,
    /// Court
    pub court: Option<String>,
    /// Case number
    pub case_number: Option<String>,
    /// Summary
    pub summary: String,
    /// Conclusion
    pub conclusion: String,
    /// Decision type from the language's enumeration
    pub decision_type: String,
}

/// Output schema for one language
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSchema {
    language: Language,
}

impl ExtractionSchema {
    /// Schema for `language`
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Language the schema belongs to
    pub fn language(&self) -> Language {
        self.language
    }

    /// Name reported to the model provider
    pub fn name(&self) -> String {
        format!("legal_extraction_{}", self.language.code())
    }

    /// JSON Schema document sent with the model request
    pub fn to_json_schema(&self) -> Value {
        let nullable = |description: Option<&str>| {
            let mut field = json!({ "type": ["string", "null"] });
            if let Some(description) = description {
                field["description"] = json!(description);
            }
            field
        };

        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "dateOfDecision": nullable(Some(DATE_DESCRIPTION)),
                "office": nullable(None),
                "court": nullable(None),
                "caseNumber": nullable(None),
                "summary": { "type": "string", "description": SUMMARY_DESCRIPTION },
                "conclusion": { "type": "string", "description": CONCLUSION_DESCRIPTION },
                "decisionType": { "type": "string", "enum": self.language.decision_types() },
            },
            "required": [
                "title", "dateOfDecision", "office", "court", "caseNumber",
                "summary", "conclusion", "decisionType"
            ],
            "additionalProperties": false,
        })
    }

    /// Check a model answer against the schema
    ///
    /// Every violation is reported, separated by `; `. Unknown keys are
    /// ignored.
    pub fn validate(&self, value: &Value) -> Result<StructuredResult, String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, got {}", type_name(value)))?;

        let mut issues = Vec::new();

        for field in REQUIRED_TEXT_FIELDS {
            match object.get(field) {
                Some(Value::String(_)) => {}
                Some(other) => issues.push(format!("{}: expected string, got {}", field, type_name(other))),
                None => issues.push(format!("{}: required", field)),
            }
        }

        for field in NULLABLE_FIELDS {
            match object.get(field) {
                Some(Value::String(_)) | Some(Value::Null) => {}
                Some(other) => issues.push(format!(
                    "{}: expected string or null, got {}",
                    field,
                    type_name(other)
                )),
                None => issues.push(format!("{}: required (use null when absent)", field)),
            }
        }

        if let Some(Value::String(date)) = object.get("dateOfDecision") {
            if !is_calendar_date(date) {
                issues.push(format!(
                    "dateOfDecision: '{}' is not a YYYY-MM-DD date (date only, no time)",
                    date
                ));
            }
        }

        match object.get("decisionType") {
            Some(Value::String(decision_type)) if self.language.is_decision_type(decision_type) => {}
            Some(Value::String(decision_type)) => issues.push(format!(
                "decisionType: '{}' is not one of {}",
                decision_type,
                self.language.decision_types().join(", ")
            )),
            Some(other) => issues.push(format!(
                "decisionType: expected string, got {}",
                type_name(other)
            )),
            None => issues.push("decisionType: required".to_string()),
        }

        if !issues.is_empty() {
            return Err(issues.join("; "));
        }

        Ok(StructuredResult {
            title: text(object, "title"),
            date_of_decision: optional_text(object, "dateOfDecision"),
            office: optional_text(object, "office"),
            court: optional_text(object, "court"),
            case_number: optional_text(object, "caseNumber"),
            summary: text(object, "summary"),
            conclusion: text(object, "conclusion"),
            decision_type: text(object, "decisionType"),
        })
    }
}

fn text(object: &Map<String, Value>, field: &str) -> String {
    optional_text(object, field).unwrap_or_default()
}

fn optional_text(object: &Map<String, Value>, field: &str) -> Option<String> {
    object.get(field).and_then(Value::as_str).map(str::to_string)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolves the schema and system prompt for a language
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaRegistry;

impl SchemaRegistry {
    /// Schema and prompt for `language`
    pub fn for_language(&self, language: Language) -> (ExtractionSchema, &'static str) {
        (ExtractionSchema::new(language), system_prompt(language))
    }
}
