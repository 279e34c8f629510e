//! Record module - the persisted result of one extraction

use crate::date::validate_calendar_date;
use crate::{DomainError, Language};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Unique identifier for a record based on UUIDv7
///
/// UUIDv7 identifiers sort by creation time, which makes them a stable
/// tiebreaker when several records share a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    /// Generate a new UUIDv7-based RecordId
    ///
    /// # Examples
    ///
    /// ```
    /// use juris_domain::RecordId;
    ///
    /// let a = RecordId::new();
    /// let b = RecordId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a RecordId from its hyphenated string form
    pub fn parse(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid record id '{}': {}", s, e))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of document a record was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    /// `text/html`
    Html,
    /// `application/pdf`
    Pdf,
}

impl FileType {
    /// Resolve a declared media type
    ///
    /// Parameters such as `; charset=utf-8` are ignored and the comparison is
    /// case-insensitive. Anything other than HTML or PDF is rejected.
    pub fn from_media_type(media_type: &str) -> Result<Self, DomainError> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/html" => Ok(FileType::Html),
            "application/pdf" => Ok(FileType::Pdf),
            _ => Err(DomainError::UnsupportedMediaType(media_type.to_string())),
        }
    }

    /// Canonical media type
    pub fn media_type(&self) -> &'static str {
        match self {
            FileType::Html => "text/html",
            FileType::Pdf => "application/pdf",
        }
    }

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Html => "HTML",
            FileType::Pdf => "PDF",
        }
    }

    /// Parse the storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HTML" => Some(FileType::Html),
            "PDF" => Some(FileType::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured metadata extracted from one legal document
///
/// Records are written once at creation and afterwards only through an
/// explicit [`ExtractionUpdate`], which also refreshes `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    /// Unique identifier
    pub id: RecordId,

    /// Kind of the uploaded document
    pub file_type: FileType,

    /// File name as uploaded, if known
    pub original_file_name: Option<String>,

    /// Identifier of the model that produced the record
    pub source: String,

    /// Document title as written in the document
    pub title: String,

    /// Concise summary of the case
    pub summary: String,

    /// Outcome and orders
    pub conclusion: String,

    /// One of the language's decision types
    pub decision_type: String,

    /// `YYYY-MM-DD`, when the document states one
    pub date_of_decision: Option<String>,

    /// Administrative office, if any
    pub office: Option<String>,

    /// Court, if any
    pub court: Option<String>,

    /// Case number, if any
    pub case_number: Option<String>,

    /// Language that selected the schema and prompt
    pub language: Language,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last correction time (equals `created_at` until updated)
    pub updated_at: DateTime<Utc>,
}

/// A record candidate produced by the pipeline, before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct NewExtraction {
    /// Kind of the uploaded document
    pub file_type: FileType,
    /// File name as uploaded
    pub original_file_name: Option<String>,
    /// Model identifier
    pub source: String,
    /// Title
    pub title: String,
    /// Summary
    pub summary: String,
    /// Conclusion
    pub conclusion: String,
    /// Decision type
    pub decision_type: String,
    /// Decision date
    pub date_of_decision: Option<String>,
    /// Office
    pub office: Option<String>,
    /// Court
    pub court: Option<String>,
    /// Case number
    pub case_number: Option<String>,
    /// Detected language
    pub language: Language,
}

impl NewExtraction {
    /// Check the record invariants: date pattern and decision-type membership
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(date) = &self.date_of_decision {
            validate_calendar_date("dateOfDecision", date)?;
        }
        self.language.validate_decision_type(&self.decision_type)
    }

    /// Assign an identifier and timestamps
    pub fn into_record(self, now: DateTime<Utc>) -> ExtractionRecord {
        ExtractionRecord {
            id: RecordId::new(),
            file_type: self.file_type,
            original_file_name: self.original_file_name,
            source: self.source,
            title: self.title,
            summary: self.summary,
            conclusion: self.conclusion,
            decision_type: self.decision_type,
            date_of_decision: self.date_of_decision,
            office: self.office,
            court: self.court,
            case_number: self.case_number,
            language: self.language,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A correction replacing a subset of a record's extracted fields
///
/// For the nullable fields the outer `Option` says whether the field is
/// touched and the inner one carries the new value, so an explicit JSON
/// `null` clears the field while an absent key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExtractionUpdate {
    /// New title
    #[serde(default)]
    pub title: Option<String>,

    /// New decision type
    #[serde(default)]
    pub decision_type: Option<String>,

    /// New decision date, or `Some(None)` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub date_of_decision: Option<Option<String>>,

    /// New office, or `Some(None)` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub office: Option<Option<String>>,

    /// New court, or `Some(None)` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub court: Option<Option<String>>,

    /// New case number, or `Some(None)` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub case_number: Option<Option<String>>,

    /// New summary
    #[serde(default)]
    pub summary: Option<String>,

    /// New conclusion
    #[serde(default)]
    pub conclusion: Option<String>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ExtractionUpdate {
    /// Whether the update touches no field at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.decision_type.is_none()
            && self.date_of_decision.is_none()
            && self.office.is_none()
            && self.court.is_none()
            && self.case_number.is_none()
            && self.summary.is_none()
            && self.conclusion.is_none()
    }

    /// Validate the update against the language of the record it targets
    pub fn validate(&self, language: Language) -> Result<(), DomainError> {
        for (name, value) in [
            ("title", &self.title),
            ("summary", &self.summary),
            ("conclusion", &self.conclusion),
            ("decisionType", &self.decision_type),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(DomainError::EmptyField(name));
            }
        }

        if let Some(decision_type) = &self.decision_type {
            language.validate_decision_type(decision_type)?;
        }

        if let Some(Some(date)) = &self.date_of_decision {
            validate_calendar_date("dateOfDecision", date)?;
        }

        Ok(())
    }

    /// Apply the touched fields to `record` and refresh `updated_at`
    pub fn apply(&self, record: &mut ExtractionRecord, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(decision_type) = &self.decision_type {
            record.decision_type = decision_type.clone();
        }
        if let Some(date) = &self.date_of_decision {
            record.date_of_decision = date.clone();
        }
        if let Some(office) = &self.office {
            record.office = office.clone();
        }
        if let Some(court) = &self.court {
            record.court = court.clone();
        }
        if let Some(case_number) = &self.case_number {
            record.case_number = case_number.clone();
        }
        if let Some(summary) = &self.summary {
            record.summary = summary.clone();
        }
        if let Some(conclusion) = &self.conclusion {
            record.conclusion = conclusion.clone();
        }
        record.updated_at = now;
    }
}
