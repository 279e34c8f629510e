//! Extraction record persistence
//!
//! Creation and correction are the only writes; both go through
//! [`RetryingStore`].

use crate::{RetryingStore, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use juris_domain::{ExtractionRecord, ExtractionUpdate, FileType, Language, RecordId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

/// Column list shared by every SELECT, in `record_from_row` order
pub(crate) const RECORD_COLUMNS: &str = "id, file_type, original_file_name, source, title, \
     summary, conclusion, decision_type, date_of_decision, office, court, case_number, \
     language, created_at, updated_at";

/// Persistent store of extraction records
#[derive(Clone)]
pub struct ExtractionRepository {
    store: RetryingStore,
}

impl ExtractionRepository {
    /// Create a repository on top of a retrying store
    pub fn new(store: RetryingStore) -> Self {
        Self { store }
    }

    /// Persist a new record
    ///
    /// The record is fully built before the transaction starts, so a retry
    /// re-inserts exactly the same row.
    pub async fn create(&self, record: &ExtractionRecord) -> Result<(), StoreError> {
        let row = record.clone();
        self.store
            .run_in_transaction(move |tx| insert_record(tx, &row), None)
            .await?;
        info!("Stored extraction {} ({})", record.id, record.file_type);
        Ok(())
    }

    /// Look up a record; `None` when no record has this id
    pub async fn find_by_id(&self, id: RecordId) -> Result<Option<ExtractionRecord>, StoreError> {
        self.store.read(move |tx| fetch_record(tx, id)).await
    }

    /// Apply a correction and return the updated record
    ///
    /// Fails with `NotFound` for an unknown id and with `Invalid` when the
    /// update breaks a record invariant.
    pub async fn update(
        &self,
        id: RecordId,
        update: &ExtractionUpdate,
    ) -> Result<ExtractionRecord, StoreError> {
        let update = update.clone();
        let record = self
            .store
            .run_in_transaction(
                move |tx| {
                    let mut record = fetch_record(tx, id)?
                        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                    update.validate(record.language)?;
                    update.apply(&mut record, Utc::now());
                    write_corrections(tx, &record)?;
                    Ok(record)
                },
                None,
            )
            .await?;
        info!("Updated extraction {}", id);
        Ok(record)
    }
}

fn insert_record(conn: &Connection, record: &ExtractionRecord) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO extractions (id, file_type, original_file_name, source, title, summary,
             conclusion, decision_type, date_of_decision, office, court, case_number, language,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            record.id.to_string(),
            record.file_type.as_str(),
            &record.original_file_name,
            &record.source,
            &record.title,
            &record.summary,
            &record.conclusion,
            &record.decision_type,
            &record.date_of_decision,
            &record.office,
            &record.court,
            &record.case_number,
            record.language.code(),
            format_timestamp(record.created_at),
            format_timestamp(record.updated_at),
        ],
    )?;
    Ok(())
}

fn write_corrections(conn: &Connection, record: &ExtractionRecord) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE extractions SET title = ?2, summary = ?3, conclusion = ?4, decision_type = ?5,
             date_of_decision = ?6, office = ?7, court = ?8, case_number = ?9, updated_at = ?10
         WHERE id = ?1",
        params![
            record.id.to_string(),
            &record.title,
            &record.summary,
            &record.conclusion,
            &record.decision_type,
            &record.date_of_decision,
            &record.office,
            &record.court,
            &record.case_number,
            format_timestamp(record.updated_at),
        ],
    )?;
    Ok(())
}

fn fetch_record(conn: &Connection, id: RecordId) -> Result<Option<ExtractionRecord>, StoreError> {
    let record = conn
        .query_row(
            &format!("SELECT {} FROM extractions WHERE id = ?1", RECORD_COLUMNS),
            params![id.to_string()],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Timestamps are stored as fixed-width RFC 3339 so they sort lexically
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(StoreError::InvalidData(message)),
    )
}

fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, format!("Bad timestamp '{}': {}", value, e)))
}

/// Map a row selected with [`RECORD_COLUMNS`]
pub(crate) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ExtractionRecord> {
    let id: String = row.get(0)?;
    let id = RecordId::parse(&id).map_err(|e| conversion_error(0, e))?;

    let file_type: String = row.get(1)?;
    let file_type = FileType::parse(&file_type)
        .ok_or_else(|| conversion_error(1, format!("Unknown file type: {}", file_type)))?;

    let language: String = row.get(12)?;
    let language = Language::from_code(&language)
        .ok_or_else(|| conversion_error(12, format!("Unknown language: {}", language)))?;

    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;

    Ok(ExtractionRecord {
        id,
        file_type,
        original_file_name: row.get(2)?,
        source: row.get(3)?,
        title: row.get(4)?,
        summary: row.get(5)?,
        conclusion: row.get(6)?,
        decision_type: row.get(7)?,
        date_of_decision: row.get(8)?,
        office: row.get(9)?,
        court: row.get(10)?,
        case_number: row.get(11)?,
        language,
        created_at: parse_timestamp(13, &created_at)?,
        updated_at: parse_timestamp(14, &updated_at)?,
    })
}
