//! Filtered, sorted, paginated reads
//!
//! Filter values only ever reach SQLite as bound parameters; the SQL text is
//! assembled from fixed column names chosen by enum.

use crate::repository::{record_from_row, RECORD_COLUMNS};
use crate::{RetryingStore, StoreError};
use juris_domain::{
    DomainError, ExtractionFilter, ExtractionRecord, ExtractionSort, Page, PaginationInput,
    SortField, SortOrder, TextField,
};
use rusqlite::types::Value;
use rusqlite::params_from_iter;
use thiserror::Error;
use tracing::debug;

/// Errors from the read path
#[derive(Error, Debug)]
pub enum QueryError {
    /// Caller supplied invalid parameters; nothing was queried
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// The query itself failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn text_column(field: TextField) -> &'static str {
    match field {
        TextField::Court => "court",
        TextField::Office => "office",
        TextField::Language => "language",
        TextField::DecisionType => "decision_type",
        TextField::CaseNumber => "case_number",
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "created_at",
        SortField::DateOfDecision => "date_of_decision",
        SortField::Title => "title",
        SortField::CaseNumber => "case_number",
    }
}

fn direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Build the WHERE clause and its parameters
///
/// Each present criterion contributes one conjunct. Text criteria use
/// case-sensitive containment; `instr` avoids LIKE wildcards in user input.
fn where_clause(filter: &ExtractionFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    for (field, value) in filter.text_predicates() {
        conditions.push(format!("instr({}, ?) > 0", text_column(field)));
        params.push(Value::Text(value.to_string()));
    }

    let (from, to) = filter.date_bounds();
    if let Some(from) = from {
        conditions.push("date_of_decision >= ?".to_string());
        params.push(Value::Text(from.to_string()));
    }
    if let Some(to) = to {
        conditions.push("date_of_decision <= ?".to_string());
        params.push(Value::Text(to.to_string()));
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}

/// Read-side query translation over the record table
#[derive(Clone)]
pub struct QueryEngine {
    store: RetryingStore,
}

impl QueryEngine {
    /// Create a query engine over a retrying store
    pub fn new(store: RetryingStore) -> Self {
        Self { store }
    }

    /// Return one page of records matching `filter`
    ///
    /// Parameters are validated before anything is queried. Count and page
    /// run in the same read transaction so they see the same snapshot.
    pub async fn list(
        &self,
        filter: Option<&ExtractionFilter>,
        sort: Option<&ExtractionSort>,
        pagination: Option<&PaginationInput>,
    ) -> Result<Page<ExtractionRecord>, QueryError> {
        let default_filter = ExtractionFilter::default();
        let filter = filter.unwrap_or(&default_filter);
        filter.validate()?;
        let pagination = PaginationInput::resolve(pagination)?;
        let (field, order) = ExtractionSort::resolve(sort);

        let (where_sql, params) = where_clause(filter);
        let count_sql = format!("SELECT COUNT(*) FROM extractions{}", where_sql);
        let page_sql = format!(
            "SELECT {} FROM extractions{} ORDER BY {} {}, id {} LIMIT ? OFFSET ?",
            RECORD_COLUMNS,
            where_sql,
            sort_column(field),
            direction(order),
            direction(order)
        );

        let mut page_params = params.clone();
        page_params.push(Value::Integer(i64::from(pagination.limit)));
        page_params.push(Value::Integer(
            i64::try_from(pagination.offset).unwrap_or(i64::MAX),
        ));

        debug!("Listing extractions: {}", page_sql);

        let (total, items) = self
            .store
            .read(move |tx| {
                let total: i64 =
                    tx.query_row(&count_sql, params_from_iter(params.iter()), |row| row.get(0))?;

                let mut stmt = tx.prepare(&page_sql)?;
                let items = stmt
                    .query_map(params_from_iter(page_params.iter()), record_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok((total, items))
            })
            .await?;

        Ok(Page::new(items, u64::try_from(total).unwrap_or(0), pagination))
    }
}
