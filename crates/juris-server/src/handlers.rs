//! HTTP request handlers
//!
//! Upload, listing, lookup, correction and health endpoints using axum.

use crate::error::AppError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        multipart::MultipartRejection,
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use juris_domain::{
    ExtractionFilter, ExtractionRecord, ExtractionSort, ExtractionUpdate, Page, PaginationInput,
    RecordId, SortField, SortOrder,
};
use juris_extractor::{ExtractionOrchestrator, PipelineConfig};
use juris_llm::StructuredModel;
use juris_store::{Database, ExtractionRepository, QueryEngine, RetryingStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Room for multipart framing on top of the largest file ceiling
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// The pipeline as shared by the handlers
pub type Orchestrator = ExtractionOrchestrator<Arc<dyn StructuredModel>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Upload pipeline
    pub orchestrator: Arc<Orchestrator>,
    /// Lookup and correction of records
    pub repository: ExtractionRepository,
    /// Filtered listing
    pub queries: QueryEngine,
    /// Connection handle, for health checks
    pub database: Database,
}

impl AppState {
    /// Wire the components around one model and one store
    pub fn new(model: Arc<dyn StructuredModel>, store: RetryingStore, pipeline: PipelineConfig) -> Self {
        let repository = ExtractionRepository::new(store.clone());
        Self {
            orchestrator: Arc::new(ExtractionOrchestrator::new(
                model,
                repository.clone(),
                pipeline,
            )),
            repository,
            queries: QueryEngine::new(store.clone()),
            database: store.database().clone(),
        }
    }
}

/// Query string of the listing endpoint
///
/// Kept flat because query strings carry no nesting.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Substring of the court
    pub court: Option<String>,
    /// Substring of the office
    pub office: Option<String>,
    /// Substring of the language code
    pub language: Option<String>,
    /// Substring of the decision type
    pub decision_type: Option<String>,
    /// Substring of the case number
    pub case_number: Option<String>,
    /// Inclusive lower date bound
    pub date_from: Option<String>,
    /// Inclusive upper date bound
    pub date_to: Option<String>,
    /// Field to sort on
    pub sort_field: Option<SortField>,
    /// Sort direction
    pub sort_order: Option<SortOrder>,
    /// Page size
    pub limit: Option<i64>,
    /// Items to skip
    pub offset: Option<i64>,
}

impl ListParams {
    /// Split into the filter, sort and pagination inputs
    pub fn into_parts(self) -> (ExtractionFilter, ExtractionSort, PaginationInput) {
        let filter = ExtractionFilter {
            court: self.court,
            office: self.office,
            language: self.language,
            decision_type: self.decision_type,
            case_number: self.case_number,
            date_from: self.date_from,
            date_to: self.date_to,
        };
        let sort = ExtractionSort {
            field: self.sort_field,
            order: self.sort_order,
        };
        let pagination = PaginationInput {
            limit: self.limit,
            offset: self.offset,
        };
        (filter, sort, pagination)
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Storage reachability
    pub database: String,
}

/// POST /api/extractions/upload - Extract and store one document
///
/// Expects multipart form data with the document in the `file` field; the
/// part's content type is the declared media type.
async fn upload_extraction(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ExtractionRecord>), AppError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Upload is not multipart: {}", e);
        no_file()
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let media_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e.body_text())))?;

        info!(
            "Received file upload request: {}",
            file_name.as_deref().unwrap_or("<unnamed>")
        );

        let record = state
            .orchestrator
            .process(&bytes, &media_type, bytes.len() as u64, file_name.as_deref())
            .await?;

        return Ok((StatusCode::CREATED, Json(record)));
    }

    Err(no_file())
}

fn no_file() -> AppError {
    warn!("File upload request received without file");
    AppError::BadRequest("No file uploaded".to_string())
}

/// GET /api/extractions - Filtered, sorted, paginated listing
async fn list_extractions(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<ExtractionRecord>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (filter, sort, pagination) = params.into_parts();

    let page = state
        .queries
        .list(Some(&filter), Some(&sort), Some(&pagination))
        .await?;

    Ok(Json(page))
}

/// GET /api/extractions/:id - One record
async fn get_extraction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExtractionRecord>, AppError> {
    let record = match RecordId::parse(&id) {
        Ok(record_id) => state.repository.find_by_id(record_id).await?,
        Err(_) => None,
    };

    record
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Extraction with ID {} not found", id)))
}

/// PATCH /api/extractions/:id - Correct extracted fields
async fn update_extraction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    update: Result<Json<ExtractionUpdate>, JsonRejection>,
) -> Result<Json<ExtractionRecord>, AppError> {
    let Json(update) = update.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let record_id = RecordId::parse(&id)
        .map_err(|_| AppError::NotFound(format!("Extraction with ID {} not found", id)))?;

    let record = state.repository.update(record_id, &update).await?;
    info!("Extraction {} corrected", record.id);

    Ok(Json(record))
}

/// GET /health - Storage reachability
async fn health_check(State(state): State<AppState>) -> Response {
    match state.database.ping().await {
        Ok(()) => Json(HealthCheckResponse {
            status: "healthy".to_string(),
            database: "up".to_string(),
        })
        .into_response(),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthCheckResponse {
                    status: "unhealthy".to_string(),
                    database: "down".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Create the axum router with all routes
///
/// The request body limit follows the largest configured file ceiling, so
/// oversized documents reach the pipeline and get its size error.
pub fn create_router(state: AppState) -> AxumRouter {
    let config = state.orchestrator.config();
    let largest = config.max_file_size_pdf.max(config.max_file_size_html);
    let body_limit = usize::try_from(largest)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    AxumRouter::new()
        .route("/api/extractions/upload", post(upload_extraction))
        .route("/api/extractions", get(list_extractions))
        .route(
            "/api/extractions/:id",
            get(get_extraction).patch(update_extraction),
        )
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
