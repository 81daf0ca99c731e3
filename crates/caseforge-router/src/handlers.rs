//! HTTP request handlers.
//!
//! Sessions, document upload and generation, AI-assisted editing, file downloads,
//! tracker export and history browsing, served with axum.

use crate::cache::DocumentCache;
use crate::config::ServerConfig;
use crate::session::{SessionError, SessionManager};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use caseforge_domain::traits::{HistoryStore, LlmProvider};
use caseforge_domain::TestCaseRecord;
use caseforge_export::{export, export_to_tracker, ExportError, ExportFormat, JiraClient, ZephyrClient};
use caseforge_extractor::{extract_document, DocumentError, ExtractorError, Pipeline, TestCaseEditor};
use caseforge_store::{save_with_confirmation, SqliteHistoryStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Room for multipart framing and form fields on top of the document itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const MISSING_JIRA_FIELDS: &str = "One or more Jira configuration fields were missing.";

/// Shared application state
pub struct AppState<L: LlmProvider + 'static> {
    /// Session manager for JWT token operations
    pub sessions: Arc<SessionManager>,
    /// Last extracted document per session
    pub documents: DocumentCache,
    /// Generation and quality-check pipeline
    pub pipeline: Arc<Pipeline<L>>,
    /// Bulk editor
    pub editor: Arc<TestCaseEditor<L>>,
    /// Saved batches; `None` when history is disabled
    pub history: Option<Arc<Mutex<SqliteHistoryStore>>>,
    /// Model name reported by the health check
    pub model: String,
    /// Largest accepted upload (bytes)
    pub max_document_bytes: usize,
}

impl<L: LlmProvider + 'static> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            documents: self.documents.clone(),
            pipeline: Arc::clone(&self.pipeline),
            editor: Arc::clone(&self.editor),
            history: self.history.clone(),
            model: self.model.clone(),
            max_document_bytes: self.max_document_bytes,
        }
    }
}

impl<L: LlmProvider + 'static> AppState<L> {
    /// Build state around one shared provider
    pub fn new(llm: Arc<L>, config: &ServerConfig) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(&config.jwt_secret, config.token_expiry_secs)),
            documents: DocumentCache::from_settings(&config.cache),
            pipeline: Arc::new(Pipeline::new(
                Arc::clone(&llm),
                &config.pipeline,
                config.quality.clone(),
            )),
            editor: Arc::new(TestCaseEditor::new(llm)),
            history: None,
            model: config.llm.model.clone(),
            max_document_bytes: config.pipeline.max_document_bytes,
        }
    }

    /// Enable history with the given store
    pub fn with_history(mut self, store: SqliteHistoryStore) -> Self {
        self.history = Some(Arc::new(Mutex::new(store)));
        self
    }

    /// Save a batch off the async workers; SQLite calls block
    async fn save_history(&self, session_id: &str, records: &[TestCaseRecord]) -> Vec<String> {
        let history = self.history.clone();
        let session_id = session_id.to_string();
        let records = records.to_vec();

        let confirmation = tokio::task::spawn_blocking(move || match history {
            Some(store) => {
                let mut guard = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                save_with_confirmation(Some(&mut *guard), &session_id, &records)
            }
            None => save_with_confirmation::<SqliteHistoryStore>(None, &session_id, &records),
        })
        .await
        .unwrap_or_else(|e| format!("Error saving to history: {}", e));
        vec![confirmation]
    }

    fn history_store(&self) -> Result<Arc<Mutex<SqliteHistoryStore>>, AppError> {
        self.history
            .clone()
            .ok_or_else(|| AppError::Unavailable("History store not configured.".to_string()))
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Model used for generation and checks
    pub model: String,
    /// Whether batches can be saved
    pub history_enabled: bool,
}

/// Session establishment response
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    /// JWT session token, sent back as `Authorization: Bearer <token>`
    pub token: String,
}

/// Result of processing an uploaded document
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Text extracted from the upload
    pub extracted_text: String,
    /// Generated and assessed records
    pub test_cases: Vec<TestCaseRecord>,
    /// History save outcome, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_confirmations: Option<Vec<String>>,
    /// Tracker export outcomes, when auto-export ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_confirmations: Option<Vec<String>>,
    /// Why auto-export did not run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_error: Option<String>,
}

/// Bulk edit request
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    /// Free-text instruction
    #[serde(default)]
    pub prompt: String,
    /// Current records
    #[serde(default)]
    pub test_cases: Vec<TestCaseRecord>,
}

/// A list of records, as returned by edit and accepted by download
#[derive(Debug, Serialize, Deserialize)]
pub struct TestCasesBody {
    /// Records
    #[serde(default)]
    pub test_cases: Vec<TestCaseRecord>,
}

/// Download query string
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// `csv`, `xlsx`, `pdf` or `txt` (default)
    pub format: Option<String>,
}

/// Manual tracker export request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackerExportRequest {
    /// Jira server URL
    pub server: String,
    /// Account email
    pub email: String,
    /// API token
    pub token: String,
    /// Target project
    pub project_key: String,
    /// Records to export
    pub test_cases: Vec<TestCaseRecord>,
    /// Create linked Zephyr Scale test cases
    pub is_zephyr_api_integration: bool,
    /// Zephyr Scale API token
    pub zephyr_api_token: Option<String>,
    /// Also save the records to history
    pub save_to_history: bool,
}

/// Manual tracker export response
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackerExportResponse {
    /// One line per created issue or failure
    pub confirmations: Vec<String>,
    /// History save outcome, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_confirmations: Option<Vec<String>>,
}

/// One saved batch
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Batch id
    pub id: String,
    /// Unix timestamp of the save
    pub saved_at: u64,
    /// Number of records in the batch
    pub record_count: usize,
}

/// Saved batches of the current session, newest first
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Batches
    pub entries: Vec<HistoryItem>,
}

/// Cached document text of the current session
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    /// Text extracted from the last upload
    pub extracted_text: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Missing, expired or invalid session token
    Session(SessionError),
    /// Request failed validation
    BadRequest(String),
    /// Upload could not be read
    Upload(StatusCode, String),
    /// Resource not found
    NotFound(String),
    /// Optional backend not configured
    Unavailable(String),
    /// Internal server error
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Session(e) => {
                warn!("Rejected request: {}", e);
                (StatusCode::BAD_REQUEST, "Session expired".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upload(status, msg) => (status, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<ExtractorError> for AppError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::InvalidRequest(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnknownFormat(_) => AppError::BadRequest(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Create the axum router with all endpoints
pub fn create_router<L: LlmProvider + 'static>(state: AppState<L>) -> AxumRouter {
    let body_limit = state.max_document_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    AxumRouter::new()
        .route("/health", get(health_check::<L>))
        .route("/session/establish", post(establish_session::<L>))
        .route("/generate_and_analyze", post(generate_and_analyze::<L>))
        .route("/edit_test_cases", post(edit_test_cases::<L>))
        .route("/download", post(download))
        .route("/export_to_jira", post(export_to_jira::<L>))
        .route("/history", get(list_history::<L>))
        .route("/history/:id", get(load_history::<L>))
        .route("/document", get(current_document::<L>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// GET /health - Liveness and configuration summary
async fn health_check<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        model: state.model.clone(),
        history_enabled: state.history.is_some(),
    })
}

/// POST /session/establish - Start a new session
async fn establish_session<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
) -> Result<Json<SessionResponse>, AppError> {
    let (token, session_id) = state
        .sessions
        .establish()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    info!("Established session {}", session_id);
    Ok(Json(SessionResponse { token }))
}

/// Uploaded file and plain form fields of a generation request
struct GenerateForm {
    file: Option<(String, Vec<u8>)>,
    fields: HashMap<String, String>,
}

impl GenerateForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = GenerateForm {
            file: None,
            fields: HashMap::new(),
        };

        while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "requirement_file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(upload_error)?;
                form.file = Some((file_name, bytes.to_vec()));
            } else {
                let value = field.text().await.map_err(upload_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Checkbox semantics: any non-empty value is on
    fn flag(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|v| !v.trim().is_empty())
    }

    /// Non-blank field value
    fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

fn upload_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Upload(err.status(), err.body_text())
}

/// POST /generate_and_analyze - Extract, generate and check test cases for an upload
async fn generate_and_analyze<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    let session_id = state.sessions.session_id(&headers)?;
    let mut form = GenerateForm::read(multipart).await?;

    let (file_name, bytes) = form
        .file
        .take()
        .ok_or_else(|| AppError::BadRequest("No file part".to_string()))?;
    if file_name.is_empty() {
        return Err(AppError::BadRequest("No selected file".to_string()));
    }
    if bytes.len() > state.max_document_bytes {
        return Err(AppError::Upload(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File exceeds the {} byte upload limit", state.max_document_bytes),
        ));
    }

    info!("Processing '{}' ({} bytes) for session {}", file_name, bytes.len(), session_id);
    let extracted_text = tokio::task::spawn_blocking(move || extract_document(&file_name, &bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Document extraction task failed: {}", e)))??;
    state.documents.insert(&session_id, extracted_text.clone()).await;

    let outcome = state.pipeline.run_text(&extracted_text).await?;
    info!(
        "Generated {} test cases ({} passed checks) from {} chunks",
        outcome.records.len(),
        outcome.passed_count(),
        outcome.chunks_total
    );
    let records = outcome.records;

    let history_confirmations = if form.flag("save_to_history") {
        Some(state.save_history(&session_id, &records).await)
    } else {
        None
    };

    let mut jira_confirmations = None;
    let mut jira_error = None;
    if form.flag("jira_auto_export") {
        let fields = (
            form.value("jira_server"),
            form.value("jira_email"),
            form.value("jira_token"),
            form.value("jira_project_key"),
        );
        match fields {
            (Some(server), Some(email), Some(token), Some(project_key)) => {
                let zephyr_mode = form.value("is_zephyr_api_integration") == Some("true");
                let zephyr_token = form.value("zephyr_api_token");
                match run_tracker_export(
                    server,
                    email,
                    token,
                    project_key,
                    zephyr_mode,
                    zephyr_token,
                    &records,
                )
                .await
                {
                    Ok(confirmations) => jira_confirmations = Some(confirmations),
                    Err(e) => {
                        warn!("Automatic tracker export failed: {}", e);
                        jira_error = Some(e.to_string());
                    }
                }
            }
            _ => jira_error = Some(MISSING_JIRA_FIELDS.to_string()),
        }
    }

    Ok(Json(GenerateResponse {
        extracted_text,
        test_cases: records,
        history_confirmations,
        jira_confirmations,
        jira_error,
    }))
}

async fn run_tracker_export(
    server: &str,
    email: &str,
    token: &str,
    project_key: &str,
    zephyr_mode: bool,
    zephyr_token: Option<&str>,
    records: &[TestCaseRecord],
) -> Result<Vec<String>, ExportError> {
    let jira = JiraClient::new(server, email, token)?;
    let zephyr = match zephyr_token.filter(|_| zephyr_mode) {
        Some(token) => Some(ZephyrClient::new(token)?),
        None => None,
    };
    Ok(export_to_tracker(&jira, zephyr.as_ref(), zephyr_mode, project_key, records).await)
}

/// POST /edit_test_cases - Apply a free-text instruction to the whole list
async fn edit_test_cases<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    Json(request): Json<EditRequest>,
) -> Result<Json<TestCasesBody>, AppError> {
    let test_cases = state.editor.edit(&request.prompt, request.test_cases).await?;
    Ok(Json(TestCasesBody { test_cases }))
}

/// POST /download?format= - Render records as a file
async fn download(
    Query(query): Query<DownloadQuery>,
    Json(body): Json<TestCasesBody>,
) -> Result<Response, AppError> {
    if body.test_cases.is_empty() {
        return Err(AppError::BadRequest("No test cases to download".to_string()));
    }
    let format = ExportFormat::from_name(query.format.as_deref().unwrap_or("txt"))?;

    let records = body.test_cases;
    let bytes = tokio::task::spawn_blocking(move || export(&records, format))
        .await
        .map_err(|e| AppError::Internal(format!("Export task failed: {}", e)))??;

    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", format.file_name()),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// POST /export_to_jira - File records in the issue tracker
async fn export_to_jira<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    headers: HeaderMap,
    Json(request): Json<TrackerExportRequest>,
) -> Result<Json<TrackerExportResponse>, AppError> {
    // Only saving needs a session
    let session_id = if request.save_to_history {
        Some(state.sessions.session_id(&headers)?)
    } else {
        None
    };

    let required = [
        &request.server,
        &request.email,
        &request.token,
        &request.project_key,
    ];
    if required.iter().any(|value| value.trim().is_empty()) {
        return Err(AppError::BadRequest(MISSING_JIRA_FIELDS.to_string()));
    }
    if request.test_cases.is_empty() {
        return Err(AppError::BadRequest("No test cases to export".to_string()));
    }

    let confirmations = run_tracker_export(
        request.server.trim(),
        request.email.trim(),
        request.token.trim(),
        request.project_key.trim(),
        request.is_zephyr_api_integration,
        request.zephyr_api_token.as_deref().map(str::trim).filter(|t| !t.is_empty()),
        &request.test_cases,
    )
    .await?;

    let history_confirmations = match session_id {
        Some(session_id) => Some(state.save_history(&session_id, &request.test_cases).await),
        None => None,
    };

    Ok(Json(TrackerExportResponse {
        confirmations,
        history_confirmations,
    }))
}

/// GET /history - Batches saved by this session
async fn list_history<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, AppError> {
    let session_id = state.sessions.session_id(&headers)?;
    let store = state.history_store()?;

    let entries = tokio::task::spawn_blocking(move || {
        let guard = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.list_batches(&session_id)
    })
    .await
    .map_err(|e| AppError::Internal(format!("History task failed: {}", e)))??;

    Ok(Json(HistoryResponse {
        entries: entries
            .into_iter()
            .map(|entry| HistoryItem {
                id: entry.id,
                saved_at: entry.saved_at,
                record_count: entry.record_count,
            })
            .collect(),
    }))
}

/// GET /history/:id - Records of one batch saved by this session
async fn load_history<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<TestCasesBody>, AppError> {
    let session_id = state.sessions.session_id(&headers)?;
    let store = state.history_store()?;

    let batch_id = id.clone();
    let records = tokio::task::spawn_blocking(move || -> Result<_, StoreError> {
        let guard = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let owned = guard
            .list_batches(&session_id)?
            .iter()
            .any(|entry| entry.id == batch_id);
        if owned {
            guard.load_batch(&batch_id)
        } else {
            Ok(None)
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("History task failed: {}", e)))??;

    records
        .map(|test_cases| Json(TestCasesBody { test_cases }))
        .ok_or_else(|| AppError::NotFound(format!("History entry '{}' not found", id)))
}

/// GET /document - Text extracted from this session's last upload
async fn current_document<L: LlmProvider + 'static>(
    State(state): State<AppState<L>>,
    headers: HeaderMap,
) -> Result<Json<DocumentResponse>, AppError> {
    let session_id = state.sessions.session_id(&headers)?;
    let text = state
        .documents
        .get(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound("No document processed in this session".to_string()))?;

    Ok(Json(DocumentResponse {
        extracted_text: text.as_str().to_string(),
    }))
}
