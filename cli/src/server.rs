//! HTTP service for the reading-order editor.
//!
//! All state-dependent endpoints share one [`SessionStore`]; a successful
//! upload replaces the active document, a failed one leaves it untouched.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use readorder::export::{EXPORT_JSON_FILE, EXPORT_MARKDOWN_FILE};
use readorder::{
    markdown_from_json, page_order_file, write_order_dump, Export, ExportOptions, ExportPaths,
    ExportStage, PageBox, ProducerRegistry, ReadingOrderState, SaveRequest, Session, SessionStore,
    ALL_ORDERS_FILE,
};

/// Largest accepted request body (uploaded PDFs).
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory receiving exports and order snapshots
    pub output_dir: PathBuf,
    /// Optional directory of static editor assets
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address {addr}")]
    Address { addr: String },

    #[error("failed to bind to {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub registry: Arc<ProducerRegistry>,
    pub export_options: Arc<ExportOptions>,
    pub output_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(registry: ProducerRegistry, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            registry: Arc::new(registry),
            export_options: Arc::new(ExportOptions::default()),
            output_dir: Arc::new(output_dir.into()),
        }
    }
}

/// Error returned by handlers, rendered as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Document(#[from] readorder::Error),

    #[error("invalid multipart upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Document(err) => match err {
                readorder::Error::NoDocumentLoaded | readorder::Error::PageOutOfRange(..) => {
                    StatusCode::NOT_FOUND
                }
                err if err.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Multipart(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Build the router with all endpoints.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let app = Router::new()
        .route("/upload_pdf", post(upload_pdf))
        .route("/process_local_pdf", post(process_local_pdf))
        .route("/pages_count", get(pages_count))
        .route("/bounding_boxes/{page_no}", get(bounding_boxes))
        .route("/get_reading_order", get(get_reading_order))
        .route("/save_reading_order", post(save_reading_order))
        .route("/save_order/{page_no}", post(save_order))
        .route("/save_all_orders", post(save_all_orders))
        .route(
            "/save_complete_json_and_markdown",
            post(save_complete_json_and_markdown),
        )
        .route(
            "/download_complete_edited_json",
            get(download_complete_edited_json),
        )
        .route(
            "/download_complete_edited_markdown",
            get(download_complete_edited_markdown),
        )
        .route("/export_markdown", post(export_markdown))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state);

    match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    }
}

/// Run the server until it fails.
pub async fn run(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let addr: SocketAddr = config
        .addr()
        .parse()
        .map_err(|_| ServerError::Address { addr: config.addr() })?;
    let app = router(state, config.static_dir.as_deref());

    log::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind { addr, source: e })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Serve { source: e })?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct LoadedResponse {
    message: String,
    name: String,
    pages: u32,
}

impl LoadedResponse {
    fn from_session(session: &Session) -> Self {
        Self {
            message: "Document processed successfully".to_string(),
            name: session.document().name.clone(),
            pages: session.page_count(),
        }
    }
}

/// Replace the active session once parsing has succeeded.
fn activate(state: &AppState, session: Session) -> ApiResult<Json<LoadedResponse>> {
    let response = LoadedResponse::from_session(&session);
    state.store.load(session)?;
    Ok(Json(response))
}

async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<LoadedResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        log::info!(
            "Received upload {} ({} bytes)",
            file_name.as_deref().unwrap_or("<unnamed>"),
            bytes.len()
        );

        let registry = state.registry.clone();
        let document = tokio::task::spawn_blocking(move || {
            registry.produce_bytes(&bytes, file_name.as_deref())
        })
        .await??;

        return activate(&state, Session::new(document));
    }

    Err(ApiError::BadRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
struct LocalFileRequest {
    pdf_path: PathBuf,
}

async fn process_local_pdf(
    State(state): State<AppState>,
    Json(request): Json<LocalFileRequest>,
) -> ApiResult<Json<LoadedResponse>> {
    let path = request.pdf_path;
    if !path.is_file() {
        return Err(ApiError::NotFound(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let registry = state.registry.clone();
    let source = path.clone();
    let document = tokio::task::spawn_blocking(move || registry.produce(&source)).await??;

    activate(&state, Session::new(document).with_source(path))
}

async fn pages_count(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let pages = state.store.read(|session| Ok(session.page_count()))?;
    Ok(Json(json!({ "pages": pages })))
}

async fn bounding_boxes(
    State(state): State<AppState>,
    UrlPath(page_no): UrlPath<u32>,
) -> ApiResult<Json<Vec<PageBox>>> {
    let boxes = state.store.read(|session| session.page_boxes(page_no))?;
    Ok(Json(boxes))
}

async fn get_reading_order(State(state): State<AppState>) -> ApiResult<Json<ReadingOrderState>> {
    Ok(Json(state.store.reading_order()?))
}

async fn save_reading_order(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let snapshot = state.store.save(request)?;

    if let Err(e) = snapshot.write_to(&state.output_dir) {
        log::warn!("Could not write order snapshot: {}", e);
    }

    Ok(Json(json!({
        "message": "Reading order saved",
        "refs": snapshot.order.len(),
        "texts": snapshot.texts.len(),
    })))
}

async fn save_order(
    State(state): State<AppState>,
    UrlPath(page_no): UrlPath<u32>,
    Json(order): Json<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    let dir = state.output_dir.clone();
    tokio::task::spawn_blocking(move || write_order_dump(&dir, &page_order_file(page_no), &order))
        .await??;
    Ok(Json(json!({ "message": "Order saved." })))
}

async fn save_all_orders(
    State(state): State<AppState>,
    Json(orders): Json<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    let dir = state.output_dir.clone();
    tokio::task::spawn_blocking(move || write_order_dump(&dir, ALL_ORDERS_FILE, &orders)).await??;
    Ok(Json(json!({ "message": "All orders saved." })))
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    message: String,
    json_path: PathBuf,
    markdown_path: PathBuf,
}

async fn save_complete_json_and_markdown(
    State(state): State<AppState>,
) -> ApiResult<Json<ExportResponse>> {
    let (_, paths) = write_export(&state).await?;
    Ok(Json(ExportResponse {
        message: "Export complete".to_string(),
        json_path: paths.json_path,
        markdown_path: paths.markdown_path,
    }))
}

/// Export the active session and write both artifacts to the output directory.
///
/// Every call re-exports from the current session, so the files on disk
/// always match what is returned.
async fn write_export(state: &AppState) -> ApiResult<(Export, ExportPaths)> {
    let store = state.store.clone();
    let options = state.export_options.clone();
    let dir = state.output_dir.clone();
    let exported = tokio::task::spawn_blocking(move || {
        let export = store.export(&options)?;
        let paths = export.write_to(&dir)?;
        Ok::<_, readorder::Error>((export, paths))
    })
    .await??;
    Ok(exported)
}

/// Rejected input is a client error; a failed render of valid input is not.
fn markdown_error(err: readorder::Error) -> ApiError {
    match err {
        readorder::Error::Export {
            stage: ExportStage::Reparse,
            ..
        } => ApiError::BadRequest(err.to_string()),
        err => ApiError::Document(err),
    }
}

fn attachment(content_type: &'static str, file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

async fn download_complete_edited_json(State(state): State<AppState>) -> ApiResult<Response> {
    let (export, _) = write_export(&state).await?;
    Ok(attachment("application/json", EXPORT_JSON_FILE, export.json))
}

async fn download_complete_edited_markdown(State(state): State<AppState>) -> ApiResult<Response> {
    let (export, _) = write_export(&state).await?;
    Ok(attachment(
        "text/markdown; charset=utf-8",
        EXPORT_MARKDOWN_FILE,
        export.markdown,
    ))
}

async fn export_markdown(State(state): State<AppState>, body: String) -> ApiResult<Response> {
    let markdown =
        markdown_from_json(&body, &state.export_options.render).map_err(markdown_error)?;
    Ok(([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], markdown).into_response())
}
