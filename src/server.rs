/*!
 * HTTP upload endpoint.
 *
 * `POST /upload` takes a multipart form with a `file` field (the template)
 * and an optional `lang` field (target language code). The response is the
 * translated template as an attachment named `<stem>.translated.<ext>`.
 * A document that fails to translate yields HTTP 500 with a generic message;
 * the endpoint never retries.
 */

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use log::{error, info, warn};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::file_utils::FileManager;
use crate::translation::TranslationPipeline;

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared state of the endpoint
pub struct AppState {
    /// Pipeline for the configured target language; per-request languages derive from it
    pub pipeline: TranslationPipeline,
}

/// Errors returned to HTTP clients
#[derive(Debug)]
pub enum ApiError {
    /// The request was missing a field or carried invalid data
    BadRequest(String),
    /// The pipeline failed on the uploaded document
    TranslationFailed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::TranslationFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Translation failed." })),
            )
                .into_response(),
        }
    }
}

/// Build the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve on an already bound listener until the process ends
pub async fn serve_on(listener: TcpListener, pipeline: TranslationPipeline) -> Result<()> {
    let app = create_router(Arc::new(AppState { pipeline }));
    axum::serve(listener, app).await.context("Server error")
}

/// Bind `host:port` and serve
pub async fn serve(pipeline: TranslationPipeline, host: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("Failed to bind server to {}:{}", host, port))?;

    info!("Server running on http://{}:{}", host, port);
    serve_on(listener, pipeline).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Uploaded form fields
struct UploadForm {
    file_name: String,
    content: String,
    lang: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut file: Option<(String, String)> = None;
    let mut lang = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("template.handlebars").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                let content = String::from_utf8(bytes.to_vec())
                    .map_err(|_| ApiError::BadRequest("Uploaded file is not valid UTF-8".to_string()))?;
                file = Some((file_name, content));
            }
            Some("lang") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read lang: {}", e)))?;
                let value = value.trim().to_string();
                if !value.is_empty() {
                    lang = Some(value);
                }
            }
            _ => {}
        }
    }

    let (file_name, content) = file.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;
    Ok(UploadForm { file_name, content, lang })
}

async fn upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Result<Response, ApiError> {
    let form = read_form(multipart).await?;

    let pipeline = match &form.lang {
        Some(lang) => state
            .pipeline
            .with_target_language(lang)
            .map_err(|e| ApiError::BadRequest(format!("{:#}", e)))?,
        None => state.pipeline.clone(),
    };

    info!(
        "Translating upload '{}' to {}",
        form.file_name,
        pipeline.config().target_language
    );

    let translated = pipeline.translate_document(&form.content).await.map_err(|e| {
        error!("Translation of '{}' failed: {}", form.file_name, e);
        ApiError::TranslationFailed
    })?;

    let disposition = format!("attachment; filename=\"{}\"", attachment_name(&form.file_name));
    if translated.report.gateway.degraded_units > 0 {
        warn!(
            "'{}' translated with {} untranslated pieces",
            form.file_name, translated.report.gateway.degraded_units
        );
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        translated.content,
    )
        .into_response())
}

/// Download name for an uploaded file, stripped of directories and quotes
pub fn attachment_name(uploaded: &str) -> String {
    let base = Path::new(uploaded)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "template.handlebars".to_string());
    FileManager::output_file_name(&base)
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect()
}
