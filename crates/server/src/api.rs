//! Route handlers.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pdfsum_core::{is_pdf_filename, summary_filename, PipelineError};
use pdfsum_pipeline::{ModelStatus, PipelineFailure, PipelineRun};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::state::AppState;

/// Form field carrying the PDF.
const FILE_FIELD: &str = "file";

pub const REQUEST_ID_HEADER: header::HeaderName = header::HeaderName::from_static("x-request-id");

// ── Errors ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// How far the request got before failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<PipelineRun>,
}

pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: msg.into(),
                run: None,
            },
        }
    }

    fn internal(msg: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                error: msg.to_string(),
                run: None,
            },
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self {
            status: status_for(&e),
            body: ErrorResponse {
                error: e.to_string(),
                run: None,
            },
        }
    }
}

impl From<PipelineFailure> for ApiError {
    fn from(failure: PipelineFailure) -> Self {
        Self {
            status: status_for(&failure.error),
            body: ErrorResponse {
                error: failure.error.to_string(),
                run: Some(*failure.run),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for each request-level failure.
pub fn status_for(e: &PipelineError) -> StatusCode {
    match e {
        PipelineError::NotFound(_)
        | PipelineError::NotPdf(_)
        | PipelineError::Encrypted(_)
        | PipelineError::EncryptionUnsupported { .. }
        | PipelineError::Corrupted(_)
        | PipelineError::NoExtractableText(_)
        | PipelineError::SummarizationTooShort { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::SummarizationFailed(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub models: ModelStatus,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let models = state.orchestrator.models().status();
    Json(HealthResponse {
        status: if models.summarization { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        models,
    })
}

// ── Summarize ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SummarizeResponse {
    pub request_id: Uuid,
    pub filename: String,
    pub summary: String,
    /// Suggested name when saving the summary.
    pub summary_filename: String,
    pub run: PipelineRun,
}

/// POST /summarize: multipart upload with a `file` field, JSON summary back.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<SummarizeResponse>> {
    let (request_id, filename, run) = summarize_upload(&state, multipart).await?;
    let summary = run.summary.clone().unwrap_or_default();
    Ok(Json(SummarizeResponse {
        request_id,
        summary_filename: summary_filename(&filename),
        filename,
        summary,
        run,
    }))
}

/// POST /summarize/download: same input, summary as a `text/plain` attachment.
pub async fn summarize_download(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let (request_id, filename, run) = summarize_upload(&state, multipart).await?;
    let summary = run.summary.unwrap_or_default();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        summary_filename(&filename).replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (REQUEST_ID_HEADER, request_id.to_string()),
        ],
        summary,
    )
        .into_response())
}

/// Spool the uploaded PDF to a temp file and run the pipeline on it. The temp
/// file is removed when this returns, on every path.
async fn summarize_upload(state: &AppState, mut multipart: Multipart) -> ApiResult<(Uuid, String, PipelineRun)> {
    let (filename, bytes) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Multipart error: {e}")))?
            .ok_or_else(|| ApiError::bad_request(format!("No '{FILE_FIELD}' field provided")))?;

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("Upload has no file name"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
        break (filename, bytes);
    };

    if !is_pdf_filename(&filename) {
        return Err(PipelineError::NotPdf(filename).into());
    }
    if bytes.len() > state.max_upload_bytes {
        return Err(ApiError {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            body: ErrorResponse {
                error: format!("File exceeds {} byte limit", state.max_upload_bytes),
                run: None,
            },
        });
    }

    let upload = tempfile::Builder::new()
        .prefix("pdfsum-upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(ApiError::internal)?;
    tokio::fs::write(upload.path(), &bytes)
        .await
        .map_err(ApiError::internal)?;

    let request_id = Uuid::new_v4();
    let span = info_span!("summarize", %request_id, filename = %filename);
    info!(parent: &span, bytes = bytes.len(), "upload received");

    let run = state
        .orchestrator
        .run_as(upload.path(), &filename)
        .instrument(span.clone())
        .await
        .inspect_err(|f| warn!(parent: &span, error = %f, "summarization request failed"))?;

    Ok((request_id, filename, run))
}
