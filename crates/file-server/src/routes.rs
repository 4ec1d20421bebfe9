use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use aws_sdk_s3::primitives::ByteStream;
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use uuid::Uuid;

use common::types::Health;

use crate::errors::FileApiError;
use crate::s3;

#[derive(Clone)]
pub struct FileServerState {
    pub s3: aws_sdk_s3::Client,
    pub bucket: String,
    pub endpoint_url: String,
    pub public_url: String,
}

#[derive(Debug, Serialize)]
pub struct FileUploadResponse {
    pub file_id: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileDownloadResponse {
    pub download_url: String,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok", service: "file-storage" })
}

/// Object keys are a fresh UUID carrying the original extension, so the key
/// stays opaque while downloads keep a usable suffix.
fn object_key_for(filename: Option<&str>) -> String {
    let extension = filename
        .and_then(|f| std::path::Path::new(f).extension())
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{}{}", Uuid::new_v4(), extension)
}

/// Presigned URLs come back under the internal endpoint; clients live on the
/// other side of it and need the advertised public base.
fn to_public_url(url: &str, endpoint_url: &str, public_url: &str) -> String {
    url.replacen(endpoint_url, public_url, 1)
}

/// Accept a multipart upload, store it, and hand back the generated file id.
pub async fn upload_file(
    State(state): State<FileServerState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileUploadResponse>), FileApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FileApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Malformed Upload", Some(e.to_string())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| FileApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Malformed Upload", Some(e.to_string())))?;

        let file_id = object_key_for(filename.as_deref());
        state
            .s3
            .put_object()
            .bucket(&state.bucket)
            .key(&file_id)
            .body(ByteStream::from(bytes.to_vec()))
            .set_content_type(content_type.clone())
            .send()
            .await
            .map_err(|e| FileApiError::storage(format!("failed to upload object: {e}")))?;

        info!(file_id = %file_id, size = bytes.len(), "stored uploaded file");
        return Ok((
            StatusCode::CREATED,
            Json(FileUploadResponse { file_id, filename, content_type }),
        ));
    }

    Err(FileApiError::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Malformed Upload",
        Some("multipart body is missing a 'file' field".into()),
    ))
}

/// Issue a temporary download link for a stored object.
pub async fn download_link(
    State(state): State<FileServerState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileDownloadResponse>, FileApiError> {
    let exists = s3::object_exists(&state.s3, &state.bucket, &file_id)
        .await
        .map_err(|e| FileApiError::storage(e.to_string()))?;
    if !exists {
        return Err(FileApiError::not_found(format!("file with id \"{file_id}\" not found")));
    }

    let internal_url = s3::presign_download(&state.s3, &state.bucket, &file_id)
        .await
        .map_err(|e| FileApiError::storage(e.to_string()))?;
    let download_url = to_public_url(&internal_url, &state.endpoint_url, &state.public_url);
    Ok(Json(FileDownloadResponse { download_url }))
}

pub fn build_router(cors: CorsLayer, state: FileServerState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/files", post(upload_file))
        .route("/api/v1/files/:file_id/download-link", get(download_link))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
