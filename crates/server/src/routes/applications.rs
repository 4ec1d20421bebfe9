use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use models::application::{self, ApplicationStatus};

use crate::errors::JsonApiError;
use crate::routes::ServerState;

/// The slice of an application visible to the applicant.
#[derive(Debug, Serialize)]
pub struct ApplicationPublic {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub data: Value,
}

impl TryFrom<application::Model> for ApplicationPublic {
    type Error = JsonApiError;

    fn try_from(m: application::Model) -> Result<Self, Self::Error> {
        let status = m.status_parsed().map_err(|e| {
            JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Corrupt Record", Some(e.to_string()))
        })?;
        Ok(Self { id: m.id, status, data: m.data })
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationStatusResponse {
    pub status: ApplicationStatus,
}

/// Progress payload. A non-object body is rejected at deserialization.
#[derive(Debug, Deserialize, Serialize)]
pub struct ApplicationUpdate {
    pub data: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FileLinkRequest {
    pub file_id: String,
    pub original_filename: String,
    pub form_field_id: String,
}

#[derive(Debug, Serialize)]
pub struct FileLinkResponse {
    pub file_id: String,
    pub original_filename: String,
    pub form_field_id: String,
}

#[utoipa::path(
    get, path = "/api/v1/applications/{id}/public", tag = "applications",
    params(("id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "Public view of the application"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_public(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationPublic>, JsonApiError> {
    let app = state
        .apps
        .get(id)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Lookup Failed"))?
        .ok_or_else(|| JsonApiError::not_found(format!("application {id} not found")))?;
    Ok(Json(app.try_into()?))
}

#[utoipa::path(
    get, path = "/api/v1/applications/{id}/public/status", tag = "applications",
    params(("id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "Current status"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_public_status(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationStatusResponse>, JsonApiError> {
    let app = state
        .apps
        .get(id)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Lookup Failed"))?
        .ok_or_else(|| JsonApiError::not_found(format!("application {id} not found")))?;
    let status = app.status_parsed().map_err(|e| {
        JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Corrupt Record", Some(e.to_string()))
    })?;
    Ok(Json(ApplicationStatusResponse { status }))
}

#[utoipa::path(
    patch, path = "/api/v1/applications/{id}/public", tag = "applications",
    params(("id" = Uuid, Path, description = "Application UUID")),
    request_body = crate::openapi::ApplicationUpdateDoc,
    responses(
        (status = 200, description = "Progress saved, record echoed"),
        (status = 400, description = "Application is not a draft"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn save_progress(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ApplicationUpdate>,
) -> Result<Json<ApplicationPublic>, JsonApiError> {
    let updated = state
        .apps
        .save_progress(id, Value::Object(input.data))
        .await
        .map_err(|e| JsonApiError::from_service(e, "Update Failed"))?;
    Ok(Json(updated.try_into()?))
}

#[utoipa::path(
    post, path = "/api/v1/applications/{id}/submit", tag = "applications",
    params(("id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "Submitted for review"),
        (status = 400, description = "Application is not a draft"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn submit(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationPublic>, JsonApiError> {
    let submitted = state
        .apps
        .submit(id)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Submit Failed"))?;
    info!(application_uuid = %submitted.id, "application submitted for review");
    Ok(Json(submitted.try_into()?))
}

#[utoipa::path(
    post, path = "/api/v1/applications/{id}/files", tag = "applications",
    params(("id" = Uuid, Path, description = "Application UUID")),
    request_body = crate::openapi::FileLinkRequestDoc,
    responses(
        (status = 201, description = "File linked"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn link_file(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<FileLinkRequest>,
) -> Result<(StatusCode, Json<FileLinkResponse>), JsonApiError> {
    let linked = state
        .apps
        .link_file(id, &input.file_id, &input.original_filename, &input.form_field_id)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Link Failed"))?;
    Ok((
        StatusCode::CREATED,
        Json(FileLinkResponse {
            file_id: linked.file_id,
            original_filename: linked.original_filename,
            form_field_id: linked.form_field_id,
        }),
    ))
}
