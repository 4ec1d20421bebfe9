use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use models::application::ApplicationStatus;
use service::archive;
use service::db::application_store::ApplicationWithFiles;
use service::export;
use service::pagination::Page;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationFileView {
    pub file_id: String,
    pub original_filename: String,
    pub form_field_id: String,
}

/// The full application record as staff see it.
#[derive(Debug, Serialize)]
pub struct ApplicationAdmin {
    pub id: Uuid,
    pub telegram_id: Option<i64>,
    pub status: ApplicationStatus,
    pub data: Value,
    pub admin_comment: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub files: Vec<ApplicationFileView>,
}

impl TryFrom<ApplicationWithFiles> for ApplicationAdmin {
    type Error = JsonApiError;

    fn try_from(row: ApplicationWithFiles) -> Result<Self, Self::Error> {
        let app = row.application;
        let status = app.status_parsed().map_err(|e| {
            JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Corrupt Record", Some(e.to_string()))
        })?;
        Ok(Self {
            id: app.id,
            telegram_id: app.telegram_id,
            status,
            data: app.data,
            admin_comment: app.admin_comment,
            created_at: app.created_at,
            updated_at: app.updated_at,
            files: row
                .files
                .into_iter()
                .map(|f| ApplicationFileView {
                    file_id: f.file_id,
                    original_filename: f.original_filename,
                    form_field_id: f.form_field_id,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApplicationAdminUpdate {
    pub status: Option<ApplicationStatus>,
    pub admin_comment: Option<String>,
}

#[utoipa::path(
    get, path = "/api/v1/admin/applications", tag = "admin",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of applications in creation order"),
        (status = 400, description = "Unknown status filter"),
        (status = 500, description = "List Failed")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<ApplicationAdmin>>, JsonApiError> {
    let status = match q.status.as_deref() {
        Some(raw) => Some(raw.parse::<ApplicationStatus>().map_err(|e| {
            JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string()))
        })?),
        None => None,
    };
    let page = Page {
        limit: q.limit.unwrap_or(Page::DEFAULT_LIMIT),
        offset: q.offset.unwrap_or(0),
    };
    let rows = state
        .apps
        .list(status, page)
        .await
        .map_err(|e| JsonApiError::from_service(e, "List Failed"))?;
    info!(count = rows.len(), "listed applications");
    rows.into_iter().map(ApplicationAdmin::try_from).collect::<Result<Vec<_>, _>>().map(Json)
}

#[utoipa::path(
    get, path = "/api/v1/admin/applications/{id}", tag = "admin",
    params(("id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "Full application record"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationAdmin>, JsonApiError> {
    let row = state
        .apps
        .get_with_files(id)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Lookup Failed"))?
        .ok_or_else(|| JsonApiError::not_found(format!("application {id} not found")))?;
    Ok(Json(row.try_into()?))
}

#[utoipa::path(
    patch, path = "/api/v1/admin/applications/{id}", tag = "admin",
    request_body = crate::openapi::ApplicationAdminUpdateDoc,
    params(("id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "Updated record"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ApplicationAdminUpdate>,
) -> Result<Json<ApplicationAdmin>, JsonApiError> {
    let row = state
        .apps
        .update_admin(id, input.status, input.admin_comment)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Update Failed"))?;
    Ok(Json(row.try_into()?))
}

#[utoipa::path(
    get, path = "/api/v1/admin/applications/export", tag = "admin",
    responses(
        (status = 200, description = "CSV export of all applications", content_type = "text/csv"),
        (status = 204, description = "Nothing to export"),
        (status = 500, description = "Export Failed")
    )
)]
pub async fn export(State(state): State<ServerState>) -> Result<Response, JsonApiError> {
    let rows = state
        .apps
        .list_all()
        .await
        .map_err(|e| JsonApiError::from_service(e, "Export Failed"))?;
    let apps: Vec<_> = rows.into_iter().map(|r| r.application).collect();
    let bytes = export::build_applications_csv(&apps)
        .map_err(|e| JsonApiError::from_service(e, "Export Failed"))?;
    if bytes.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    info!(rows = apps.len(), bytes = bytes.len(), "generated applications export");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"applications.csv\"".to_string()),
        ],
        bytes,
    )
        .into_response())
}

#[utoipa::path(
    get, path = "/api/v1/admin/applications/{id}/download-documents", tag = "admin",
    params(("id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "ZIP archive of linked documents", content_type = "application/zip"),
        (status = 404, description = "Application absent or has no documents"),
        (status = 500, description = "Archive Failed")
    )
)]
pub async fn download_documents(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Response, JsonApiError> {
    let row = state
        .apps
        .get_with_files(id)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Archive Failed"))?
        .ok_or_else(|| JsonApiError::not_found(format!("application {id} not found")))?;
    if row.files.is_empty() {
        return Err(JsonApiError::not_found(format!("application {id} has no linked documents")));
    }

    let bytes = archive::build_documents_archive(&state.files, &row.files)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Archive Failed"))?;
    info!(application_uuid = %id, files = row.files.len(), bytes = bytes.len(), "assembled documents archive");
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"documents_{id}.zip\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
