use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::application::ApplicationStatus;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

#[derive(Debug, Deserialize, Serialize)]
pub struct TelegramSessionRequest {
    pub telegram_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub application_uuid: Uuid,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct StatusQuery {
    pub telegram_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub status: ApplicationStatus,
}

#[utoipa::path(
    post, path = "/api/v1/sessions/telegram", tag = "sessions",
    request_body = crate::openapi::TelegramSessionRequestDoc,
    responses(
        (status = 200, description = "Existing draft resumed or new draft created"),
        (status = 500, description = "Session Failed")
    )
)]
pub async fn create_telegram_session(
    State(state): State<ServerState>,
    Json(input): Json<TelegramSessionRequest>,
) -> Result<Json<SessionResponse>, JsonApiError> {
    let app = state
        .apps
        .create_or_resume_telegram(input.telegram_id)
        .await
        .map_err(|e| JsonApiError::from_service(e, "Session Failed"))?;
    info!(application_uuid = %app.id, telegram_id = input.telegram_id, "telegram session ready");
    Ok(Json(SessionResponse { application_uuid: app.id }))
}

#[utoipa::path(
    post, path = "/api/v1/sessions/web", tag = "sessions",
    responses(
        (status = 200, description = "New draft created"),
        (status = 500, description = "Session Failed")
    )
)]
pub async fn create_web_session(
    State(state): State<ServerState>,
) -> Result<Json<SessionResponse>, JsonApiError> {
    let app = state
        .apps
        .create_web()
        .await
        .map_err(|e| JsonApiError::from_service(e, "Session Failed"))?;
    info!(application_uuid = %app.id, "web session created");
    Ok(Json(SessionResponse { application_uuid: app.id }))
}

#[utoipa::path(
    get, path = "/api/v1/sessions/telegram/status", tag = "sessions",
    params(StatusQuery),
    responses(
        (status = 200, description = "Status of the newest application"),
        (status = 404, description = "No applications for this user")
    )
)]
pub async fn telegram_session_status(
    State(state): State<ServerState>,
    Query(q): Query<StatusQuery>,
) -> Result<Json<SessionStatusResponse>, JsonApiError> {
    match state.apps.latest_status(q.telegram_id).await {
        Ok(Some(status)) => Ok(Json(SessionStatusResponse { status })),
        Ok(None) => Err(JsonApiError::not_found(format!(
            "no applications for telegram_id {}",
            q.telegram_id
        ))),
        Err(e) => Err(JsonApiError::from_service(e, "Status Lookup Failed")),
    }
}
