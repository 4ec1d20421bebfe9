use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::application::repository::SeaOrmApplicationRepository;
use service::application::service::ApplicationService;
use service::files::FileStorageClient;

use crate::openapi;

pub mod sessions;
pub mod applications;
pub mod admin;
pub mod forms;

pub type AppService = ApplicationService<SeaOrmApplicationRepository>;

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub apps: Arc<AppService>,
    pub files: FileStorageClient,
}

#[utoipa::path(get, path = "/api/v1/health", tag = "health",
    responses((status = 200, description = "Service is up")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok", service: "api" })
}

/// Build the full application router: public session/application routes,
/// admin routes, form schema routes, and the API docs.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        // Sessions
        .route("/api/v1/sessions/telegram", post(sessions::create_telegram_session))
        .route("/api/v1/sessions/telegram/status", get(sessions::telegram_session_status))
        .route("/api/v1/sessions/web", post(sessions::create_web_session))
        // Applicant-facing application routes
        .route(
            "/api/v1/applications/:id/public",
            get(applications::get_public).patch(applications::save_progress),
        )
        .route("/api/v1/applications/:id/public/status", get(applications::get_public_status))
        .route("/api/v1/applications/:id/submit", post(applications::submit))
        .route("/api/v1/applications/:id/files", post(applications::link_file))
        // Admin review routes
        .route("/api/v1/admin/applications", get(admin::list))
        .route("/api/v1/admin/applications/export", get(admin::export))
        .route("/api/v1/admin/applications/:id", get(admin::get).patch(admin::update))
        .route(
            "/api/v1/admin/applications/:id/download-documents",
            get(admin::download_documents),
        )
        // Form schemas
        .route("/api/v1/forms/schema/active", get(forms::get_active_schema))
        .route("/api/v1/admin/forms/schema", post(forms::upload_schema))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
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
