use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use common::utils::logging::init_logging_default;
use service::application::repository::SeaOrmApplicationRepository;
use service::application::service::ApplicationService;
use service::files::FileStorageClient;

use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Public entry: build the app and run the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_default();

    let cfg = configs::AppConfig::load_and_validate()?;

    let db = models::db::connect_url(&cfg.database.url).await?;

    let repo = Arc::new(SeaOrmApplicationRepository { db: db.clone() });
    let apps = Arc::new(ApplicationService::new(repo));
    let files = FileStorageClient::new(&cfg.file_storage);
    let state = ServerState { db, apps, files };

    let app: Router = routes::build_router(build_cors(), state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting api service");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
