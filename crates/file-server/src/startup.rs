use std::env;
use std::net::SocketAddr;

use axum::Router;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use common::utils::logging::init_logging_default;

use crate::routes::{self, FileServerState};
use crate::s3;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Bind address comes from FILE_SERVER_HOST/FILE_SERVER_PORT so the file
/// server can share an environment with the API service.
fn load_bind_addr() -> anyhow::Result<SocketAddr> {
    let host = env::var("FILE_SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("FILE_SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8001);
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Public entry: build the app and run the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_default();

    let mut cfg = configs::load_default().unwrap_or_default();
    cfg.object_store.normalize_from_env();
    cfg.object_store.validate()?;
    let store = cfg.object_store;

    let client = s3::build_client(&store.endpoint_url).await;
    s3::ensure_bucket(&client, &store.bucket).await?;

    let state = FileServerState {
        s3: client,
        bucket: store.bucket,
        endpoint_url: store.endpoint_url,
        public_url: store.public_url,
    };

    let app: Router = routes::build_router(build_cors(), state);

    let addr = load_bind_addr()?;
    info!(%addr, "starting file storage service");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
