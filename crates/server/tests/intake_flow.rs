use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use migration::MigratorTrait;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes::{self, ServerState};
use service::application::repository::SeaOrmApplicationRepository;
use service::application::service::ApplicationService;
use service::files::FileStorageClient;

fn cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

struct TestApp {
    base_url: String,
}

const STUB_PUBLIC_BASE: &str = "http://files.invalid:9000";

/// Stand-in for the file storage collaborator used by the archive endpoint.
async fn start_file_stub() -> anyhow::Result<String> {
    let app = Router::new()
        .route(
            "/api/v1/files/:file_id/download-link",
            get(|Path(file_id): Path<String>| async move {
                Json(json!({
                    "download_url": format!("{STUB_PUBLIC_BASE}/objects/{file_id}")
                }))
            }),
        )
        .route(
            "/objects/:file_id",
            get(|Path(file_id): Path<String>| async move {
                if file_id == "gone" {
                    Err(StatusCode::NOT_FOUND)
                } else {
                    Ok(format!("content of {file_id}"))
                }
            }),
        );

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

async fn start_server() -> anyhow::Result<TestApp> {
    // Ensure models prefer env over config file
    std::env::set_var("CONFIG_PATH", "/nonexistent-config-for-tests.toml");

    // Use DATABASE_URL from environment; if not present, skip tests gracefully
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL missing; skip intake e2e tests. Provide .env.test or env var.");
        return Err(anyhow::anyhow!("missing DATABASE_URL"));
    }

    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("migrations notice: {}", e);
    }

    let stub_base = start_file_stub().await?;
    let files = FileStorageClient::new(&configs::FileStorageConfig {
        service_url: stub_base.clone(),
        s3_public_url: STUB_PUBLIC_BASE.to_string(),
        s3_endpoint_url: stub_base,
    });

    let repo = Arc::new(SeaOrmApplicationRepository { db: db.clone() });
    let apps = Arc::new(ApplicationService::new(repo));
    let state = ServerState { db, apps, files };

    let app: Router = routes::build_router(cors(), state);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url })
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

fn rand_telegram_id() -> i64 {
    (Uuid::new_v4().as_u128() as i64).checked_abs().unwrap_or(i64::MAX)
}

#[tokio::test]
async fn e2e_health() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = client().get(format!("{}/api/v1/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_web_application_lifecycle() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();

    // New web session yields a draft
    let res = c.post(format!("{}/api/v1/sessions/web", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let uuid = res.json::<serde_json::Value>().await?["application_uuid"]
        .as_str()
        .unwrap()
        .to_string();

    let res = c
        .get(format!("{}/api/v1/applications/{}/public/status", app.base_url, uuid))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<serde_json::Value>().await?["status"], "draft");

    // Progress save echoes the record
    let res = c
        .patch(format!("{}/api/v1/applications/{}/public", app.base_url, uuid))
        .json(&json!({"data": {"name": "Jane"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<serde_json::Value>().await?["data"]["name"], "Jane");

    // Submit flips to new
    let res = c
        .post(format!("{}/api/v1/applications/{}/submit", app.base_url, uuid))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c
        .get(format!("{}/api/v1/applications/{}/public/status", app.base_url, uuid))
        .send()
        .await?;
    assert_eq!(res.json::<serde_json::Value>().await?["status"], "new");

    // Editing and re-submitting a non-draft is an invalid-state error
    let res = c
        .post(format!("{}/api/v1/applications/{}/submit", app.base_url, uuid))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    let res = c
        .patch(format!("{}/api/v1/applications/{}/public", app.base_url, uuid))
        .json(&json!({"data": {"name": "Janet"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn e2e_telegram_session_create_or_resume() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();
    let telegram_id = rand_telegram_id();

    let res = c
        .post(format!("{}/api/v1/sessions/telegram", app.base_url))
        .json(&json!({"telegram_id": telegram_id}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let first = res.json::<serde_json::Value>().await?["application_uuid"]
        .as_str()
        .unwrap()
        .to_string();

    // Same user asks again: same draft, no duplicate
    let res = c
        .post(format!("{}/api/v1/sessions/telegram", app.base_url))
        .json(&json!({"telegram_id": telegram_id}))
        .send()
        .await?;
    let second = res.json::<serde_json::Value>().await?["application_uuid"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(first, second);

    let res = c
        .get(format!(
            "{}/api/v1/sessions/telegram/status?telegram_id={}",
            app.base_url, telegram_id
        ))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<serde_json::Value>().await?["status"], "draft");

    // A user with no applications polls into a 404
    let res = c
        .get(format!(
            "{}/api/v1/sessions/telegram/status?telegram_id={}",
            app.base_url,
            rand_telegram_id()
        ))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_admin_review_flow() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();

    let res = c.post(format!("{}/api/v1/sessions/web", app.base_url)).send().await?;
    let uuid = res.json::<serde_json::Value>().await?["application_uuid"]
        .as_str()
        .unwrap()
        .to_string();

    // Partial admin update: set status and comment
    let res = c
        .patch(format!("{}/api/v1/admin/applications/{}", app.base_url, uuid))
        .json(&json!({"status": "in_progress", "admin_comment": "checking documents"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["admin_comment"], "checking documents");

    // Status-only update keeps the comment
    let res = c
        .patch(format!("{}/api/v1/admin/applications/{}", app.base_url, uuid))
        .json(&json!({"status": "completed"}))
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["admin_comment"], "checking documents");

    // Filtered listing finds it
    let res = c
        .get(format!("{}/api/v1/admin/applications?status=completed&limit=200", app.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let rows = res.json::<serde_json::Value>().await?;
    assert!(rows.as_array().unwrap().iter().any(|r| r["id"] == uuid.as_str()));

    // Unknown status filter is a validation error
    let res = c
        .get(format!("{}/api/v1/admin/applications?status=bogus", app.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn e2e_export_returns_csv() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();

    // At least one application exists
    let res = c.post(format!("{}/api/v1/sessions/web", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c
        .get(format!("{}/api/v1/admin/applications/export", app.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let content_type = res.headers()["content-type"].to_str()?.to_string();
    assert!(content_type.starts_with("text/csv"));
    let body = res.text().await?;
    assert!(body.starts_with("ID,Telegram ID,Status"));
    Ok(())
}

#[tokio::test]
async fn e2e_form_schema_activation() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();

    let v1 = format!("e2e-{}", Uuid::new_v4());
    let res = c
        .post(format!("{}/api/v1/admin/forms/schema", app.base_url))
        .json(&json!({"version": v1, "schema_data": {"steps": ["one"]}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    let v2 = format!("e2e-{}", Uuid::new_v4());
    let res = c
        .post(format!("{}/api/v1/admin/forms/schema", app.base_url))
        .json(&json!({"version": v2, "schema_data": {"steps": ["one", "two"]}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    // The newest upload is the single active schema
    let res = c.get(format!("{}/api/v1/forms/schema/active", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["steps"].as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn e2e_download_documents_archive() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();

    let res = c.post(format!("{}/api/v1/sessions/web", app.base_url)).send().await?;
    let uuid = res.json::<serde_json::Value>().await?["application_uuid"]
        .as_str()
        .unwrap()
        .to_string();

    // No linked documents yet: 404
    let res = c
        .get(format!(
            "{}/api/v1/admin/applications/{}/download-documents",
            app.base_url, uuid
        ))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);

    // Link one healthy object and one that the stub will fail to serve
    for (file_id, name) in [("obj-1", "passport.pdf"), ("gone", "photo.jpg")] {
        let res = c
            .post(format!("{}/api/v1/applications/{}/files", app.base_url, uuid))
            .json(&json!({
                "file_id": file_id,
                "original_filename": name,
                "form_field_id": "doc"
            }))
            .send()
            .await?;
        assert_eq!(res.status(), HttpStatusCode::CREATED);
    }

    let res = c
        .get(format!(
            "{}/api/v1/admin/applications/{}/download-documents",
            app.base_url, uuid
        ))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/zip");
    let bytes = res.bytes().await?.to_vec();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    assert_eq!(archive.len(), 2);
    let mut names = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let mut body = String::new();
        entry.read_to_string(&mut body)?;
        names.push((entry.name().to_string(), body));
    }
    assert_eq!(names[0].0, "passport.pdf");
    assert_eq!(names[0].1, "content of obj-1");
    assert_eq!(names[1].0, "photo.jpg.error.txt");
    assert!(names[1].1.contains("404"));
    Ok(())
}

#[tokio::test]
async fn e2e_missing_application_is_404() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();
    let ghost = Uuid::new_v4();

    let res = c
        .get(format!("{}/api/v1/applications/{}/public", app.base_url, ghost))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);

    let res = c
        .post(format!("{}/api/v1/applications/{}/files", app.base_url, ghost))
        .json(&json!({
            "file_id": "obj",
            "original_filename": "x.pdf",
            "form_field_id": "doc"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}
