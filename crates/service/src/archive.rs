use std::io::{Cursor, Write};

use tracing::warn;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use models::application_file;

use crate::errors::ServiceError;
use crate::files::{FileFetchError, FileStorageClient};

/// Assemble a ZIP archive of every linked file's content, fetched one at a
/// time from the file storage collaborator, in input order.
///
/// Best-effort by contract: when link issuance or the download fails for a
/// file, a `<original_filename>.error.txt` marker naming the failure takes
/// its place and assembly continues. The caller always receives a complete
/// archive covering every linked file, never a truncated one, and per-file
/// failures never propagate out of here. An empty input yields an empty
/// archive.
pub async fn build_documents_archive(
    files_client: &FileStorageClient,
    files: &[application_file::Model],
) -> Result<Vec<u8>, ServiceError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for record in files {
            match files_client.download(&record.file_id).await {
                Ok(content) => {
                    zip.start_file(record.original_filename.as_str(), options).map_err(zip_err)?;
                    zip.write_all(&content).map_err(io_err)?;
                }
                Err(e) => {
                    warn!(
                        file_id = %record.file_id,
                        filename = %record.original_filename,
                        error = %e,
                        "failed to fetch linked file, inserting error marker"
                    );
                    let marker = match e {
                        FileFetchError::Status(code) => {
                            format!("Failed to download this file. Error: {}", code.as_u16())
                        }
                        FileFetchError::Transport(msg) => {
                            format!("Failed to download this file. Error: {msg}")
                        }
                    };
                    let name = format!("{}.error.txt", record.original_filename);
                    zip.start_file(name, options).map_err(zip_err)?;
                    zip.write_all(marker.as_bytes()).map_err(io_err)?;
                }
            }
        }

        zip.finish().map_err(zip_err)?;
    }
    Ok(cursor.into_inner())
}

fn zip_err(e: zip::result::ZipError) -> ServiceError {
    ServiceError::Archive(e.to_string())
}

fn io_err(e: std::io::Error) -> ServiceError {
    ServiceError::Archive(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::Utc;
    use std::io::Read;
    use uuid::Uuid;
    use zip::ZipArchive;

    const PUBLIC_BASE: &str = "http://files.invalid:9000";

    /// Stand-in for the file storage collaborator: issues links under the
    /// unreachable public base and serves content under its own address.
    async fn start_stub() -> String {
        let app = Router::new()
            .route(
                "/api/v1/files/:file_id/download-link",
                get(|Path(file_id): Path<String>| async move {
                    if file_id == "no-link" {
                        Err(StatusCode::NOT_FOUND)
                    } else {
                        Ok(Json(serde_json::json!({
                            "download_url": format!("{PUBLIC_BASE}/objects/{file_id}")
                        })))
                    }
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

        let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}:{}", addr.ip(), addr.port())
    }

    fn stub_client(base: &str) -> FileStorageClient {
        FileStorageClient::new(&configs::FileStorageConfig {
            service_url: base.to_string(),
            s3_public_url: PUBLIC_BASE.to_string(),
            s3_endpoint_url: base.to_string(),
        })
    }

    fn file_record(file_id: &str, original_filename: &str) -> application_file::Model {
        application_file::Model {
            id: 0,
            application_id: Uuid::new_v4(),
            file_id: file_id.to_string(),
            original_filename: original_filename.to_string(),
            form_field_id: "doc".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn entry_names_and_bodies(bytes: Vec<u8>) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            out.push((entry.name().to_string(), body));
        }
        out
    }

    #[tokio::test]
    async fn archives_every_file_in_input_order() {
        let base = start_stub().await;
        let client = stub_client(&base);
        let files =
            vec![file_record("obj-1", "passport.pdf"), file_record("obj-2", "photo.jpg")];

        let bytes = build_documents_archive(&client, &files).await.unwrap();
        let entries = entry_names_and_bodies(bytes);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("passport.pdf".to_string(), "content of obj-1".to_string()));
        assert_eq!(entries[1], ("photo.jpg".to_string(), "content of obj-2".to_string()));
    }

    #[tokio::test]
    async fn failed_download_becomes_an_error_marker() {
        let base = start_stub().await;
        let client = stub_client(&base);
        let files = vec![file_record("obj-1", "passport.pdf"), file_record("gone", "photo.jpg")];

        let bytes = build_documents_archive(&client, &files).await.unwrap();
        let entries = entry_names_and_bodies(bytes);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "passport.pdf");
        assert_eq!(entries[1].0, "photo.jpg.error.txt");
        assert!(entries[1].1.contains("404"));
    }

    #[tokio::test]
    async fn failed_link_issuance_also_becomes_a_marker() {
        let base = start_stub().await;
        let client = stub_client(&base);
        let files = vec![file_record("no-link", "statement.pdf")];

        let bytes = build_documents_archive(&client, &files).await.unwrap();
        let entries = entry_names_and_bodies(bytes);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "statement.pdf.error.txt");
        assert!(entries[0].1.contains("404"));
    }

    #[tokio::test]
    async fn empty_file_list_yields_empty_archive() {
        let base = start_stub().await;
        let client = stub_client(&base);

        let bytes = build_documents_archive(&client, &[]).await.unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
