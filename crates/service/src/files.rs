use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// HTTP client for the file storage collaborator.
///
/// Constructed once at startup and passed in wherever needed; there are no
/// process-wide client singletons. Presigned links come back under the
/// collaborator's externally-advertised base address, which is unreachable
/// from the service network, so this client also owns the public-to-internal
/// rewrite.
#[derive(Clone)]
pub struct FileStorageClient {
    http: reqwest::Client,
    service_url: String,
    s3_public_url: String,
    s3_endpoint_url: String,
}

#[derive(Debug, Deserialize)]
struct DownloadLinkResponse {
    download_url: String,
}

#[derive(Debug, Error)]
pub enum FileFetchError {
    #[error("file storage returned status {0}")]
    Status(StatusCode),
    #[error("file storage request failed: {0}")]
    Transport(String),
}

fn transport(e: reqwest::Error) -> FileFetchError {
    FileFetchError::Transport(e.to_string())
}

impl FileStorageClient {
    pub fn new(cfg: &configs::FileStorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            service_url: cfg.service_url.trim_end_matches('/').to_string(),
            s3_public_url: cfg.s3_public_url.clone(),
            s3_endpoint_url: cfg.s3_endpoint_url.clone(),
        }
    }

    /// Ask the collaborator for a time-bounded download link for `file_id`.
    pub async fn issue_download_link(&self, file_id: &str) -> Result<String, FileFetchError> {
        let url = format!("{}/api/v1/files/{}/download-link", self.service_url, file_id);
        let resp = self.http.get(&url).send().await.map_err(transport)?;
        if !resp.status().is_success() {
            return Err(FileFetchError::Status(resp.status()));
        }
        let body: DownloadLinkResponse = resp.json().await.map_err(transport)?;
        Ok(body.download_url)
    }

    /// Swap the advertised public base for the internally-routable one.
    pub fn rewrite_to_internal(&self, url: &str) -> String {
        url.replacen(&self.s3_public_url, &self.s3_endpoint_url, 1)
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FileFetchError> {
        let resp = self.http.get(url).send().await.map_err(transport)?;
        if !resp.status().is_success() {
            return Err(FileFetchError::Status(resp.status()));
        }
        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    /// Full per-file protocol: issue link, rewrite, fetch content.
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>, FileFetchError> {
        let public_url = self.issue_download_link(file_id).await?;
        let internal_url = self.rewrite_to_internal(&public_url);
        self.fetch(&internal_url).await
    }
}
