use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub file_storage: FileStorageConfig,
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
}

/// Addresses of the file storage collaborator as seen from the API service.
/// `s3_public_url`/`s3_endpoint_url` are the two faces of the same object
/// store: presigned links are advertised under the public base but only the
/// endpoint base is routable from inside the service network.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileStorageConfig {
    #[serde(default)]
    pub service_url: String,
    #[serde(default)]
    pub s3_public_url: String,
    #[serde(default)]
    pub s3_endpoint_url: String,
}

/// Object storage settings for the file server itself.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObjectStoreConfig {
    #[serde(default)]
    pub endpoint_url: String,
    #[serde(default)]
    pub public_url: String,
    #[serde(default)]
    pub bucket: String,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), fill gaps from the environment,
    /// and validate. Missing config file is fine as long as the environment
    /// carries the mandatory values.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.database.normalize_from_env();
        self.database.validate()?;
        self.file_storage.normalize_from_env();
        self.object_store.normalize_from_env();
        Ok(())
    }
}

impl ServerConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!(
                "database.url is empty; provide it in config.toml or the DATABASE_URL env var"
            ));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        Ok(())
    }
}

impl FileStorageConfig {
    pub fn normalize_from_env(&mut self) {
        if self.service_url.trim().is_empty() {
            if let Ok(v) = std::env::var("FILE_STORAGE_SERVICE_URL") {
                self.service_url = v;
            }
        }
        if self.s3_public_url.trim().is_empty() {
            if let Ok(v) = std::env::var("S3_PUBLIC_URL") {
                self.s3_public_url = v;
            }
        }
        if self.s3_endpoint_url.trim().is_empty() {
            if let Ok(v) = std::env::var("S3_ENDPOINT_URL") {
                self.s3_endpoint_url = v;
            }
        }
    }
}

impl ObjectStoreConfig {
    pub fn normalize_from_env(&mut self) {
        if self.endpoint_url.trim().is_empty() {
            if let Ok(v) = std::env::var("S3_ENDPOINT_URL") {
                self.endpoint_url = v;
            }
        }
        if self.public_url.trim().is_empty() {
            if let Ok(v) = std::env::var("S3_PUBLIC_URL") {
                self.public_url = v;
            }
        }
        if self.bucket.trim().is_empty() {
            if let Ok(v) = std::env::var("S3_BUCKET_NAME") {
                self.bucket = v;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint_url.trim().is_empty() {
            return Err(anyhow!("object_store.endpoint_url is empty; set S3_ENDPOINT_URL"));
        }
        if self.bucket.trim().is_empty() {
            return Err(anyhow!("object_store.bucket is empty; set S3_BUCKET_NAME"));
        }
        Ok(())
    }
}
