use std::time::Duration;

use anyhow::{anyhow, Context};
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use tracing::info;

/// Lifetime of issued download links.
pub const URL_EXPIRATION: Duration = Duration::from_secs(3600);

/// Build an S3 client against the configured endpoint. Credentials come from
/// the standard AWS environment variables; path-style addressing is forced
/// for MinIO compatibility.
pub async fn build_client(endpoint_url: &str) -> Client {
    let region_provider = RegionProviderChain::default_provider().or_else(Region::new("us-east-1"));
    let aws_cfg = aws_config::from_env().region(region_provider).load().await;
    let s3_cfg = aws_sdk_s3::config::Builder::from(&aws_cfg)
        .force_path_style(true)
        .endpoint_url(endpoint_url)
        .build();
    Client::from_conf(s3_cfg)
}

/// Make sure the bucket exists, creating it on first startup.
pub async fn ensure_bucket(client: &Client, bucket: &str) -> anyhow::Result<()> {
    match client.head_bucket().bucket(bucket).send().await {
        Ok(_) => {
            info!(bucket, "bucket present");
            Ok(())
        }
        Err(e) => {
            let service_err = e.into_service_error();
            if service_err.is_not_found() {
                info!(bucket, "bucket missing, creating it");
                client
                    .create_bucket()
                    .bucket(bucket)
                    .send()
                    .await
                    .with_context(|| format!("failed to create bucket {bucket}"))?;
                Ok(())
            } else {
                Err(anyhow!("head_bucket failed for {bucket}: {service_err}"))
            }
        }
    }
}

/// Existence probe for a stored object.
pub async fn object_exists(client: &Client, bucket: &str, key: &str) -> anyhow::Result<bool> {
    match client.head_object().bucket(bucket).key(key).send().await {
        Ok(_) => Ok(true),
        Err(e) => {
            let service_err = e.into_service_error();
            if service_err.is_not_found() {
                Ok(false)
            } else {
                Err(anyhow!("head_object failed for {key}: {service_err}"))
            }
        }
    }
}

/// Presign a time-bounded GET for the object. The returned URL points at the
/// internal endpoint; the caller swaps in the public base before handing it
/// out.
pub async fn presign_download(client: &Client, bucket: &str, key: &str) -> anyhow::Result<String> {
    let presigned = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .presigned(PresigningConfig::expires_in(URL_EXPIRATION)?)
        .await
        .with_context(|| format!("failed to presign download for {key}"))?;
    Ok(presigned.uri().to_string())
}
