// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Durable evidence stores: cloud bucket or local directory

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::EVIDENCE_PREFIX;
use crate::config::SinkConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("upload request failed: {0}")]
    Request(String),

    #[error("store answered with HTTP {0}")]
    BadStatus(u16),

    #[error("local write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Somewhere evidence images can be kept and later fetched by URL
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    fn name(&self) -> &str;

    /// Store `jpeg` as `file_name` and return its public URL
    async fn put(&self, file_name: &str, jpeg: &[u8]) -> Result<String, StoreError>;
}

/// Pick the store for this configuration: bucket, then local directory, then none
pub fn from_config(config: &SinkConfig) -> Result<Option<Arc<dyn EvidenceStore>>> {
    if let Some(bucket) = &config.bucket {
        let store = GcsStore::new(
            &config.storage_endpoint,
            bucket,
            config.access_token.clone(),
            Duration::from_millis(config.upload_timeout_ms),
        )?;
        info!("Evidence store: bucket '{}' at {}", bucket, config.storage_endpoint);
        return Ok(Some(Arc::new(store)));
    }

    if let Some(dir) = &config.local_dir {
        let store = LocalStore::new(dir.clone())?;
        info!("Evidence store: local directory {}", store.root.display());
        return Ok(Some(Arc::new(store)));
    }

    info!("No evidence store configured, incidents carry inline images");
    Ok(None)
}

/// Google Cloud Storage bucket via the JSON upload API
pub struct GcsStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
    timeout: Duration,
}

impl GcsStore {
    pub fn new(endpoint: &str, bucket: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            token,
            timeout,
        })
    }

    fn object_name(file_name: &str) -> String {
        format!("{}/{}", EVIDENCE_PREFIX, file_name)
    }

    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, Self::object_name(file_name))
    }
}

#[async_trait]
impl EvidenceStore for GcsStore {
    fn name(&self) -> &str {
        "gcs"
    }

    async fn put(&self, file_name: &str, jpeg: &[u8]) -> Result<String, StoreError> {
        let url = format!("{}/upload/storage/v1/b/{}/o", self.endpoint, self.bucket);
        let object = Self::object_name(file_name);

        let mut request = self
            .client
            .post(&url)
            .query(&[
                ("uploadType", "media"),
                ("name", object.as_str()),
                ("predefinedAcl", "publicRead"),
            ])
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .timeout(self.timeout)
            .body(jpeg.to_vec());

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout)
            } else {
                StoreError::Request(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(StoreError::BadStatus(response.status().as_u16()));
        }

        debug!("Uploaded {} ({} bytes)", object, jpeg.len());
        Ok(self.public_url(file_name))
    }
}

/// Evidence archive on the local filesystem, referenced by `file://` URLs
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self { root })
    }

    fn dir(&self) -> PathBuf {
        self.root.join(EVIDENCE_PREFIX)
    }
}

#[async_trait]
impl EvidenceStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(&self, file_name: &str, jpeg: &[u8]) -> Result<String, StoreError> {
        let dir = self.dir();
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, jpeg).await?;

        debug!("Wrote evidence to {}", path.display());
        Ok(format!("file://{}", path.display()))
    }
}
