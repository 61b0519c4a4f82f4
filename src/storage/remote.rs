//! # Remote Blob Storage
//!
//! Uploads are written to an HTTP object store with a single `PUT
//! {endpoint}/{path}` carrying the whole WAV file. Anything that speaks plain
//! PUT-by-path (WebDAV, S3-style presigned gateways, simple blob servers)
//! works as a target.
//!
//! ## Path Layout:
//! - with a prefix: `{endpoint}/{prefix}/{filename}`
//! - without one:   `{endpoint}/{filename}` (bucket root)
//!
//! A write is attempted exactly once. Failures are returned to the router,
//! which falls back to local storage.

use super::{StorageBackend, StorageError};
use crate::config::RemoteConfig;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    endpoint: String,
    path_prefix: String,
}

impl RemoteStore {
    /// Build a remote store from configuration.
    ///
    /// Returns `Ok(None)` when no endpoint is configured, which disables
    /// remote storage for the lifetime of the process.
    pub fn from_config(config: &RemoteConfig) -> anyhow::Result<Option<Self>> {
        if !config.is_enabled() {
            return Ok(None);
        }

        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        Ok(Some(Self {
            client: builder.build()?,
            endpoint: config.endpoint.trim().to_string(),
            path_prefix: config.path_prefix.clone(),
        }))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full URL the file `name` is written to.
    pub fn url_for(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            remote_path(&self.path_prefix, name)
        )
    }
}

/// Object path for `name` under an optional prefix.
///
/// Leading and trailing slashes on the prefix are ignored, so `"uploads"`,
/// `"/uploads/"` and `"uploads/"` all place files in the same folder.
pub fn remote_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

#[async_trait]
impl StorageBackend for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn write(&self, source: &Path, name: &str) -> Result<String, StorageError> {
        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| StorageError::ReadSource {
                path: source.to_path_buf(),
                source: e,
            })?;

        let url = self.url_for(name);
        debug!(url = %url, bytes = bytes.len(), "Uploading to remote storage");

        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Remote {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::RemoteStatus {
                url,
                status: status.as_u16(),
            });
        }

        info!(file = %name, url = %url, "File uploaded to remote storage");
        Ok(url)
    }
}
