//! # Storage Router
//!
//! Routes a staged upload through an ordered list of backends.
//!
//! ## Routing Policy:
//! - Backends are tried in order, once each, no retries
//! - The first success ends routing; later backends are never touched
//! - A failure is logged and the next backend is tried
//! - If every backend fails, the last error is returned
//!
//! The standard setup is `[remote, local]` when a remote endpoint is
//! configured and `[local]` otherwise.

use super::{LocalStore, RemoteStore, StorageBackend, StorageError};
use crate::config::StorageConfig;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Where an upload ended up.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub filename: String,
    /// Name of the backend that accepted the file.
    pub backend: String,
    /// Path or URL of the stored file.
    pub location: String,
    /// Number of backends that failed before this one succeeded.
    pub failed_attempts: usize,
}

impl StoredFile {
    pub fn used_fallback(&self) -> bool {
        self.failed_attempts > 0
    }
}

#[derive(Clone)]
pub struct StorageRouter {
    backends: Vec<Arc<dyn StorageBackend>>,
}

impl StorageRouter {
    pub fn new(backends: Vec<Arc<dyn StorageBackend>>) -> Self {
        Self { backends }
    }

    /// Remote first (when configured), local directory last.
    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        let mut backends: Vec<Arc<dyn StorageBackend>> = Vec::new();

        if let Some(remote) = RemoteStore::from_config(&config.remote)? {
            info!(endpoint = %remote.endpoint(), "Remote storage enabled");
            backends.push(Arc::new(remote));
        } else {
            info!("Remote storage not configured, using local storage only");
        }
        backends.push(Arc::new(LocalStore::new(&config.local_dir)));

        Ok(Self::new(backends))
    }

    /// Backend names in the order they are tried.
    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Store the staged file at `source` under `filename`.
    pub async fn store(&self, source: &Path, filename: &str) -> Result<StoredFile, StorageError> {
        let mut last_error = None;

        for (attempt, backend) in self.backends.iter().enumerate() {
            match backend.write(source, filename).await {
                Ok(location) => {
                    info!(
                        file = %filename,
                        backend = %backend.name(),
                        location = %location,
                        "Upload stored"
                    );
                    return Ok(StoredFile {
                        filename: filename.to_string(),
                        backend: backend.name().to_string(),
                        location,
                        failed_attempts: attempt,
                    });
                }
                Err(e) => {
                    let remaining = self.backends.len() - attempt - 1;
                    warn!(
                        file = %filename,
                        backend = %backend.name(),
                        error = %e,
                        remaining_backends = remaining,
                        "Storage attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(StorageError::NoBackends))
    }
}
