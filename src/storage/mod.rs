//! # Storage Module
//!
//! Persists encoded WAV files. A file is offered to an ordered list of
//! backends and the first one that accepts it wins:
//!
//! 1. **Remote** (optional): an HTTP blob store reached with a single PUT
//! 2. **Local**: a directory on this machine, always last
//!
//! A remote failure is logged and absorbed by the local fallback. Only when
//! every backend has failed does the upload fail.

pub mod local;   // Local directory backend
pub mod remote;  // HTTP blob store backend
pub mod router;  // Ordered fallback across backends

pub use local::LocalStore;
pub use remote::RemoteStore;
pub use router::{StorageRouter, StoredFile};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A place uploads can be written to.
///
/// `source` is the staged WAV file on disk and `name` the filename it should
/// be stored under. On success the backend returns a human-readable location
/// (a path or a URL) describing where the bytes ended up.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short identifier used in logs and metrics ("remote", "local").
    fn name(&self) -> &str;

    async fn write(&self, source: &Path, name: &str) -> Result<String, StorageError>;
}

/// Failures of a single storage attempt.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create storage directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open source file {path}: {source}")]
    OpenSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create destination file {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy file to {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read staged file {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remote write to {url} failed: {source}")]
    Remote {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("remote write to {url} rejected with status {status}")]
    RemoteStatus { url: String, status: u16 },

    #[error("no storage backends configured")]
    NoBackends,
}
