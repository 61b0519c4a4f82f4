//! # Application State Management
//!
//! State shared by every HTTP request handler.
//!
//! ## What is shared:
//! - **Configuration** and the **storage router**: built once at startup and
//!   never modified afterwards, so a plain `Arc` is enough
//! - **Metrics**: counters updated by every request, behind `Arc<RwLock<T>>`
//!
//! ### Arc<RwLock<T>> Pattern
//! - **Arc**: Multiple ownership (every worker holds a clone of `AppState`)
//! - **RwLock**: many readers or one writer at a time
//!
//! Nothing in the upload path waits on another request: the lock is only
//! held long enough to bump a counter.

use crate::config::AppConfig;
use crate::storage::{StorageRouter, StoredFile};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    /// Startup configuration (read-only)
    pub config: Arc<AppConfig>,

    /// Ordered storage backends (read-only)
    pub router: Arc<StorageRouter>,

    /// Request and upload counters
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// When the server started (for uptime)
    pub start_time: Instant,
}

#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start
    pub request_count: u64,

    /// Requests that ended with a 4xx or 5xx status
    pub error_count: u64,

    /// Key: endpoint name (e.g., "POST /audio")
    pub endpoint_metrics: HashMap<String, EndpointMetric>,

    pub uploads: UploadMetrics,
}

#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

/// Outcome counters for `POST /audio`.
#[derive(Debug, Default, Clone)]
pub struct UploadMetrics {
    /// Successful uploads per backend name ("remote", "local")
    pub stored_by_backend: HashMap<String, u64>,

    /// Uploads that succeeded only after an earlier backend failed
    pub fallbacks: u64,

    /// Uploads that no backend accepted, or that could not be staged
    pub failures: u64,

    /// Raw audio bytes received, headers excluded
    pub bytes_received: u64,
}

impl AppState {
    pub fn new(config: AppConfig, router: StorageRouter) -> Self {
        Self {
            config: Arc::new(config),
            router: Arc::new(router),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            start_time: Instant::now(),
        }
    }

    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap();

        let endpoint_metric = metrics.endpoint_metrics.entry(endpoint.to_string()).or_default();
        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// Record a stored upload and which backend took it.
    pub fn record_upload(&self, stored: &StoredFile, payload_len: usize) {
        let mut metrics = self.metrics.write().unwrap();
        let uploads = &mut metrics.uploads;

        *uploads.stored_by_backend.entry(stored.backend.clone()).or_default() += 1;
        uploads.bytes_received += payload_len as u64;
        if stored.used_fallback() {
            uploads.fallbacks += 1;
        }
    }

    pub fn record_upload_failure(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.uploads.failures += 1;
    }

    /// Copy of the current metrics, taken under a single read lock.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics.read().unwrap().clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}
