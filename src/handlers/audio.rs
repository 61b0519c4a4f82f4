//! # Audio Upload Handler
//!
//! `POST /audio?sample_rate=<int>&uid=<string>`
//!
//! The whole request body is raw little-endian 16-bit PCM. It is read to the
//! end (no size limit, no content-type check), wrapped in a WAV header,
//! staged in the temp directory and handed to the storage router.
//!
//! ## Responses (plain text):
//! - `200`: `Audio bytes received and saved as <filename>`
//! - `400`: the body could not be read
//! - `500`: staging failed, or no storage backend accepted the file
//!
//! `uid` and `sample_rate` are only logged. The WAV header is always mono
//! 16kHz 16-bit whatever the client declares.

use crate::audio::{filename, wav};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    /// Declared sample rate; logged, never used for encoding
    pub sample_rate: Option<String>,
    /// Opaque client tag for log correlation
    pub uid: Option<String>,
}

pub async fn post_audio(
    state: web::Data<AppState>,
    query: web::Query<AudioQuery>,
    payload: web::Payload,
) -> AppResult<HttpResponse> {
    let uid = query.uid.as_deref().unwrap_or_default();
    let sample_rate = query.sample_rate.as_deref().unwrap_or_default();
    info!(uid = %uid, sample_rate = %sample_rate, "Received audio upload");

    let body = read_body(payload).await?;
    let filename = filename::upload_filename();
    let file = wav::encode_wav(&body);

    let temp_path = match stage(Path::new(&state.config.storage.temp_dir), &filename, &file).await {
        Ok(path) => path,
        Err(e) => {
            state.record_upload_failure();
            return Err(AppError::TempFile(e));
        }
    };

    let result = state.router.store(&temp_path, &filename).await;

    if let Err(e) = fs::remove_file(&temp_path).await {
        debug!(path = %temp_path.display(), error = %e, "Could not remove staged file");
    }

    match result {
        Ok(stored) => {
            state.record_upload(&stored, body.len());
            Ok(HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(format!("Audio bytes received and saved as {}", filename)))
        }
        Err(e) => {
            warn!(uid = %uid, file = %filename, "All storage backends failed");
            state.record_upload_failure();
            Err(e.into())
        }
    }
}

/// Drain the request body.
async fn read_body(mut payload: web::Payload) -> AppResult<web::BytesMut> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Write the encoded file under a per-request unique name in `temp_dir`.
///
/// The stored filename only has second resolution, so the staged copy gets a
/// UUID prefix to keep concurrent requests from sharing a temp file.
async fn stage(temp_dir: &Path, filename: &str, file: &[u8]) -> std::io::Result<PathBuf> {
    let path = temp_dir.join(format!("{}_{}", Uuid::new_v4(), filename));
    fs::write(&path, file).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::router::tests::FakeBackend;
    use crate::storage::{LocalStore, StorageBackend, StorageRouter};
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    const PREFIX: &str = "Audio bytes received and saved as ";

    struct Fixture {
        _tmp: tempfile::TempDir,
        temp_dir: PathBuf,
        local_dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let temp_dir = tmp.path().join("staging");
            std::fs::create_dir(&temp_dir).unwrap();
            let local_dir = tmp.path().join("audio_files");
            Self { temp_dir, local_dir, _tmp: tmp }
        }

        fn state(&self, backends: Vec<Arc<dyn StorageBackend>>) -> AppState {
            let mut config = AppConfig::default();
            config.storage.temp_dir = self.temp_dir.display().to_string();
            config.storage.local_dir = self.local_dir.display().to_string();
            AppState::new(config, StorageRouter::new(backends))
        }

        fn local(&self) -> Arc<dyn StorageBackend> {
            Arc::new(LocalStore::new(&self.local_dir))
        }

        fn staged_files(&self) -> usize {
            std::fs::read_dir(&self.temp_dir).unwrap().count()
        }
    }

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    async fn upload(state: AppState, body: Vec<u8>) -> (StatusCode, String) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::handlers::routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/audio?sample_rate=16000&uid=user-42")
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn saved_name(body: &str) -> &str {
        body.strip_prefix(PREFIX).expect("unexpected response body")
    }

    #[actix_web::test]
    async fn test_no_remote_stores_locally() {
        let fx = Fixture::new();
        let payload = pcm(&[0, 1000, -1000, 32767]);

        let (status, body) = upload(fx.state(vec![fx.local()]), payload.clone()).await;
        assert_eq!(status, StatusCode::OK);

        let stored = std::fs::read(fx.local_dir.join(saved_name(&body))).unwrap();
        assert_eq!(&stored[..wav::HEADER_LEN], &wav::build_wav_header(payload.len()));
        assert_eq!(&stored[wav::HEADER_LEN..], payload.as_slice());
        assert_eq!(fx.staged_files(), 0);
    }

    #[actix_web::test]
    async fn test_remote_success_leaves_local_untouched() {
        let fx = Fixture::new();
        let remote = FakeBackend::accepting("remote");
        let state = fx.state(vec![remote.clone() as Arc<dyn StorageBackend>, fx.local()]);

        let (status, body) = upload(state.clone(), pcm(&[5, 6, 7])).await;
        assert_eq!(status, StatusCode::OK);

        let stored = remote.stored.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, saved_name(&body));
        assert_eq!(stored[0].1.len(), wav::HEADER_LEN + 6);
        assert!(!fx.local_dir.exists());

        let uploads = state.get_metrics_snapshot().uploads;
        assert_eq!(uploads.stored_by_backend["remote"], 1);
        assert_eq!(uploads.fallbacks, 0);
    }

    #[actix_web::test]
    async fn test_remote_failure_falls_back_to_local() {
        let fx = Fixture::new();
        let remote = FakeBackend::failing("remote");
        let state = fx.state(vec![remote.clone() as Arc<dyn StorageBackend>, fx.local()]);

        let (status, body) = upload(state.clone(), pcm(&[1, 2])).await;
        assert_eq!(status, StatusCode::OK);
        assert!(fx.local_dir.join(saved_name(&body)).is_file());

        let uploads = state.get_metrics_snapshot().uploads;
        assert_eq!(uploads.stored_by_backend["local"], 1);
        assert_eq!(uploads.fallbacks, 1);
    }

    #[actix_web::test]
    async fn test_unwritable_local_dir_is_500_with_no_files() {
        let fx = Fixture::new();
        std::fs::write(&fx.local_dir, b"a file where the directory should be").unwrap();
        let local: Arc<dyn StorageBackend> = Arc::new(LocalStore::new(fx.local_dir.join("nested")));
        let state = fx.state(vec![local]);

        let (status, body) = upload(state.clone(), pcm(&[1, 2, 3])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to save audio file");
        assert!(!fx.local_dir.join("nested").exists());
        assert_eq!(fx.staged_files(), 0);
        assert_eq!(state.get_metrics_snapshot().uploads.failures, 1);
    }

    #[actix_web::test]
    async fn test_empty_body_is_header_only_file() {
        let fx = Fixture::new();

        let (status, body) = upload(fx.state(vec![fx.local()]), Vec::new()).await;
        assert_eq!(status, StatusCode::OK);

        let stored = std::fs::read(fx.local_dir.join(saved_name(&body))).unwrap();
        assert_eq!(stored, wav::build_wav_header(0));
    }

    #[actix_web::test]
    async fn test_missing_temp_dir_is_500() {
        let fx = Fixture::new();
        let mut state = fx.state(vec![fx.local()]);
        let mut config = (*state.config).clone();
        config.storage.temp_dir = fx.temp_dir.join("missing").display().to_string();
        state.config = Arc::new(config);

        let (status, body) = upload(state, pcm(&[1])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to create temp file");
        assert!(!fx.local_dir.exists());
    }

    #[actix_web::test]
    async fn test_missing_query_parameters_are_accepted() {
        let fx = Fixture::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.state(vec![fx.local()])))
                .configure(crate::handlers::routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/audio")
            .set_payload(pcm(&[9, 9]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
