pub mod audio;

use crate::health;
use actix_web::web;

/// Register every route of the service.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/audio", web::post().to(audio::post_audio))
        .route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(health::detailed_metrics));
}
