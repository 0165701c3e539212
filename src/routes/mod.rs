use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

pub mod catalog;
pub mod health;
pub mod play;
pub mod proxy;
pub mod subtitles;

/// Build the application router.
///
/// JSON API routes get gzip and a permissive CORS layer. The video proxy gets
/// neither: it writes its own CORS headers and must pass `content-length` /
/// `content-range` through untouched.
pub fn router(state: Arc<AppState>) -> Router {
    let api: Router<Arc<AppState>> = Router::new()
        .route("/api/play", get(play::resolve_play))
        .route("/api/subtitles", get(subtitles::resolve_subtitles))
        .route("/api/detail", get(catalog::get_detail))
        .route("/api/categories", get(catalog::get_categories))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let video_proxy: Router<Arc<AppState>> = Router::new()
        .route(
            "/video-proxy",
            get(proxy::video_proxy)
                .head(proxy::video_proxy)
                .options(proxy::preflight),
        )
        .route(
            "/video-proxy/",
            get(proxy::video_proxy)
                .head(proxy::video_proxy)
                .options(proxy::preflight),
        );

    Router::new()
        // Health endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/ready", get(health::ready))
        .route("/live", get(health::live))
        .merge(api)
        .merge(video_proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
