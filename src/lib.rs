//! TWORUAN stream-resolution and delivery-proxy server.
//!
//! Resolves titles into playable stream variants against the upstream media
//! API, relays media bytes from its CDN with the headers the CDN expects, and
//! provides the playback sequencing controller used by the player.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod playback;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::services::category_cache::CategoryCache;
use crate::services::upstream::{UpstreamClient, UpstreamError, UpstreamSettings};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    /// Catalog endpoints (detail, home, captions)
    pub catalog_api: UpstreamClient,
    /// Play resolution endpoint
    pub play_api: UpstreamClient,
    /// CDN client used by the video proxy
    pub cdn: reqwest::Client,
    pub categories: CategoryCache,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let settings = |base_url: &str, egress_proxy: Option<String>| UpstreamSettings {
            base_url: base_url.to_string(),
            identity: config.identity.clone(),
            fingerprint: config.fingerprint.clone(),
            timeout: Duration::from_millis(config.upstream_timeout_ms),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            egress_proxy,
        };

        let catalog_api = UpstreamClient::new(settings(&config.api_base_url, None))?;
        let play_api = UpstreamClient::new(settings(
            &config.play_base_url,
            config.egress_proxy.clone(),
        ))?;

        // No overall timeout: a media transfer lasts as long as the viewer watches
        let cdn = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.proxy_connect_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            // Keep the forged referer across signed-URL redirects
            .referer(false)
            .no_gzip()
            .build()
            .map_err(|e| UpstreamError::Setup(e.to_string()))?;

        Ok(Self {
            config,
            catalog_api,
            play_api,
            cdn,
            categories: CategoryCache::new(),
            start_time: Instant::now(),
        })
    }

    pub fn shared(config: Config) -> Result<Arc<Self>, UpstreamError> {
        Self::new(config).map(Arc::new)
    }
}
