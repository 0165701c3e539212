//! Upstream API Client
//!
//! HTTP client for the h5 media API. Every request carries the configured
//! identity headers; a request that gets no response at all is retried once.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::headers;
use super::types::Envelope;
use crate::config::{BrowserFingerprint, UpstreamIdentity};
use crate::metrics;

/// Longest body excerpt kept as a diagnostic for non-JSON replies
const DIAGNOSTIC_EXCERPT_CHARS: usize = 500;

/// Upstream error types
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No response was received, after the retry if one was allowed
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// A response arrived but did not carry a usable payload
    #[error("upstream rejected request (code {code:?}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        code: Option<i64>,
        message: Option<String>,
        raw: Value,
    },
    /// The HTTP client itself could not be built
    #[error("client setup failed: {0}")]
    Setup(String),
}

/// Construction parameters for [`UpstreamClient`]
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub identity: UpstreamIdentity,
    pub fingerprint: BrowserFingerprint,
    pub timeout: Duration,
    pub retry_delay: Duration,
    pub egress_proxy: Option<String>,
}

/// One outbound call. `retried` is the retry marker: a request that already
/// carries it is never sent a third time.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    /// Short endpoint label for logs and metrics
    pub endpoint: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub retried: bool,
}

impl UpstreamRequest {
    pub fn get(endpoint: &'static str, path: &str) -> Self {
        Self {
            endpoint,
            path: path.to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            retried: false,
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Add per-request headers; these take precedence over the identity set
    pub fn headers(mut self, extra: HeaderMap) -> Self {
        self.headers.extend(extra);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Upstream API Client
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    fingerprint: BrowserFingerprint,
    identity: UpstreamIdentity,
    retry_delay: Duration,
    proxied: bool,
}

impl UpstreamClient {
    pub fn new(settings: UpstreamSettings) -> Result<Self, UpstreamError> {
        let mut builder = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers::identity_headers(
                &settings.identity,
                &settings.fingerprint,
            ));

        if let Some(ref proxy_url) = settings.egress_proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| UpstreamError::Setup(format!("invalid egress proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| UpstreamError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            fingerprint: settings.fingerprint,
            identity: settings.identity,
            retry_delay: settings.retry_delay,
            proxied: settings.egress_proxy.is_some(),
        })
    }

    pub fn fingerprint(&self) -> &BrowserFingerprint {
        &self.fingerprint
    }

    pub fn identity(&self) -> &UpstreamIdentity {
        &self.identity
    }

    /// Whether requests leave through the egress proxy
    pub fn is_proxied(&self) -> bool {
        self.proxied
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: &UpstreamRequest) -> Result<Response, reqwest::Error> {
        self.http
            .get(self.url_for(&request.path))
            .query(&request.query)
            .headers(request.headers.clone())
            .send()
            .await
    }

    /// Send a request, retrying exactly once after `retry_delay` when no
    /// response was received. HTTP error statuses are returned as responses
    /// and never retried.
    pub async fn send(&self, mut request: UpstreamRequest) -> Result<Response, UpstreamError> {
        debug!("Upstream request: {} {}", request.endpoint, request.path);

        match self.execute(&request).await {
            Ok(response) => Ok(response),
            Err(e) if request.retried => {
                error!("Upstream {} failed after retry: {}", request.endpoint, e);
                Err(UpstreamError::Transport(e))
            }
            Err(e) => {
                warn!(
                    "upstream_retry" = request.endpoint,
                    "delay_ms" = self.retry_delay.as_millis() as u64,
                    "Upstream {} got no response: {}",
                    request.endpoint,
                    e
                );
                metrics::UPSTREAM_RETRIES
                    .with_label_values(&[request.endpoint])
                    .inc();

                request.retried = true;
                sleep(self.retry_delay).await;

                self.execute(&request).await.map_err(|e| {
                    error!("Upstream {} failed after retry: {}", request.endpoint, e);
                    UpstreamError::Transport(e)
                })
            }
        }
    }

    /// Send a request and parse the reply into an [`Envelope`].
    ///
    /// A body that is not JSON becomes `Rejected` with the status and a body
    /// excerpt as its diagnostic.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: UpstreamRequest,
    ) -> Result<Envelope<T>, UpstreamError> {
        let endpoint = request.endpoint;
        let response = match self.send(request).await {
            Ok(response) => response,
            Err(e) => {
                metrics::UPSTREAM_REQUESTS
                    .with_label_values(&[endpoint, "transport_error"])
                    .inc();
                return Err(e);
            }
        };

        let status = response.status();
        let text = response.text().await?;

        let envelope = match serde_json::from_str::<Value>(&text) {
            Ok(raw) => Envelope::parse(raw),
            Err(_) => {
                let cut = text
                    .char_indices()
                    .nth(DIAGNOSTIC_EXCERPT_CHARS)
                    .map(|(i, _)| i)
                    .unwrap_or(text.len());
                Envelope::Rejected {
                    code: None,
                    message: Some(format!("non-JSON reply with HTTP {}", status.as_u16())),
                    raw: serde_json::json!({
                        "status": status.as_u16(),
                        "body": &text[..cut],
                    }),
                }
            }
        };

        let outcome = match envelope {
            Envelope::Rejected { .. } => "rejected",
            _ => "ok",
        };
        metrics::UPSTREAM_REQUESTS
            .with_label_values(&[endpoint, outcome])
            .inc();

        Ok(envelope)
    }
}
