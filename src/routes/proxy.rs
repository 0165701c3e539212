use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use super::play::non_empty;
use crate::error::ApiError;
use crate::metrics;
use crate::services::upstream::headers::cdn_headers;
use crate::AppState;

// Re-export reqwest header module to avoid version conflicts
mod reqwest_header {
    pub use reqwest::header::{HeaderValue, RANGE};
}

/// Upstream response headers relayed to the client, and nothing else
const PASSTHROUGH_HEADERS: [&str; 4] = [
    "content-type",
    "content-length",
    "content-range",
    "accept-ranges",
];

/// Query parameters for the video proxy
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoProxyQuery {
    pub url: Option<String>,
    /// With `subjectId`, switches the spoofed referer to the per-title form
    #[serde(default)]
    pub detail_path: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
}

/// Validate the target is an absolute HTTP/HTTPS URL
fn parse_target(raw: Option<String>) -> Result<Url, ApiError> {
    let raw = non_empty(raw).ok_or_else(|| ApiError::validation("Missing url parameter"))?;
    let url = Url::parse(&raw).map_err(|e| ApiError::validation(format!("Invalid URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(ApiError::validation(format!(
            "Invalid URL: unsupported scheme {}",
            scheme
        ))),
    }
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, HEAD, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Range"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Length, Content-Range, Accept-Ranges, Content-Type"),
    );
}

/// Stamp CORS headers and count the response
fn finish(mut response: Response) -> Response {
    apply_cors(response.headers_mut());
    metrics::PROXY_RESPONSES
        .with_label_values(&[response.status().as_str()])
        .inc();
    response
}

/// OPTIONS /video-proxy?url=<encoded>
pub async fn preflight(query: Option<Query<VideoProxyQuery>>) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    if let Err(e) = parse_target(query.url) {
        return finish(e.into_response());
    }

    finish(StatusCode::NO_CONTENT.into_response())
}

/// GET|HEAD /video-proxy?url=<encoded>
///
/// Fetches a CDN media URL server-side with the spoofed browser headers the
/// CDN expects, forwards `Range` verbatim, mirrors the upstream status (so
/// 206 round-trips) and pipes the body through without buffering it.
pub async fn video_proxy(
    State(state): State<Arc<AppState>>,
    method: Method,
    query: Option<Query<VideoProxyQuery>>,
    headers: HeaderMap,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let target = match parse_target(query.url) {
        Ok(url) => url,
        Err(e) => return finish(e.into_response()),
    };

    let fingerprint = &state.config.fingerprint;
    let referer = match (non_empty(query.detail_path), non_empty(query.subject_id)) {
        (Some(detail_path), Some(subject_id)) => {
            fingerprint.title_referer(&detail_path, &subject_id)
        }
        _ => fingerprint.site_referer(),
    };

    let upstream_method = if method == Method::HEAD {
        reqwest::Method::HEAD
    } else {
        reqwest::Method::GET
    };

    let mut request = state
        .cdn
        .request(upstream_method, target.as_str())
        .headers(cdn_headers(
            fingerprint,
            &state.config.identity.accept_language,
            &referer,
        ));

    // Forward Range header for seeking, byte for byte
    let range = headers.get(header::RANGE);
    if let Some(value) =
        range.and_then(|v| reqwest_header::HeaderValue::from_bytes(v.as_bytes()).ok())
    {
        request = request.header(reqwest_header::RANGE, value);
    }

    tracing::info!(
        "Video proxy {} {} (range: {})",
        method,
        target.host_str().unwrap_or_default(),
        range
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .unwrap_or("none".into())
    );

    // Nothing has been sent to the client yet, so a failure here can still
    // become a 502
    let upstream = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Video proxy error for {}: {}", target, e);
            return finish(ApiError::BadGateway(e.to_string()).into_response());
        }
    };

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response_headers = HeaderMap::new();
    for name in PASSTHROUGH_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                response_headers.insert(HeaderName::from_static(name), value);
            }
        }
    }

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        // Once the first chunk is out, an upstream failure can only end the
        // connection; the player re-requests with a fresh Range
        let stream = upstream
            .bytes_stream()
            .inspect_ok(|chunk| metrics::PROXY_BYTES.inc_by(chunk.len() as u64))
            .inspect_err(|e| {
                metrics::PROXY_STREAM_FAILURES.inc();
                tracing::warn!("Video proxy stream aborted: {}", e);
            });
        Body::from_stream(stream)
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().extend(response_headers);

    finish(response)
}
