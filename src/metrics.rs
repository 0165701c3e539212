//! Prometheus counters, served by `GET /metrics`.

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    /// Upstream API calls by endpoint and outcome (ok / rejected / transport_error)
    pub static ref UPSTREAM_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "tworuan_upstream_requests_total",
        "Upstream API requests by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .unwrap();

    /// Retries issued after a transport failure
    pub static ref UPSTREAM_RETRIES: IntCounterVec = register_int_counter_vec!(
        "tworuan_upstream_retries_total",
        "Upstream requests retried after a transport failure",
        &["endpoint"]
    )
    .unwrap();

    /// Video proxy responses by status code
    pub static ref PROXY_RESPONSES: IntCounterVec = register_int_counter_vec!(
        "tworuan_proxy_responses_total",
        "Video proxy responses by status code",
        &["status"]
    )
    .unwrap();

    /// Bytes piped from the CDN to clients
    pub static ref PROXY_BYTES: IntCounter = register_int_counter!(
        "tworuan_proxy_bytes_total",
        "Bytes streamed through the video proxy"
    )
    .unwrap();

    /// Streams cut off after the first byte was sent
    pub static ref PROXY_STREAM_FAILURES: IntCounter = register_int_counter!(
        "tworuan_proxy_stream_failures_total",
        "Video proxy streams that failed mid-transfer"
    )
    .unwrap();
}
