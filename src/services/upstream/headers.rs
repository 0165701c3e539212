//! Header sets presented to the upstream API and its CDN.
//!
//! Values that fail header validation (e.g. an empty or multi-line env value)
//! are skipped instead of failing the request.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE,
    COOKIE, ORIGIN, REFERER, USER_AGENT,
};

use crate::config::{BrowserFingerprint, UpstreamIdentity};

fn put(map: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            map.insert(name, v);
        }
        Err(_) => tracing::warn!("Skipping invalid value for header {}", name),
    }
}

/// Static identity set installed as the client's default headers
pub fn identity_headers(
    identity: &UpstreamIdentity,
    fingerprint: &BrowserFingerprint,
) -> HeaderMap {
    let mut map = HeaderMap::new();
    put(&mut map, ACCEPT, "application/json");
    put(&mut map, ACCEPT_LANGUAGE, &identity.accept_language);
    if !identity.bearer_token.is_empty() {
        put(
            &mut map,
            AUTHORIZATION,
            &format!("Bearer {}", identity.bearer_token),
        );
    }
    put(&mut map, CONTENT_TYPE, "application/json");
    put(&mut map, ORIGIN, &fingerprint.site_origin);
    put(&mut map, REFERER, &fingerprint.site_referer());
    put(
        &mut map,
        HeaderName::from_static("x-client-info"),
        &identity.client_info,
    );
    put(
        &mut map,
        HeaderName::from_static("x-request-lang"),
        &identity.request_lang,
    );
    map
}

/// Browser-session headers for play/caption calls: the per-title referer,
/// the pinned cookie and the fetch metadata a same-origin XHR would carry
pub fn session_headers(
    identity: &UpstreamIdentity,
    fingerprint: &BrowserFingerprint,
    referer: &str,
) -> HeaderMap {
    let mut map = HeaderMap::new();
    put(&mut map, REFERER, referer);
    put(&mut map, USER_AGENT, &fingerprint.user_agent);
    if !identity.session_cookie.is_empty() {
        put(&mut map, COOKIE, &identity.session_cookie);
    }
    put(&mut map, HeaderName::from_static("priority"), "u=1, i");
    put(
        &mut map,
        HeaderName::from_static("sec-ch-ua"),
        &fingerprint.sec_ch_ua,
    );
    put(&mut map, HeaderName::from_static("sec-ch-ua-mobile"), "?0");
    put(
        &mut map,
        HeaderName::from_static("sec-ch-ua-platform"),
        &fingerprint.platform,
    );
    put(&mut map, HeaderName::from_static("sec-fetch-dest"), "empty");
    put(&mut map, HeaderName::from_static("sec-fetch-mode"), "cors");
    put(
        &mut map,
        HeaderName::from_static("sec-fetch-site"),
        "same-origin",
    );
    put(&mut map, HeaderName::from_static("x-source"), "");
    map
}

/// Spoofed triple (plus accept headers) the CDN expects from the web player
pub fn cdn_headers(fingerprint: &BrowserFingerprint, accept_language: &str, referer: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    put(&mut map, ACCEPT, "*/*");
    put(&mut map, ACCEPT_LANGUAGE, accept_language);
    put(&mut map, ORIGIN, &fingerprint.site_origin);
    put(&mut map, REFERER, referer);
    put(&mut map, USER_AGENT, &fingerprint.user_agent);
    map
}
