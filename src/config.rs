use std::env;

/// Static identity presented to the upstream media API on every request
#[derive(Debug, Clone)]
pub struct UpstreamIdentity {
    /// Bearer token for the `authorization` header (omitted when empty)
    pub bearer_token: String,
    /// Pinned session cookie sent on play/caption requests (omitted when empty)
    pub session_cookie: String,
    pub accept_language: String,
    /// Value of `x-client-info`
    pub client_info: String,
    /// Value of `x-request-lang`
    pub request_lang: String,
}

/// Browser fingerprint used to make server-side requests look like the
/// upstream's own web player
#[derive(Debug, Clone)]
pub struct BrowserFingerprint {
    /// Origin of the upstream site, e.g. `https://themoviebox.org`
    pub site_origin: String,
    pub user_agent: String,
    pub sec_ch_ua: String,
    pub platform: String,
}

impl BrowserFingerprint {
    /// Site root referer (`https://themoviebox.org/`)
    pub fn site_referer(&self) -> String {
        format!("{}/", self.site_origin.trim_end_matches('/'))
    }

    /// Per-title referer the play endpoint validates against
    pub fn title_referer(&self, detail_path: &str, subject_id: &str) -> String {
        format!(
            "{}/movies/{}?id={}&type=/movie/detail&detailSe=&detailEp=&lang=en",
            self.site_origin.trim_end_matches('/'),
            detail_path,
            subject_id
        )
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,

    // Upstream
    pub api_base_url: String,
    pub play_base_url: String,
    pub identity: UpstreamIdentity,
    pub fingerprint: BrowserFingerprint,
    pub upstream_timeout_ms: u64,
    pub retry_delay_ms: u64,
    pub egress_proxy: Option<String>,

    // Video proxy
    pub proxy_connect_timeout_ms: u64,

    // Captions
    pub default_caption_id: String,
}

const DEFAULT_BASE_URL: &str = "https://h5-api.aoneroom.com/wefeed-h5api-bff";
const DEFAULT_SITE_ORIGIN: &str = "https://themoviebox.org";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9,id;q=0.8";
const DEFAULT_CLIENT_INFO: &str = r#"{"timezone":"Asia/Jakarta"}"#;
const DEFAULT_PLATFORM: &str = r#""Windows""#;
const DEFAULT_CAPTION_ID: &str = "1274577250519862264";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";
const DEFAULT_SEC_CH_UA: &str =
    r#""Not(A:Brand";v="8", "Chromium";v="144", "Google Chrome";v="144""#;

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3003".to_string())
                .parse()
                .unwrap_or(3003),
            node_env: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),

            // Upstream
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            play_base_url: env::var("PLAY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            identity: UpstreamIdentity {
                bearer_token: env::var("UPSTREAM_BEARER_TOKEN").unwrap_or_default(),
                session_cookie: env::var("UPSTREAM_SESSION_COOKIE").unwrap_or_default(),
                accept_language: env::var("UPSTREAM_ACCEPT_LANGUAGE")
                    .unwrap_or_else(|_| DEFAULT_ACCEPT_LANGUAGE.to_string()),
                client_info: env::var("UPSTREAM_CLIENT_INFO")
                    .unwrap_or_else(|_| DEFAULT_CLIENT_INFO.to_string()),
                request_lang: env::var("UPSTREAM_REQUEST_LANG")
                    .unwrap_or_else(|_| "en".to_string()),
            },
            fingerprint: BrowserFingerprint {
                site_origin: env::var("SITE_ORIGIN")
                    .unwrap_or_else(|_| DEFAULT_SITE_ORIGIN.to_string()),
                user_agent: env::var("SPOOF_USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
                sec_ch_ua: env::var("SPOOF_SEC_CH_UA")
                    .unwrap_or_else(|_| DEFAULT_SEC_CH_UA.to_string()),
                platform: env::var("SPOOF_PLATFORM")
                    .unwrap_or_else(|_| DEFAULT_PLATFORM.to_string()),
            },
            upstream_timeout_ms: env::var("UPSTREAM_TIMEOUT_MS")
                .unwrap_or_else(|_| "45000".to_string())
                .parse()
                .unwrap_or(45_000), // 45 seconds
            retry_delay_ms: env::var("UPSTREAM_RETRY_DELAY_MS")
                .unwrap_or_else(|_| "1500".to_string())
                .parse()
                .unwrap_or(1_500),
            egress_proxy: env::var("UPSTREAM_EGRESS_PROXY")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            // Video proxy
            proxy_connect_timeout_ms: env::var("PROXY_CONNECT_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15_000), // 15 seconds

            // Captions
            default_caption_id: env::var("DEFAULT_CAPTION_ID")
                .unwrap_or_else(|_| DEFAULT_CAPTION_ID.to_string()),
        }
    }

    /// Fixed configuration pointing every upstream at `base_url`, with short
    /// delays and test credentials. Never reads the environment.
    #[doc(hidden)]
    pub fn for_upstream(base_url: &str) -> Self {
        Self {
            port: 0,
            node_env: "test".to_string(),
            api_base_url: base_url.to_string(),
            play_base_url: base_url.to_string(),
            identity: UpstreamIdentity {
                bearer_token: "test-token".to_string(),
                session_cookie: "mb_token=test; i18n_lang=en".to_string(),
                accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
                client_info: DEFAULT_CLIENT_INFO.to_string(),
                request_lang: "en".to_string(),
            },
            fingerprint: BrowserFingerprint {
                site_origin: DEFAULT_SITE_ORIGIN.to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
                sec_ch_ua: DEFAULT_SEC_CH_UA.to_string(),
                platform: DEFAULT_PLATFORM.to_string(),
            },
            upstream_timeout_ms: 5_000,
            retry_delay_ms: 10,
            egress_proxy: None,
            proxy_connect_timeout_ms: 2_000,
            default_caption_id: DEFAULT_CAPTION_ID.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
