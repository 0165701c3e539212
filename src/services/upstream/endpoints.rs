//! Typed calls for the h5 API endpoints the server uses.

use super::client::{UpstreamClient, UpstreamError, UpstreamRequest};
use super::headers;
use super::types::{CaptionData, DetailData, Envelope, HomeData, PlayData};

/// Parameters of a play resolution
#[derive(Debug, Clone)]
pub struct PlayParams {
    pub subject_id: String,
    pub detail_path: String,
    pub season: String,
    pub episode: String,
}

/// Parameters of a caption lookup
#[derive(Debug, Clone)]
pub struct CaptionParams {
    pub id: String,
    pub subject_id: String,
    pub detail_path: String,
}

impl UpstreamClient {
    fn title_session(&self, detail_path: &str, subject_id: &str) -> reqwest::header::HeaderMap {
        let referer = self.fingerprint().title_referer(detail_path, subject_id);
        headers::session_headers(self.identity(), self.fingerprint(), &referer)
    }

    /// GET /subject/play
    pub async fn play(&self, params: &PlayParams) -> Result<Envelope<PlayData>, UpstreamError> {
        let request = UpstreamRequest::get("play", "/subject/play")
            .query("subjectId", params.subject_id.as_str())
            .query("se", params.season.as_str())
            .query("ep", params.episode.as_str())
            .query("detailPath", params.detail_path.as_str())
            .headers(self.title_session(&params.detail_path, &params.subject_id));

        self.fetch(request).await
    }

    /// GET /subject/caption
    pub async fn captions(
        &self,
        params: &CaptionParams,
    ) -> Result<Envelope<CaptionData>, UpstreamError> {
        let request = UpstreamRequest::get("caption", "/subject/caption")
            .query("format", "MP4")
            .query("id", params.id.as_str())
            .query("subjectId", params.subject_id.as_str())
            .query("detailPath", params.detail_path.as_str())
            .headers(self.title_session(&params.detail_path, &params.subject_id));

        self.fetch(request).await
    }

    /// GET /detail
    pub async fn detail(&self, detail_path: &str) -> Result<Envelope<DetailData>, UpstreamError> {
        let request = UpstreamRequest::get("detail", "/detail").query("detailPath", detail_path);
        self.fetch(request).await
    }

    /// GET /home (category platforms live in `platformList`)
    pub async fn home(&self) -> Result<Envelope<HomeData>, UpstreamError> {
        let host = self
            .fingerprint()
            .site_origin
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        let request = UpstreamRequest::get("home", "/home").query("host", host);
        self.fetch(request).await
    }
}
