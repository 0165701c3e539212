//! Subtitle resolution route
//!
//! Captions are an enhancement: every failure degrades to an empty list with
//! status 200 and is only logged.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::play::non_empty;
use crate::models::CaptionTrack;
use crate::services::upstream::CaptionParams;
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleQuery {
    pub subject_id: Option<String>,
    pub detail_path: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubtitleResponse {
    pub captions: Vec<CaptionTrack>,
}

impl SubtitleResponse {
    fn empty() -> Json<Self> {
        Json(Self {
            captions: Vec::new(),
        })
    }
}

/// GET /api/subtitles?subjectId=&detailPath=&id=
pub async fn resolve_subtitles(
    State(state): State<Arc<AppState>>,
    query: Option<Query<SubtitleQuery>>,
) -> Json<SubtitleResponse> {
    // A malformed query string is treated like a missing one
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let (subject_id, detail_path) = match (non_empty(query.subject_id), non_empty(query.detail_path)) {
        (Some(s), Some(d)) => (s, d),
        _ => {
            tracing::debug!("Subtitle request without subjectId/detailPath");
            return SubtitleResponse::empty();
        }
    };

    let params = CaptionParams {
        id: non_empty(query.id).unwrap_or_else(|| state.config.default_caption_id.clone()),
        subject_id,
        detail_path,
    };

    let envelope = match state.catalog_api.captions(&params).await {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!("Subtitles unavailable for {}: {}", params.subject_id, e);
            return SubtitleResponse::empty();
        }
    };

    match envelope.into_parts() {
        Ok((data, _)) => {
            let captions = data.tracks();
            tracing::info!(
                "Subtitles for {}: {} tracks",
                params.subject_id,
                captions.len()
            );
            Json(SubtitleResponse { captions })
        }
        Err(e) => {
            tracing::warn!("Subtitles unavailable for {}: {}", params.subject_id, e);
            SubtitleResponse::empty()
        }
    }
}
