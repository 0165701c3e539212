//! Play resolution route
//!
//! Maps (subjectId, detailPath, season, episode) to stream variants by calling
//! the upstream play endpoint with a forged browser session.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::StreamVariant;
use crate::services::upstream::PlayParams;
use crate::AppState;

const DEFAULT_TITLE: &str = "Video Player";

/// Query parameters for play resolution
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayQuery {
    pub subject_id: Option<String>,
    pub detail_path: Option<String>,
    pub se: Option<String>,
    pub ep: Option<String>,
}

impl PlayQuery {
    /// Validate required fields and apply the `se`/`ep` defaults
    pub fn into_params(self) -> Result<PlayParams, ApiError> {
        let subject_id = non_empty(self.subject_id);
        let detail_path = non_empty(self.detail_path);

        match (subject_id, detail_path) {
            (Some(subject_id), Some(detail_path)) => Ok(PlayParams {
                subject_id,
                detail_path,
                season: non_empty(self.se).unwrap_or_else(|| "0".to_string()),
                episode: non_empty(self.ep).unwrap_or_else(|| "0".to_string()),
            }),
            _ => Err(ApiError::validation("Missing subjectId or detailPath")),
        }
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Successful play resolution
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    pub success: bool,
    pub streams: Vec<StreamVariant>,
    pub title: String,
    pub free_num: u32,
    pub limited: bool,
    pub has_resource: bool,
    pub proxy_used: bool,
}

/// GET /api/play?subjectId=&detailPath=&se=&ep=
pub async fn resolve_play(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query.into_params()?;

    tracing::info!(
        "Resolving play: subject={} se={} ep={} path={}",
        params.subject_id,
        params.season,
        params.episode,
        params.detail_path
    );

    let envelope = state
        .play_api
        .play(&params)
        .await
        .map_err(|e| ApiError::from_upstream(e, "No streams available"))?;

    let (data, raw) = envelope
        .into_parts()
        .map_err(|e| ApiError::from_upstream(e, "No streams available"))?;

    let streams = data.variants();
    tracing::info!(
        "Play resolved: subject={} streams={} has_resource={}",
        params.subject_id,
        streams.len(),
        data.has_resource
    );

    if streams.is_empty() {
        return Err(ApiError::Rejected {
            message: "No streams available".to_string(),
            diagnostic: raw,
        });
    }

    Ok(Json(PlayResponse {
        success: true,
        streams,
        title: non_empty(data.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        free_num: data.free_num,
        limited: data.limited,
        has_resource: data.has_resource,
        proxy_used: state.play_api.is_proxied(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_season_and_episode() {
        let params = PlayQuery {
            subject_id: Some("42".into()),
            detail_path: Some("some-film".into()),
            ..Default::default()
        }
        .into_params()
        .unwrap();

        assert_eq!(params.season, "0");
        assert_eq!(params.episode, "0");
    }

    #[test]
    fn test_missing_or_blank_required_fields_fail_validation() {
        let missing_path = PlayQuery {
            subject_id: Some("42".into()),
            ..Default::default()
        };
        assert!(matches!(
            missing_path.into_params(),
            Err(ApiError::Validation(_))
        ));

        let blank_id = PlayQuery {
            subject_id: Some("  ".into()),
            detail_path: Some("x".into()),
            ..Default::default()
        };
        assert!(matches!(blank_id.into_params(), Err(ApiError::Validation(_))));
    }
}
