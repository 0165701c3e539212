//! Catalog routes: title detail and the category list

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::play::non_empty;
use crate::error::ApiError;
use crate::models::{Category, Subject};
use crate::services::upstream::UpstreamError;
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetailQuery {
    pub detail_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub success: bool,
    pub data: Subject,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<Category>,
}

/// A detail path is a slug; an all-digit value is a subjectId pasted in the
/// wrong field
fn validate_detail_path(raw: Option<String>) -> Result<String, ApiError> {
    let detail_path = non_empty(raw).ok_or_else(|| ApiError::validation("Missing detailPath"))?;

    if detail_path.trim().chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation("Invalid movie link"));
    }

    Ok(detail_path.trim().to_string())
}

/// GET /api/detail?detailPath=
pub async fn get_detail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<DetailResponse>, ApiError> {
    let detail_path = validate_detail_path(query.detail_path)?;

    let envelope = state
        .catalog_api
        .detail(&detail_path)
        .await
        .map_err(|e| ApiError::from_upstream(e, "Movie not found"))?;

    let (data, _) = envelope
        .into_parts()
        .map_err(|e| ApiError::from_upstream(e, "Movie not found"))?;

    let subject = data.into_subject(&detail_path);
    tracing::info!(
        "Detail resolved: {} ({}) seasons={}",
        subject.title,
        subject.subject_id,
        subject.seasons.len()
    );

    Ok(Json(DetailResponse {
        success: true,
        data: subject,
    }))
}

/// GET /api/categories
pub async fn get_categories(State(state): State<Arc<AppState>>) -> Json<CategoriesResponse> {
    let loaded = state
        .categories
        .get_or_load(|| async {
            let (data, _) = state.catalog_api.home().await?.into_parts()?;
            Ok::<_, UpstreamError>(data.categories())
        })
        .await;

    match loaded {
        Ok(categories) => Json(CategoriesResponse {
            success: true,
            categories: categories.as_ref().clone(),
        }),
        Err(e) => {
            tracing::warn!("Failed to load categories: {}", e);
            Json(CategoriesResponse {
                success: false,
                categories: Vec::new(),
            })
        }
    }
}
