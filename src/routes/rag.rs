//! Retrieval handlers: search, related posts, and ask

use crate::errors::AppError;
use crate::services::query::{AskResponse, ScoredPost, SearchResponse};
use crate::services::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

const MAX_SEARCH_K: usize = 50;
const MAX_RELATED_K: usize = 20;
const MAX_ASK_K: usize = 20;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct RelatedParams {
    pub k: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskBody {
    #[serde(default)]
    pub question: String,
    pub post_id: Option<Uuid>,
    pub k: Option<usize>,
}

fn clamp_k(requested: Option<usize>, default: usize, max: usize) -> usize {
    requested.unwrap_or(default).clamp(1, max)
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::ValidationError(
            "query parameter 'q' must not be empty".into(),
        ));
    }
    let k = clamp_k(params.k, 10, MAX_SEARCH_K);
    Ok(Json(state.query.search(query, k).await?))
}

pub async fn related_posts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RelatedParams>,
) -> Result<Json<Vec<ScoredPost>>, AppError> {
    let k = clamp_k(params.k, 5, MAX_RELATED_K);
    Ok(Json(state.query.related(id, k).await?))
}

pub async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<Json<AskResponse>, AppError> {
    let question = body.question.trim();
    if question.is_empty() {
        return Err(AppError::ValidationError(
            "'question' must not be empty".into(),
        ));
    }
    let k = clamp_k(body.k, 6, MAX_ASK_K);
    Ok(Json(state.query.ask(question, body.post_id, k).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_k_defaults_and_bounds() {
        assert_eq!(clamp_k(None, 10, 50), 10);
        assert_eq!(clamp_k(Some(0), 10, 50), 1);
        assert_eq!(clamp_k(Some(500), 10, 50), 50);
        assert_eq!(clamp_k(Some(7), 10, 50), 7);
    }
}
