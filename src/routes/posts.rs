//! Post CRUD and admin handlers

use crate::db::{Document, NewPost, PostPatch};
use crate::errors::AppError;
use crate::services::indexing::ReindexReport;
use crate::services::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(state.posts.list().await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(state.posts.get(id).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<NewPost>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let created = state.posts.create(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PostPatch>,
) -> Result<Json<Document>, AppError> {
    Ok(Json(state.posts.update(id, body).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.posts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rebuild the whole vector index from stored posts
pub async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexReport>, AppError> {
    Ok(Json(state.indexing.reindex_all().await?))
}
