//! Post lifecycle
//!
//! CRUD over the document store with the vector index kept in step. Index
//! writes are best-effort on this path: the stored post is the source of
//! truth and a reindex can repair any drift.

use crate::db::{Document, DocumentStore, NewPost, PostPatch};
use crate::errors::AppError;
use crate::not_found;
use crate::services::indexing::IndexingService;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

pub struct PostService {
    store: Arc<dyn DocumentStore>,
    indexing: Arc<IndexingService>,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>, indexing: Arc<IndexingService>) -> Self {
        Self { store, indexing }
    }

    pub async fn list(&self) -> Result<Vec<Document>, AppError> {
        self.store.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Document, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found!("post", id))
    }

    #[instrument(skip(self, post), fields(title = %post.title))]
    pub async fn create(&self, post: NewPost) -> Result<Document, AppError> {
        validate_post(&post.title, &post.body)?;
        let created = self.store.insert(post).await?;
        self.indexing.index_post_best_effort(&created).await;
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Document, AppError> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(AppError::ValidationError("title must not be empty".into()));
            }
        }
        if let Some(body) = &patch.body {
            if body.trim().is_empty() {
                return Err(AppError::ValidationError("body must not be empty".into()));
            }
        }
        let updated = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| not_found!("post", id))?;
        self.indexing.index_post_best_effort(&updated).await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_by_id(id).await? {
            return Err(not_found!("post", id));
        }
        self.indexing.remove_post_best_effort(id).await;
        Ok(())
    }
}

fn validate_post(title: &str, body: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::ValidationError("title must not be empty".into()));
    }
    if body.trim().is_empty() {
        return Err(AppError::ValidationError("body must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::embeddings::MockEmbedder;
    use crate::index::{MemoryVectorIndex, VectorIndex};

    fn service() -> (PostService, Arc<MemoryVectorIndex>) {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let indexing = Arc::new(IndexingService::new(
            store.clone(),
            index.clone(),
            Arc::new(MockEmbedder::new(16)),
            2000,
            200,
        ));
        (PostService::new(store, indexing), index)
    }

    #[tokio::test]
    async fn test_create_indexes_post() {
        let (svc, index) = service();
        let post = svc
            .create(NewPost {
                title: "Hello".to_string(),
                body: "World of content".to_string(),
                author_id: None,
            })
            .await
            .unwrap();
        assert!(index.document_embedding(post.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let (svc, _) = service();
        let err = svc
            .create(NewPost {
                title: "   ".to_string(),
                body: "body".to_string(),
                author_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let (svc, _) = service();
        let err = svc.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_clears_index() {
        let (svc, index) = service();
        let post = svc
            .create(NewPost {
                title: "Short lived".to_string(),
                body: "soon gone".to_string(),
                author_id: None,
            })
            .await
            .unwrap();
        svc.delete(post.id).await.unwrap();
        assert!(index.document_embedding(post.id).await.unwrap().is_none());
    }
}
