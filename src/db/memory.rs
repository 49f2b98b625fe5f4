use super::{Document, DocumentStore, NewPost, PostPatch};
use crate::errors::AppError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory post store for mock mode and tests
#[derive(Default)]
pub struct MemoryStore {
    posts: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Document>, AppError> {
        let posts = self.posts.read().await;
        let mut all: Vec<Document> = posts.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError> {
        let posts = self.posts.read().await;
        Ok(ids.iter().filter_map(|id| posts.get(id).cloned()).collect())
    }

    async fn insert(&self, post: NewPost) -> Result<Document, AppError> {
        let now = Utc::now();
        let doc = Document {
            id: Uuid::new_v4(),
            title: post.title,
            body: post.body,
            author: None,
            created_at: now,
            updated_at: now,
        };
        self.posts.write().await.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Option<Document>, AppError> {
        let mut posts = self.posts.write().await;
        let Some(doc) = posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(body) = patch.body {
            doc.body = body;
        }
        doc.updated_at = Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.posts.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let store = MemoryStore::new();
        let doc = store
            .insert(NewPost {
                title: "Hello".into(),
                body: "World".into(),
                author_id: None,
            })
            .await
            .unwrap();

        let found = store.find_by_id(doc.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Hello");

        let updated = store
            .update(
                doc.id,
                PostPatch {
                    body: Some("Updated".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.body, "Updated");
        assert_eq!(updated.title, "Hello");

        assert!(store.delete_by_id(doc.id).await.unwrap());
        assert!(store.find_by_id(doc.id).await.unwrap().is_none());
    }
}
