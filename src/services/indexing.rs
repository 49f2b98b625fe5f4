//! Post indexing
//!
//! Keeps the vector index in step with the document store: one post-level
//! embedding plus a full set of chunk embeddings per post. Write-path callers
//! use the best-effort wrappers so an index outage never fails a post save.

use crate::db::{Document, DocumentStore};
use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::index::{ChunkRecord, VectorIndex};
use crate::services::chunker::chunk_text;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// What a full reindex accomplished.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexReport {
    pub posts: usize,
    pub chunks: usize,
    pub failures: usize,
}

pub struct IndexingService {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl IndexingService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            chunk_size,
            chunk_overlap,
        }
    }

    /// (Re)index one post: post-level vector first, then a full chunk
    /// replacement. Returns the number of chunks written.
    #[instrument(skip(self, post), fields(post_id = %post.id))]
    pub async fn index_post(&self, post: &Document) -> Result<usize, AppError> {
        let text = post.indexable_text();
        let doc_embedding = self.embedder.embed(&text).await?;
        self.index
            .upsert_document(post.id, &post.title, &doc_embedding)
            .await?;

        let mut records = Vec::new();
        for (i, chunk) in chunk_text(&text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
        {
            let embedding = self.embedder.embed(&chunk).await?;
            records.push(ChunkRecord {
                index: i as i32,
                text: chunk,
                embedding,
            });
        }
        let count = records.len();
        self.index.upsert_chunks(post.id, records).await?;

        info!(chunks = count, "post indexed");
        Ok(count)
    }

    /// Remove a post's vectors after deletion.
    pub async fn remove_post(&self, post_id: Uuid) -> Result<(), AppError> {
        self.index.delete_document(post_id).await
    }

    /// Index a post, logging failure instead of surfacing it. The post save
    /// has already committed; a reindex can repair the index later.
    pub async fn index_post_best_effort(&self, post: &Document) {
        if let Err(e) = self.index_post(post).await {
            metrics::counter!("index_write_failures_total").increment(1);
            error!(post_id = %post.id, error = %e, "failed to index post");
        }
    }

    /// Best-effort counterpart of [`remove_post`](Self::remove_post).
    pub async fn remove_post_best_effort(&self, post_id: Uuid) {
        if let Err(e) = self.remove_post(post_id).await {
            metrics::counter!("index_write_failures_total").increment(1);
            error!(post_id = %post_id, error = %e, "failed to remove post from index");
        }
    }

    /// Rebuild vectors for every stored post. Per-post failures are counted
    /// and skipped so one bad post cannot wedge the whole repair.
    #[instrument(skip(self))]
    pub async fn reindex_all(&self) -> Result<ReindexReport, AppError> {
        let posts = self.store.list().await?;
        let mut report = ReindexReport {
            posts: 0,
            chunks: 0,
            failures: 0,
        };
        for post in &posts {
            match self.index_post(post).await {
                Ok(chunks) => {
                    report.posts += 1;
                    report.chunks += chunks;
                }
                Err(e) => {
                    report.failures += 1;
                    error!(post_id = %post.id, error = %e, "reindex failed for post");
                }
            }
        }
        info!(
            posts = report.posts,
            chunks = report.chunks,
            failures = report.failures,
            "reindex complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, NewPost};
    use crate::embeddings::MockEmbedder;
    use crate::index::MemoryVectorIndex;

    fn service(
        store: Arc<MemoryStore>,
        index: Arc<MemoryVectorIndex>,
    ) -> IndexingService {
        IndexingService::new(store, index, Arc::new(MockEmbedder::new(16)), 300, 50)
    }

    #[tokio::test]
    async fn test_index_post_writes_document_and_chunks() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let svc = service(store.clone(), index.clone());

        let post = store
            .insert(NewPost {
                title: "Borrow checker".to_string(),
                body: "lifetimes ".repeat(100),
                author_id: None,
            })
            .await
            .unwrap();

        let chunks = svc.index_post(&post).await.unwrap();
        assert!(chunks > 1);
        assert!(index.document_embedding(post.id).await.unwrap().is_some());
        assert_eq!(index.chunks_for(post.id).await.len(), chunks);
    }

    #[tokio::test]
    async fn test_reindex_rebuilds_everything() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let svc = service(store.clone(), index.clone());

        for i in 0..3 {
            store
                .insert(NewPost {
                    title: format!("Post {i}"),
                    body: "content here".to_string(),
                    author_id: None,
                })
                .await
                .unwrap();
        }

        let report = svc.reindex_all().await.unwrap();
        assert_eq!(report.posts, 3);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.failures, 0);
    }

    #[tokio::test]
    async fn test_remove_post_clears_vectors() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new());
        let svc = service(store.clone(), index.clone());

        let post = store
            .insert(NewPost {
                title: "Ephemeral".to_string(),
                body: "short".to_string(),
                author_id: None,
            })
            .await
            .unwrap();
        svc.index_post(&post).await.unwrap();
        svc.remove_post(post.id).await.unwrap();
        assert!(index.document_embedding(post.id).await.unwrap().is_none());
        assert!(index.chunks_for(post.id).await.is_empty());
    }
}
