use super::{cosine_distance, ChunkHit, ChunkRecord, DocumentHit, VectorIndex};
use crate::errors::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

struct DocEntry {
    #[allow(dead_code)]
    title: String,
    embedding: Vec<f32>,
}

/// Brute-force in-memory vector index for mock mode and tests.
/// Implements the same cosine-distance-ascending convention as pgvector so
/// the relevance threshold transfers unchanged.
#[derive(Default)]
pub struct MemoryVectorIndex {
    documents: RwLock<HashMap<Uuid, DocEntry>>,
    chunks: RwLock<HashMap<Uuid, Vec<ChunkRecord>>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: the chunks currently stored for a post, in index order
    pub async fn chunks_for(&self, post_id: Uuid) -> Vec<ChunkRecord> {
        let chunks = self.chunks.read().await;
        let mut out = chunks.get(&post_id).cloned().unwrap_or_default();
        out.sort_by_key(|c| c.index);
        out
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn upsert_document(
        &self,
        post_id: Uuid,
        title: &str,
        embedding: &[f32],
    ) -> Result<(), AppError> {
        self.documents.write().await.insert(
            post_id,
            DocEntry {
                title: title.to_string(),
                embedding: embedding.to_vec(),
            },
        );
        Ok(())
    }

    async fn upsert_chunks(&self, post_id: Uuid, chunks: Vec<ChunkRecord>) -> Result<(), AppError> {
        self.chunks.write().await.insert(post_id, chunks);
        Ok(())
    }

    async fn delete_document(&self, post_id: Uuid) -> Result<(), AppError> {
        self.documents.write().await.remove(&post_id);
        self.chunks.write().await.remove(&post_id);
        Ok(())
    }

    async fn document_embedding(&self, post_id: Uuid) -> Result<Option<Vec<f32>>, AppError> {
        Ok(self
            .documents
            .read()
            .await
            .get(&post_id)
            .map(|d| d.embedding.clone()))
    }

    async fn query_documents(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<DocumentHit>, AppError> {
        let documents = self.documents.read().await;
        let mut hits: Vec<DocumentHit> = documents
            .iter()
            .map(|(id, entry)| DocumentHit {
                post_id: *id,
                score: cosine_distance(embedding, &entry.embedding),
            })
            .collect();
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn query_chunks(
        &self,
        embedding: &[f32],
        k: usize,
        scope: Option<Uuid>,
    ) -> Result<Vec<ChunkHit>, AppError> {
        let chunks = self.chunks.read().await;
        let mut hits: Vec<ChunkHit> = chunks
            .iter()
            .filter(|(id, _)| scope.map(|s| s == **id).unwrap_or(true))
            .flat_map(|(id, records)| {
                records.iter().map(move |c| ChunkHit {
                    post_id: *id,
                    chunk_index: c.index,
                    text: c.text.clone(),
                    score: cosine_distance(embedding, &c.embedding),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits.truncate(k);
        Ok(hits)
    }
}
