//! Vector index abstraction.
//!
//! Two named kNN indexes: one over per-post vectors, one over per-chunk
//! vectors, both on cosine distance with a fixed dimension. All query
//! results come back ascending by distance (most similar first).

pub mod memory;
pub mod pgvector;

pub use memory::MemoryVectorIndex;
pub use pgvector::PgVectorIndex;

use crate::errors::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// A chunk ready for indexing
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub index: i32,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Post-level retrieval candidate
#[derive(Debug, Clone)]
pub struct DocumentHit {
    pub post_id: Uuid,
    /// Cosine distance, lower is more similar
    pub score: f64,
}

/// Chunk-level retrieval candidate
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub post_id: Uuid,
    pub chunk_index: i32,
    pub text: String,
    /// Cosine distance, lower is more similar
    pub score: f64,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Idempotent index/table setup. Called once at startup; a failure is
    /// logged by the caller, never fatal.
    async fn ensure_indexes(&self) -> Result<(), AppError>;

    /// Create-or-replace the post-level vector
    async fn upsert_document(
        &self,
        post_id: Uuid,
        title: &str,
        embedding: &[f32],
    ) -> Result<(), AppError>;

    /// Replace ALL chunks for the post with the given set. Delete-then-insert,
    /// never a merge: stale indices from a longer previous body must not
    /// survive.
    async fn upsert_chunks(&self, post_id: Uuid, chunks: Vec<ChunkRecord>) -> Result<(), AppError>;

    /// Remove the post vector and all of its chunks
    async fn delete_document(&self, post_id: Uuid) -> Result<(), AppError>;

    /// The stored post-level vector, if the post has been indexed
    async fn document_embedding(&self, post_id: Uuid) -> Result<Option<Vec<f32>>, AppError>;

    async fn query_documents(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<DocumentHit>, AppError>;

    /// kNN over chunks, optionally scoped to a single post
    async fn query_chunks(
        &self,
        embedding: &[f32],
        k: usize,
        scope: Option<Uuid>,
    ) -> Result<Vec<ChunkHit>, AppError>;
}

/// Cosine distance in [0, 2]; zero-magnitude vectors are maximally distant.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += *x as f64 * *y as f64;
        norm_a += (*x as f64) * (*x as f64);
        norm_b += (*y as f64) * (*y as f64);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 2.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_distance_identity() {
        let v = vec![0.5f32, -0.2, 0.8];
        assert!(cosine_distance(&v, &v).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_distance_opposite() {
        let a = vec![1.0f32, 0.0];
        let b = vec![-1.0f32, 0.0];
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_distance_zero_vector() {
        let a = vec![0.0f32, 0.0];
        let b = vec![1.0f32, 0.0];
        assert_eq!(cosine_distance(&a, &b), 2.0);
    }
}
