use super::{ChunkHit, ChunkRecord, DocumentHit, VectorIndex};
use crate::errors::AppError;
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Statement};
use uuid::Uuid;

/// Vector index over pgvector, sharing the service's SeaORM connection.
///
/// Layout: `post_vectors` holds one row per post, `chunk_vectors` holds the
/// chunk rows with a cascading FK onto their parent — that FK is the
/// chunk-to-post link the retrieval scoping relies on.
#[derive(Clone)]
pub struct PgVectorIndex {
    db: DatabaseConnection,
    dimension: usize,
}

impl PgVectorIndex {
    pub fn new(db: DatabaseConnection, dimension: usize) -> Self {
        Self { db, dimension }
    }

    async fn execute(&self, sql: &str, values: Vec<sea_orm::Value>) -> Result<(), AppError> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, values);
        self.db
            .execute(stmt)
            .await
            .map_err(|e| AppError::IndexWriteError(e.to_string()))?;
        Ok(())
    }
}

/// pgvector's text representation, e.g. `[0.1,0.2,...]`
fn vector_literal(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10 + 2);
    out.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

fn parse_vector_literal(text: &str) -> Option<Vec<f32>> {
    let trimmed = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    if trimmed.is_empty() {
        return Some(vec![]);
    }
    trimmed
        .split(',')
        .map(|s| s.trim().parse::<f32>().ok())
        .collect()
}

#[derive(Debug, FromQueryResult)]
struct DocumentRow {
    post_id: Uuid,
    score: f64,
}

#[derive(Debug, FromQueryResult)]
struct ChunkRow {
    post_id: Uuid,
    chunk_index: i32,
    content: String,
    score: f64,
}

#[derive(Debug, FromQueryResult)]
struct EmbeddingRow {
    embedding: String,
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        let dim = self.dimension;
        let statements = [
            "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
            format!(
                "CREATE TABLE IF NOT EXISTS post_vectors (
                    post_id UUID PRIMARY KEY,
                    title TEXT NOT NULL,
                    embedding vector({dim}) NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS chunk_vectors (
                    post_id UUID NOT NULL REFERENCES post_vectors(post_id) ON DELETE CASCADE,
                    chunk_index INT NOT NULL,
                    content TEXT NOT NULL,
                    embedding vector({dim}) NOT NULL,
                    PRIMARY KEY (post_id, chunk_index)
                )"
            ),
            "CREATE INDEX IF NOT EXISTS post_vectors_embedding_idx
                ON post_vectors USING hnsw (embedding vector_cosine_ops)"
                .to_string(),
            "CREATE INDEX IF NOT EXISTS chunk_vectors_embedding_idx
                ON chunk_vectors USING hnsw (embedding vector_cosine_ops)"
                .to_string(),
        ];

        for sql in statements {
            self.execute(&sql, vec![]).await?;
        }
        Ok(())
    }

    async fn upsert_document(
        &self,
        post_id: Uuid,
        title: &str,
        embedding: &[f32],
    ) -> Result<(), AppError> {
        self.execute(
            r#"
            INSERT INTO post_vectors (post_id, title, embedding, updated_at)
            VALUES ($1, $2, $3::vector, now())
            ON CONFLICT (post_id)
            DO UPDATE SET title = EXCLUDED.title,
                          embedding = EXCLUDED.embedding,
                          updated_at = now()
            "#,
            vec![
                post_id.into(),
                title.into(),
                vector_literal(embedding).into(),
            ],
        )
        .await
    }

    async fn upsert_chunks(&self, post_id: Uuid, chunks: Vec<ChunkRecord>) -> Result<(), AppError> {
        // Full replacement: drop everything first so a shorter new body never
        // leaves stale high-index chunks behind.
        self.execute(
            "DELETE FROM chunk_vectors WHERE post_id = $1",
            vec![post_id.into()],
        )
        .await?;

        for chunk in chunks {
            self.execute(
                r#"
                INSERT INTO chunk_vectors (post_id, chunk_index, content, embedding)
                VALUES ($1, $2, $3, $4::vector)
                "#,
                vec![
                    post_id.into(),
                    chunk.index.into(),
                    chunk.text.into(),
                    vector_literal(&chunk.embedding).into(),
                ],
            )
            .await?;
        }
        Ok(())
    }

    async fn delete_document(&self, post_id: Uuid) -> Result<(), AppError> {
        // The FK cascade removes the chunks with the parent row
        self.execute(
            "DELETE FROM post_vectors WHERE post_id = $1",
            vec![post_id.into()],
        )
        .await
    }

    async fn document_embedding(&self, post_id: Uuid) -> Result<Option<Vec<f32>>, AppError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT embedding::text AS embedding FROM post_vectors WHERE post_id = $1",
            vec![post_id.into()],
        );
        let row = EmbeddingRow::find_by_statement(stmt).one(&self.db).await?;
        match row {
            Some(r) => parse_vector_literal(&r.embedding)
                .map(Some)
                .ok_or_else(|| {
                    AppError::InternalError(anyhow::anyhow!(
                        "unparseable vector literal for post {post_id}"
                    ))
                }),
            None => Ok(None),
        }
    }

    async fn query_documents(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<DocumentHit>, AppError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT post_id, (embedding <=> $1::vector)::float8 AS score
            FROM post_vectors
            ORDER BY score ASC
            LIMIT $2
            "#,
            vec![vector_literal(embedding).into(), (k as i64).into()],
        );
        let rows = DocumentRow::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|r| DocumentHit {
                post_id: r.post_id,
                score: r.score,
            })
            .collect())
    }

    async fn query_chunks(
        &self,
        embedding: &[f32],
        k: usize,
        scope: Option<Uuid>,
    ) -> Result<Vec<ChunkHit>, AppError> {
        let stmt = match scope {
            Some(post_id) => Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                SELECT post_id, chunk_index, content, (embedding <=> $1::vector)::float8 AS score
                FROM chunk_vectors
                WHERE post_id = $2
                ORDER BY score ASC
                LIMIT $3
                "#,
                vec![
                    vector_literal(embedding).into(),
                    post_id.into(),
                    (k as i64).into(),
                ],
            ),
            None => Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                SELECT post_id, chunk_index, content, (embedding <=> $1::vector)::float8 AS score
                FROM chunk_vectors
                ORDER BY score ASC
                LIMIT $2
                "#,
                vec![vector_literal(embedding).into(), (k as i64).into()],
            ),
        };
        let rows = ChunkRow::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|r| ChunkHit {
                post_id: r.post_id,
                chunk_index: r.chunk_index,
                text: r.content,
                score: r.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal_roundtrip() {
        let v = vec![0.25f32, -1.5, 3.0];
        let lit = vector_literal(&v);
        assert_eq!(lit, "[0.25,-1.5,3]");
        assert_eq!(parse_vector_literal(&lit).unwrap(), v);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_vector_literal("not a vector").is_none());
        assert!(parse_vector_literal("[1.0,oops]").is_none());
    }
}
