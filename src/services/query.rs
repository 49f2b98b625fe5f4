//! Query orchestration
//!
//! The read side of the pipeline: semantic post search, related-post lookup,
//! and question answering. Vector retrieval and external paper search run
//! concurrently; the relevance gate decides whether the answer path may call
//! the generator at all.

use crate::db::{Document, DocumentStore};
use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::index::{ChunkHit, DocumentHit, VectorIndex};
use crate::not_found;
use crate::services::answer::{AnswerService, ContextSnippet, NO_CONTENT_ANSWER};
use crate::services::papers::{PaperResult, PaperSearchService};
use crate::services::relevance::GateOutcome;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// A post carrying its retrieval score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPost {
    #[serde(flatten)]
    pub post: Document,
    #[serde(rename = "_score")]
    pub score: f64,
}

/// A cited post in an answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub post_id: Uuid,
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub posts: Vec<ScoredPost>,
    pub sources: Vec<SourceRef>,
    pub papers: Vec<PaperResult>,
    pub no_papers_found: bool,
    pub papers_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_relevant_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar_posts: Option<Vec<ScoredPost>>,
    pub papers: Vec<PaperResult>,
    pub no_papers_found: bool,
    pub papers_message: String,
}

pub struct QueryService {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    answerer: AnswerService,
    papers: PaperSearchService,
    relevance_threshold: f64,
}

impl QueryService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        answerer: AnswerService,
        papers: PaperSearchService,
        relevance_threshold: f64,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            answerer,
            papers,
            relevance_threshold,
        }
    }

    /// Semantic search over posts, with external papers alongside.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, k: usize) -> Result<SearchResponse, AppError> {
        let embedding = self.embedder.embed(query).await?;
        let (hits, papers) = tokio::join!(
            self.index.query_documents(&embedding, k),
            self.papers.search(query, 5),
        );
        let posts = self.load_scored(&hits?).await?;
        let sources = posts
            .iter()
            .map(|p| SourceRef {
                post_id: p.post.id,
                title: p.post.title.clone(),
            })
            .collect();

        metrics::counter!("search_requests_total").increment(1);
        Ok(SearchResponse {
            posts,
            sources,
            papers: papers.papers,
            no_papers_found: papers.no_papers_found,
            papers_message: papers.message,
        })
    }

    /// Posts most similar to an existing post, excluding the post itself.
    ///
    /// Uses the stored post-level vector when present; an unindexed post is
    /// embedded on the fly from its current text.
    #[instrument(skip(self))]
    pub async fn related(&self, post_id: Uuid, k: usize) -> Result<Vec<ScoredPost>, AppError> {
        let embedding = match self.index.document_embedding(post_id).await? {
            Some(v) => v,
            None => {
                let post = self
                    .store
                    .find_by_id(post_id)
                    .await?
                    .ok_or_else(|| not_found!("post", post_id))?;
                self.embedder.embed(&post.indexable_text()).await?
            }
        };

        let mut hits = self.index.query_documents(&embedding, k + 1).await?;
        hits.retain(|h| h.post_id != post_id);
        hits.truncate(k);
        self.load_scored(&hits).await
    }

    /// Answer a question from indexed blog content, optionally scoped to one
    /// post. Chunk retrieval, site-wide document retrieval, and paper search
    /// run concurrently; both relevance gates failing short-circuits to the
    /// canned answer without touching the generator.
    #[instrument(skip(self), fields(scoped = post_id.is_some()))]
    pub async fn ask(
        &self,
        question: &str,
        post_id: Option<Uuid>,
        k: usize,
    ) -> Result<AskResponse, AppError> {
        // A scope must name a real post; an unknown id is the caller's error,
        // not an empty-retrieval outcome
        if let Some(scoped) = post_id {
            if self.store.find_by_id(scoped).await?.is_none() {
                return Err(not_found!("post", scoped));
            }
        }

        let embedding = self.embedder.embed(question).await?;
        let (chunk_hits, doc_hits, papers) = tokio::join!(
            self.index.query_chunks(&embedding, k, post_id),
            self.index.query_documents(&embedding, k),
            self.papers.search(question, 5),
        );
        let chunk_hits = chunk_hits?;
        let doc_hits = doc_hits?;

        let chunk_scores: Vec<f64> = chunk_hits.iter().map(|h| h.score).collect();
        let doc_scores: Vec<f64> = doc_hits.iter().map(|h| h.score).collect();
        let gate = GateOutcome::evaluate(&chunk_scores, &doc_scores, self.relevance_threshold);
        debug!(
            chunks = chunk_hits.len(),
            documents = doc_hits.len(),
            chunks_relevant = gate.chunks_relevant,
            documents_relevant = gate.documents_relevant,
            "relevance gate evaluated"
        );

        if gate.no_relevant_content() {
            metrics::counter!("ask_no_content_total").increment(1);
            return Ok(AskResponse {
                answer: NO_CONTENT_ANSWER.to_string(),
                no_relevant_content: Some(true),
                sources: None,
                similar_posts: None,
                papers: papers.papers,
                no_papers_found: papers.no_papers_found,
                papers_message: papers.message,
            });
        }

        let snippets = to_snippets(&chunk_hits);
        let synthesized = self.answerer.synthesize(question, snippets).await?;

        // Similar posts come from the site-wide document hits; a scoped ask
        // should not list the scoped post as similar to itself
        let mut similar_hits = doc_hits;
        if let Some(scoped) = post_id {
            similar_hits.retain(|h| h.post_id != scoped);
        }
        let similar_posts = self.load_scored(&similar_hits).await?;

        // Sources are only meaningful for a site-wide ask; a scoped ask can
        // only ever cite the post it was scoped to
        let sources = if post_id.is_none() {
            Some(self.resolve_sources(&synthesized.used).await?)
        } else {
            None
        };

        metrics::counter!("ask_requests_total").increment(1);
        Ok(AskResponse {
            answer: synthesized.answer,
            no_relevant_content: None,
            sources,
            similar_posts: Some(similar_posts),
            papers: papers.papers,
            no_papers_found: papers.no_papers_found,
            papers_message: papers.message,
        })
    }

    /// Hydrate hits into posts, preserving the hit order and dropping hits
    /// whose post has been deleted since indexing.
    async fn load_scored(&self, hits: &[DocumentHit]) -> Result<Vec<ScoredPost>, AppError> {
        if hits.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<Uuid> = hits.iter().map(|h| h.post_id).collect();
        let posts = self.store.find_by_ids(&ids).await?;
        Ok(hits
            .iter()
            .filter_map(|hit| {
                posts
                    .iter()
                    .find(|p| p.id == hit.post_id)
                    .map(|p| ScoredPost {
                        post: p.clone(),
                        score: hit.score,
                    })
            })
            .collect())
    }

    /// Distinct posts behind the used contexts, in first-use order.
    async fn resolve_sources(&self, used: &[ContextSnippet]) -> Result<Vec<SourceRef>, AppError> {
        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = used
            .iter()
            .map(|s| s.post_id)
            .filter(|id| seen.insert(*id))
            .collect();
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let posts = self.store.find_by_ids(&ids).await?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                posts.iter().find(|p| p.id == *id).map(|p| SourceRef {
                    post_id: p.id,
                    title: p.title.clone(),
                })
            })
            .collect())
    }
}

fn to_snippets(hits: &[ChunkHit]) -> Vec<ContextSnippet> {
    hits.iter()
        .map(|h| ContextSnippet {
            post_id: h.post_id,
            chunk_index: h.chunk_index,
            text: h.text.clone(),
            score: h.score,
        })
        .collect()
}
