//! Service layer
//!
//! Construction happens once at startup from trait-object handles, so tests
//! can assemble the same services over in-memory backends.

pub mod answer;
pub mod chunker;
pub mod indexing;
pub mod papers;
pub mod posts;
pub mod query;
pub mod relevance;

use crate::config::AppConfig;
use crate::db::DocumentStore;
use crate::embeddings::Embedder;
use crate::index::VectorIndex;
use crate::llm::TextGenerator;
use answer::AnswerService;
use indexing::IndexingService;
use papers::{PaperProvider, PaperSearchService};
use posts::PostService;
use query::QueryService;
use std::sync::Arc;

/// Shared handle set behind the HTTP routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub posts: Arc<PostService>,
    pub query: Arc<QueryService>,
    pub indexing: Arc<IndexingService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        provider: Arc<dyn PaperProvider>,
        config: &AppConfig,
    ) -> Self {
        let retrieval = &config.retrieval;
        let indexing = Arc::new(IndexingService::new(
            store.clone(),
            index.clone(),
            embedder.clone(),
            retrieval.chunk_size,
            retrieval.chunk_overlap,
        ));
        let posts = Arc::new(PostService::new(store.clone(), indexing.clone()));
        let answerer = AnswerService::new(generator, retrieval.context_budget_chars);
        let paper_search = PaperSearchService::new(provider, retrieval);
        let query = Arc::new(QueryService::new(
            store.clone(),
            index,
            embedder,
            answerer,
            paper_search,
            retrieval.relevance_threshold,
        ));
        Self {
            store,
            posts,
            query,
            indexing,
        }
    }
}
