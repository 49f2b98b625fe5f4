use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// "live" wires real Postgres/Gemini collaborators; "mock" wires the
    /// in-memory store, in-memory vector index and mock model clients.
    pub mode: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmConfig,
    pub arxiv: ArxivConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingsConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArxivConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

/// Tunable retrieval parameters.
///
/// Scores coming out of the vector index are cosine distances (lower is more
/// similar, range [0, 2]); `relevance_threshold` only makes sense under that
/// convention.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Chunk window size in characters
    pub chunk_size: usize,
    /// Backward overlap between consecutive chunks, in characters
    pub chunk_overlap: usize,
    /// A candidate set is relevant iff any distance is strictly below this
    pub relevance_threshold: f64,
    /// Character budget for the synthesized answer's context window
    pub context_budget_chars: usize,
    /// Minimum relevance for a paper to count as a real finding
    pub paper_quality_threshold: f64,
    /// Added to a curated paper's score when a keyword tag matches a term
    pub keyword_boost: f64,
    /// Curated papers below this score are dropped before merging
    pub curated_min_relevance: f64,
    /// Live results below this score are dropped unless a term literally
    /// appears in their title or abstract
    pub live_min_relevance: f64,
    /// Two titles are duplicates when shared significant words exceed this
    /// fraction of the smaller title's significant words
    pub title_dedup_overlap: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
            relevance_threshold: 1.5,
            context_budget_chars: 12_000,
            paper_quality_threshold: 0.2,
            keyword_boost: 0.3,
            curated_min_relevance: 0.15,
            live_min_relevance: 0.1,
            title_dedup_overlap: 0.7,
        }
    }
}

impl AppConfig {
    pub fn build() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("mode", "live")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.rust_log", "info,inkpress=debug")?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("server.max_concurrent_requests", 100)?
            .set_default("database.url", "postgres://localhost/inkpress")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 30)?
            .set_default(
                "embeddings.api_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("embeddings.api_key", "")?
            .set_default("embeddings.model", "text-embedding-004")?
            .set_default("embeddings.dimension", 768)?
            .set_default("embeddings.timeout_secs", 30)?
            .set_default(
                "llm.api_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("llm.api_key", "")?
            .set_default("llm.model", "gemini-1.5-flash")?
            .set_default("llm.timeout_secs", 30)?
            .set_default("arxiv.api_url", "http://export.arxiv.org/api/query")?
            .set_default("arxiv.timeout_secs", 10)?
            .set_default("retrieval.chunk_size", 2000)?
            .set_default("retrieval.chunk_overlap", 200)?
            .set_default("retrieval.relevance_threshold", 1.5)?
            .set_default("retrieval.context_budget_chars", 12_000)?
            .set_default("retrieval.paper_quality_threshold", 0.2)?
            .set_default("retrieval.keyword_boost", 0.3)?
            .set_default("retrieval.curated_min_relevance", 0.15)?
            .set_default("retrieval.live_min_relevance", 0.1)?
            .set_default("retrieval.title_dedup_overlap", 0.7)?
            // E.g. `APP_SERVER__PORT=8080` sets `server.port`
            .add_source(Environment::default().separator("__").prefix("APP"));

        builder.build()?.try_deserialize()
    }

    /// Missing model credentials are a startup error, not something to
    /// discover on the first request.
    pub fn validate_live(&self) -> Result<(), String> {
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err("retrieval.chunk_overlap must be smaller than retrieval.chunk_size".into());
        }
        if self.mode != "live" {
            return Ok(());
        }
        if self.embeddings.api_key.is_empty() {
            return Err("embeddings.api_key is required in live mode (APP_EMBEDDINGS__API_KEY)".into());
        }
        if self.llm.api_key.is_empty() {
            return Err("llm.api_key is required in live mode (APP_LLM__API_KEY)".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_defaults() {
        let cfg = RetrievalConfig::default();
        assert_eq!(cfg.chunk_size, 2000);
        assert_eq!(cfg.chunk_overlap, 200);
        assert!(cfg.chunk_overlap < cfg.chunk_size);
        assert_eq!(cfg.relevance_threshold, 1.5);
        assert_eq!(cfg.context_budget_chars, 12_000);
    }
}
