//! External paper search
//!
//! Merges live arXiv results with a curated fallback corpus, deduplicates by
//! title, ranks by relevance, and applies a quality floor. This service never
//! fails: a provider outage degrades to curated-only results with an
//! explanatory message.

pub mod arxiv;
pub mod curated;

pub use arxiv::{ArxivClient, PaperProvider};

use crate::config::RetrievalConfig;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// One research paper, from either source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperResult {
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
    pub source: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(rename = "relevanceScore")]
    pub relevance: f64,
}

/// What a paper search produced, including the quality-gate verdict.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperSearchOutcome {
    pub papers: Vec<PaperResult>,
    pub no_papers_found: bool,
    pub message: String,
}

impl PaperSearchOutcome {
    fn empty(message: impl Into<String>) -> Self {
        Self {
            papers: vec![],
            no_papers_found: true,
            message: message.into(),
        }
    }
}

pub struct PaperSearchService {
    provider: Arc<dyn PaperProvider>,
    quality_threshold: f64,
    keyword_boost: f64,
    curated_min_relevance: f64,
    live_min_relevance: f64,
    title_dedup_overlap: f64,
}

impl PaperSearchService {
    pub fn new(provider: Arc<dyn PaperProvider>, retrieval: &RetrievalConfig) -> Self {
        Self {
            provider,
            quality_threshold: retrieval.paper_quality_threshold,
            keyword_boost: retrieval.keyword_boost,
            curated_min_relevance: retrieval.curated_min_relevance,
            live_min_relevance: retrieval.live_min_relevance,
            title_dedup_overlap: retrieval.title_dedup_overlap,
        }
    }

    /// Search both sources for `query`, returning up to `max_results` papers.
    ///
    /// Infallible: provider errors degrade to curated-only results.
    pub async fn search(&self, query: &str, max_results: usize) -> PaperSearchOutcome {
        let terms = extract_search_terms(query);
        if terms.is_empty() {
            return PaperSearchOutcome::empty(
                "No relevant research papers found for this topic. Try a more specific technical query.",
            );
        }

        let curated = curated::search_curated(
            &terms,
            self.keyword_boost,
            self.curated_min_relevance,
        );

        let live = match self.provider.search(query, &terms, max_results).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "live paper search failed, falling back to curated corpus");
                if curated.is_empty() {
                    return PaperSearchOutcome::empty(
                        "Research paper search is temporarily unavailable. Please try again later.",
                    );
                }
                vec![]
            }
        };

        let mut merged = merge_papers(live, curated, self.title_dedup_overlap);
        merged.retain(|p| p.relevance > self.live_min_relevance);
        // Every returned paper must clear the quality bar individually; a
        // strong first result does not excuse a weak tail
        merged.retain(|p| p.relevance > self.quality_threshold);
        rank_papers(&mut merged);
        merged.truncate(max_results);

        if merged.is_empty() {
            return PaperSearchOutcome::empty(
                "No relevant research papers found for this topic. Try a more specific technical query.",
            );
        }

        let best = merged.first().map(|p| p.relevance).unwrap_or(0.0);
        info!(count = merged.len(), best_relevance = best, "paper search complete");
        PaperSearchOutcome {
            message: format!("Found {} relevant research papers", merged.len()),
            no_papers_found: false,
            papers: merged,
        }
    }
}

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "with", "this", "that", "what", "how", "why",
    "when", "where", "who", "can", "does", "about", "latest", "recent", "new",
    "current", "paper", "papers", "research", "study", "studies", "article",
    "articles", "find", "show", "tell", "give", "from", "into", "their", "your",
    "have", "has", "was", "were", "will", "would", "could", "should",
];

/// Lowercased significant terms from a free-text query, capped at six.
pub fn extract_search_terms(query: &str) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut seen = HashSet::new();
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| w.len() > 2 && !stop.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .take(6)
        .collect()
}

/// Jaccard similarity between query terms and a paper's title + abstract tokens.
pub fn jaccard_relevance(terms: &[String], title: &str, abstract_text: &str) -> f64 {
    let text = format!("{} {}", title, abstract_text).to_lowercase();
    let tokens: HashSet<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect();
    if terms.is_empty() || tokens.is_empty() {
        return 0.0;
    }
    let term_set: HashSet<&String> = terms.iter().collect();
    let hits = terms.iter().filter(|t| tokens.contains(*t)).count();
    let union = term_set.len() + tokens.len() - hits;
    hits as f64 / union as f64
}

fn significant_title_words(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(str::to_string)
        .collect()
}

/// True when two titles share more than `overlap` of the smaller title's
/// significant words.
fn titles_match(a: &str, b: &str, overlap: f64) -> bool {
    let wa = significant_title_words(a);
    let wb = significant_title_words(b);
    let smaller = wa.len().min(wb.len());
    if smaller == 0 {
        return a.eq_ignore_ascii_case(b);
    }
    let shared = wa.intersection(&wb).count();
    shared as f64 / smaller as f64 > overlap
}

/// Union of both sources; live results win on title collision.
fn merge_papers(
    live: Vec<PaperResult>,
    curated: Vec<PaperResult>,
    overlap: f64,
) -> Vec<PaperResult> {
    let mut merged = live;
    for paper in curated {
        if !merged.iter().any(|p| titles_match(&p.title, &paper.title, overlap)) {
            merged.push(paper);
        }
    }
    merged
}

/// Descending relevance; near-ties (within 0.1) prefer the newer paper.
fn rank_papers(papers: &mut [PaperResult]) {
    papers.sort_by(|a, b| {
        if (a.relevance - b.relevance).abs() <= 0.1 {
            b.year.cmp(&a.year)
        } else {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use async_trait::async_trait;

    struct FixedProvider(Vec<PaperResult>);

    #[async_trait]
    impl PaperProvider for FixedProvider {
        async fn search(
            &self,
            _query: &str,
            _terms: &[String],
            _max_results: usize,
        ) -> Result<Vec<PaperResult>, AppError> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl PaperProvider for FailingProvider {
        async fn search(
            &self,
            _query: &str,
            _terms: &[String],
            _max_results: usize,
        ) -> Result<Vec<PaperResult>, AppError> {
            Err(AppError::ExternalSearchError("connection refused".into()))
        }
    }

    fn paper(title: &str, year: i32, relevance: f64) -> PaperResult {
        PaperResult {
            title: title.to_string(),
            authors: "A. Author".to_string(),
            abstract_text: "An abstract.".to_string(),
            url: "https://example.org".to_string(),
            source: "arxiv".to_string(),
            year,
            doi: None,
            relevance,
        }
    }

    #[test]
    fn test_extract_terms_drops_stop_words() {
        let terms = extract_search_terms("What are the latest papers about transformer attention?");
        assert_eq!(terms, vec!["transformer".to_string(), "attention".to_string()]);
    }

    #[test]
    fn test_extract_terms_cap_and_dedup() {
        let terms =
            extract_search_terms("alpha beta gamma delta epsilon zeta eta alpha beta");
        assert_eq!(terms.len(), 6);
        assert_eq!(terms[0], "alpha");
    }

    #[test]
    fn test_title_dedup() {
        let live = vec![paper("Attention Is All You Need", 2017, 0.8)];
        let curated = vec![
            paper("Attention is all you need", 2017, 0.6),
            paper("Deep Residual Learning", 2015, 0.5),
        ];
        let merged = merge_papers(live, curated, 0.7);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].relevance, 0.8);
    }

    #[test]
    fn test_rank_near_tie_prefers_newer() {
        let mut papers = vec![paper("Old", 2016, 0.52), paper("New", 2023, 0.48)];
        rank_papers(&mut papers);
        assert_eq!(papers[0].title, "New");
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_curated() {
        let svc = PaperSearchService::new(
            Arc::new(FailingProvider),
            &RetrievalConfig::default(),
        );
        let outcome = svc.search("transformer attention mechanisms", 5).await;
        // Curated corpus covers transformers, so the fallback still answers
        assert!(!outcome.no_papers_found);
        assert!(outcome.papers.iter().all(|p| p.source == "curated"));
    }

    #[tokio::test]
    async fn test_nonsense_query_reports_no_papers() {
        let svc = PaperSearchService::new(
            Arc::new(FixedProvider(vec![])),
            &RetrievalConfig::default(),
        );
        let outcome = svc.search("zxqv fnord blorp", 5).await;
        assert!(outcome.no_papers_found);
        assert!(outcome.papers.is_empty());
        assert!(outcome.message.contains("No relevant research papers"));
    }

    #[tokio::test]
    async fn test_quality_floor_applies_to_every_paper() {
        let svc = PaperSearchService::new(
            Arc::new(FixedProvider(vec![
                paper("Strong Match", 2023, 0.9),
                paper("Weak Tail", 2020, 0.15),
            ])),
            &RetrievalConfig::default(),
        );
        let outcome = svc.search("transformer attention mechanisms", 5).await;
        assert!(!outcome.no_papers_found);
        assert!(outcome.papers.iter().all(|p| p.relevance > 0.2));
        assert!(outcome.papers.iter().all(|p| p.title != "Weak Tail"));
    }

    #[tokio::test]
    async fn test_quality_floor_filters_weak_results() {
        let svc = PaperSearchService::new(
            Arc::new(FixedProvider(vec![paper("Barely Related", 2020, 0.15)])),
            &RetrievalConfig::default(),
        );
        let outcome = svc.search("underwater basket weaving dynamics", 5).await;
        assert!(outcome.no_papers_found);
    }
}
