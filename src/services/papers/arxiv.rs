//! arXiv Atom API client
//!
//! Tries a small ladder of query strategies (all-fields AND, title/abstract
//! OR, category-scoped) and parses the Atom feed with lightweight regexes
//! rather than a full XML stack.

use crate::config::ArxivConfig;
use crate::errors::AppError;
use crate::services::papers::{jaccard_relevance, PaperResult};
use async_trait::async_trait;
use regex_lite::Regex;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of live research-paper results.
#[async_trait]
pub trait PaperProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        terms: &[String],
        max_results: usize,
    ) -> Result<Vec<PaperResult>, AppError>;
}

pub struct ArxivClient {
    http: reqwest::Client,
    api_url: String,
}

impl ArxivClient {
    pub fn new(config: &ArxivConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
        })
    }

    async fn fetch_feed(&self, search_query: &str, max_results: usize) -> Result<String, AppError> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("search_query", search_query),
                ("start", "0"),
                ("max_results", &(max_results * 2).to_string()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalSearchError(format!("arXiv request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalSearchError(format!(
                "arXiv returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::ExternalSearchError(format!("arXiv response body: {e}")))
    }
}

#[async_trait]
impl PaperProvider for ArxivClient {
    async fn search(
        &self,
        query: &str,
        terms: &[String],
        max_results: usize,
    ) -> Result<Vec<PaperResult>, AppError> {
        let mut last_err = None;
        for strategy in build_strategies(query, terms) {
            debug!(strategy = %strategy, "querying arXiv");
            match self.fetch_feed(&strategy, max_results).await {
                Ok(feed) => {
                    let papers = parse_atom_feed(&feed, terms);
                    if !papers.is_empty() {
                        return Ok(papers);
                    }
                }
                Err(e) => {
                    warn!(strategy = %strategy, error = %e, "arXiv strategy failed");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(vec![]),
        }
    }
}

/// Query strategies in decreasing specificity; the first one that yields
/// entries wins.
fn build_strategies(query: &str, terms: &[String]) -> Vec<String> {
    let mut strategies = Vec::new();

    let all_and = terms
        .iter()
        .map(|t| format!("all:{t}"))
        .collect::<Vec<_>>()
        .join(" AND ");
    strategies.push(all_and);

    let titles = terms
        .iter()
        .take(3)
        .map(|t| format!("ti:{t}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let abstracts = terms
        .iter()
        .map(|t| format!("abs:{t}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    strategies.push(format!("{titles} OR {abstracts}"));

    if let Some(cats) = sniff_categories(query) {
        strategies.push(cats);
    }

    strategies
}

/// Map obvious topic words to arXiv category filters.
fn sniff_categories(query: &str) -> Option<String> {
    let q = query.to_lowercase();
    if q.contains("vision") || q.contains("image") {
        Some("cat:cs.CV".to_string())
    } else if q.contains("language") || q.contains("nlp") || q.contains("text") {
        Some("cat:cs.CL".to_string())
    } else if q.contains("learning") || q.contains("neural") || q.contains("model") {
        Some("cat:cs.LG OR cat:cs.AI".to_string())
    } else {
        None
    }
}

const ABSTRACT_PREVIEW_CHARS: usize = 350;

/// Pull entries out of an Atom feed and score them against the query terms.
pub fn parse_atom_feed(feed: &str, terms: &[String]) -> Vec<PaperResult> {
    // regex_lite compiles these cheaply; the feed is a few hundred KB at most
    let entry_re = Regex::new(r"(?s)<entry>(.*?)</entry>").unwrap();
    let title_re = Regex::new(r"(?s)<title>(.*?)</title>").unwrap();
    let summary_re = Regex::new(r"(?s)<summary>(.*?)</summary>").unwrap();
    let author_re = Regex::new(r"<name>(.*?)</name>").unwrap();
    let id_re = Regex::new(r"<id>(.*?)</id>").unwrap();
    let published_re = Regex::new(r"<published>(\d{4})").unwrap();

    let mut papers = Vec::new();
    for entry in entry_re.captures_iter(feed) {
        let body = &entry[1];
        let title = match title_re.captures(body) {
            Some(c) => clean_xml_text(&c[1]),
            None => continue,
        };
        let summary = summary_re
            .captures(body)
            .map(|c| clean_xml_text(&c[1]))
            .unwrap_or_default();

        let relevance = jaccard_relevance(terms, &title, &summary);
        let title_lc = title.to_lowercase();
        let summary_lc = summary.to_lowercase();
        let literal_hit = terms
            .iter()
            .any(|t| title_lc.contains(t.as_str()) || summary_lc.contains(t.as_str()));
        if relevance <= 0.1 && !literal_hit {
            continue;
        }

        let authors: Vec<String> = author_re
            .captures_iter(body)
            .take(5)
            .map(|c| clean_xml_text(&c[1]))
            .collect();
        let url = id_re
            .captures(body)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        let year = published_re
            .captures(body)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0);

        papers.push(PaperResult {
            title,
            authors: authors.join(", "),
            abstract_text: truncate_abstract(&summary),
            url,
            source: "arxiv".to_string(),
            year,
            doi: None,
            relevance: relevance.max(0.3),
        });
    }
    papers
}

fn truncate_abstract(summary: &str) -> String {
    if summary.chars().count() <= ABSTRACT_PREVIEW_CHARS {
        return summary.to_string();
    }
    let truncated: String = summary.chars().take(ABSTRACT_PREVIEW_CHARS).collect();
    format!("{truncated}...")
}

fn clean_xml_text(raw: &str) -> String {
    raw.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All You Need</title>
    <summary>The dominant sequence transduction models are based on complex
      recurrent or convolutional neural networks. We propose the Transformer,
      based solely on attention mechanisms.</summary>
    <author><name>Ashish Vaswani</name></author>
    <author><name>Noam Shazeer</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/9999.00001</id>
    <published>2020-01-01T00:00:00Z</published>
    <title>Soil Composition of Alpine Meadows</title>
    <summary>We analyze mineral content in high-altitude grassland soil.</summary>
    <author><name>B. Geologist</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_keeps_matching_entries() {
        let terms = vec!["transformer".to_string(), "attention".to_string()];
        let papers = parse_atom_feed(SAMPLE_FEED, &terms);
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "Attention Is All You Need");
        assert_eq!(papers[0].year, 2017);
        assert_eq!(papers[0].authors, "Ashish Vaswani, Noam Shazeer");
        assert!(papers[0].relevance >= 0.3);
        assert!(papers[0].url.contains("1706.03762"));
    }

    #[test]
    fn test_parse_empty_feed() {
        let papers = parse_atom_feed("<feed></feed>", &["anything".to_string()]);
        assert!(papers.is_empty());
    }

    #[test]
    fn test_clean_xml_collapses_whitespace_and_entities() {
        assert_eq!(
            clean_xml_text("Attention &amp; Memory\n    in Networks"),
            "Attention & Memory in Networks"
        );
    }

    #[test]
    fn test_strategy_ladder() {
        let terms = vec!["transformer".to_string(), "attention".to_string()];
        let strategies = build_strategies("transformer attention models", &terms);
        assert_eq!(strategies.len(), 3);
        assert_eq!(strategies[0], "all:transformer AND all:attention");
        assert!(strategies[1].starts_with("ti:transformer OR ti:attention OR abs:"));
        assert_eq!(strategies[2], "cat:cs.LG OR cat:cs.AI");
    }

    #[test]
    fn test_category_sniffing() {
        assert_eq!(
            sniff_categories("computer vision for images").as_deref(),
            Some("cat:cs.CV")
        );
        assert_eq!(sniff_categories("soil chemistry"), None);
    }

    #[test]
    fn test_abstract_truncation() {
        let long = "word ".repeat(200);
        let out = truncate_abstract(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), ABSTRACT_PREVIEW_CHARS + 3);
    }
}
