//! Answer synthesis
//!
//! Packs retrieved chunks into a character-budgeted prompt and asks the text
//! generator for a grounded answer. When no usable context survives selection
//! the canned fallback is returned without calling the generator at all.

use crate::errors::AppError;
use crate::llm::TextGenerator;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Fallback answer when retrieval produced nothing relevant.
pub const NO_CONTENT_ANSWER: &str =
    "I don't have any relevant blog content to answer this question yet.";

/// One retrieved chunk offered as answer context.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnippet {
    pub post_id: Uuid,
    pub chunk_index: i32,
    #[serde(skip_serializing)]
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct SynthesizedAnswer {
    pub answer: String,
    pub used: Vec<ContextSnippet>,
}

pub struct AnswerService {
    generator: Arc<dyn TextGenerator>,
    context_budget_chars: usize,
}

impl AnswerService {
    pub fn new(generator: Arc<dyn TextGenerator>, context_budget_chars: usize) -> Self {
        Self {
            generator,
            context_budget_chars,
        }
    }

    /// Produce an answer to `question` from `snippets`.
    ///
    /// Snippets must already be relevance-ordered (best first); selection is a
    /// greedy prefix under the character budget.
    pub async fn synthesize(
        &self,
        question: &str,
        snippets: Vec<ContextSnippet>,
    ) -> Result<SynthesizedAnswer, AppError> {
        let selected = select_contexts(snippets, self.context_budget_chars);
        if selected.is_empty() {
            return Ok(SynthesizedAnswer {
                answer: NO_CONTENT_ANSWER.to_string(),
                used: vec![],
            });
        }

        let prompt = build_prompt(question, &selected);
        debug!(
            contexts = selected.len(),
            prompt_chars = prompt.chars().count(),
            "synthesizing answer"
        );
        let answer = self.generator.generate(&prompt).await?;
        Ok(SynthesizedAnswer {
            answer,
            used: selected,
        })
    }
}

/// Greedy prefix of non-blank snippets whose total text fits the budget.
fn select_contexts(snippets: Vec<ContextSnippet>, budget: usize) -> Vec<ContextSnippet> {
    let mut selected = Vec::new();
    let mut used = 0usize;
    for snippet in snippets {
        if snippet.text.trim().is_empty() {
            continue;
        }
        let len = snippet.text.chars().count();
        if used + len > budget {
            break;
        }
        used += len;
        selected.push(snippet);
    }
    selected
}

fn build_prompt(question: &str, contexts: &[ContextSnippet]) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant answering questions about a blog. \
         Answer ONLY from the context excerpts below. If the context does not \
         contain the answer, say you don't know. Do not mention excerpt \
         numbers or internal identifiers in your answer.\n\n",
    );
    prompt.push_str(&format!("QUESTION: {question}\n\nCONTEXT:\n"));
    for (i, ctx) in contexts.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n\n", i + 1, ctx.text));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockGenerator;

    fn snippet(text: &str, score: f64) -> ContextSnippet {
        ContextSnippet {
            post_id: Uuid::new_v4(),
            chunk_index: 0,
            text: text.to_string(),
            score,
        }
    }

    #[tokio::test]
    async fn test_empty_contexts_skip_generator() {
        let gen = Arc::new(MockGenerator::default());
        let svc = AnswerService::new(gen.clone(), 12_000);
        let out = svc.synthesize("What is Rust?", vec![]).await.unwrap();
        assert_eq!(out.answer, NO_CONTENT_ANSWER);
        assert!(out.used.is_empty());
        assert_eq!(gen.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_contexts_skip_generator() {
        let gen = Arc::new(MockGenerator::default());
        let svc = AnswerService::new(gen.clone(), 12_000);
        let out = svc
            .synthesize("anything", vec![snippet("   ", 0.2), snippet("", 0.3)])
            .await
            .unwrap();
        assert_eq!(out.answer, NO_CONTENT_ANSWER);
        assert_eq!(gen.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_generator_call_with_context() {
        let gen = Arc::new(MockGenerator::default());
        let svc = AnswerService::new(gen.clone(), 12_000);
        let out = svc
            .synthesize(
                "How does ownership work?",
                vec![snippet("Ownership moves values between bindings.", 0.2)],
            )
            .await
            .unwrap();
        assert_eq!(gen.call_count(), 1);
        assert_eq!(out.used.len(), 1);
        assert!(out.answer.contains("How does ownership work?"));
    }

    #[test]
    fn test_budget_is_exclusive() {
        let selected = select_contexts(
            vec![snippet("aaaaa", 0.1), snippet("bbbbb", 0.2), snippet("ccccc", 0.3)],
            10,
        );
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1].text, "bbbbb");
    }

    #[test]
    fn test_blank_snippets_do_not_consume_budget() {
        let selected = select_contexts(
            vec![snippet("  ", 0.1), snippet("hello", 0.2)],
            5,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].text, "hello");
    }

    #[test]
    fn test_prompt_contains_question_line() {
        let prompt = build_prompt("Why async?", &[snippet("Futures are lazy.", 0.1)]);
        assert!(prompt.lines().any(|l| l == "QUESTION: Why async?"));
        assert!(prompt.contains("1. Futures are lazy."));
    }
}
