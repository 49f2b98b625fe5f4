//! Relevance gate over cosine-distance scores.
//!
//! Scores arrive as cosine distances (lower is closer). A result set is
//! relevant when at least one score falls strictly below the configured
//! threshold. An empty result set is never relevant.

/// True if any score is strictly below `threshold`.
pub fn any_relevant(scores: &[f64], threshold: f64) -> bool {
    scores.iter().any(|&s| s < threshold)
}

/// Gate decisions for one question, chunks and whole documents judged
/// independently.
#[derive(Debug, Clone, Copy)]
pub struct GateOutcome {
    pub chunks_relevant: bool,
    pub documents_relevant: bool,
}

impl GateOutcome {
    pub fn evaluate(chunk_scores: &[f64], document_scores: &[f64], threshold: f64) -> Self {
        Self {
            chunks_relevant: any_relevant(chunk_scores, threshold),
            documents_relevant: any_relevant(document_scores, threshold),
        }
    }

    /// Both gates failed: the answer path must use the canned fallback.
    pub fn no_relevant_content(&self) -> bool {
        !self.chunks_relevant && !self.documents_relevant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scores_not_relevant() {
        assert!(!any_relevant(&[], 1.5));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(!any_relevant(&[1.5], 1.5));
        assert!(any_relevant(&[1.4999], 1.5));
    }

    #[test]
    fn test_single_hit_suffices() {
        assert!(any_relevant(&[1.9, 1.8, 0.3], 1.5));
    }

    #[test]
    fn test_monotone_in_threshold() {
        let scores = [0.7, 1.2, 1.9];
        let mut prev = false;
        for t in [0.0, 0.5, 0.8, 1.3, 2.0] {
            let now = any_relevant(&scores, t);
            // Raising the threshold can only turn the gate on, never off
            assert!(now || !prev);
            prev = now;
        }
    }

    #[test]
    fn test_outcome_combines_gates() {
        let out = GateOutcome::evaluate(&[1.9], &[0.4], 1.5);
        assert!(!out.chunks_relevant);
        assert!(out.documents_relevant);
        assert!(!out.no_relevant_content());

        let out = GateOutcome::evaluate(&[1.9], &[1.7], 1.5);
        assert!(out.no_relevant_content());
    }
}
