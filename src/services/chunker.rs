//! Sliding-window text chunker.
//!
//! Pure and deterministic: a fixed window walked over the text, each
//! subsequent window starting `overlap` characters before the previous
//! window's end. The final (possibly short) window is included exactly once.

/// Split `text` into overlapping windows of `window` chars.
///
/// `overlap` must be smaller than `window`; callers get that from
/// `RetrievalConfig`, which validates it at startup.
pub fn chunk_text(text: &str, window: usize, overlap: usize) -> Vec<String> {
    debug_assert!(overlap < window, "overlap must be smaller than the window");

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + window).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(overlap);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 2000, 200).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("abc", 2000, 200), vec!["abc".to_string()]);
    }

    #[test]
    fn test_exact_window_single_chunk() {
        let text = "x".repeat(2000);
        let chunks = chunk_text(&text, 2000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(100);
        let a = chunk_text(&text, 300, 50);
        let b = chunk_text(&text, 300, 50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_overlap_invariant() {
        let text: String = ('a'..='z').cycle().take(1000).collect();
        let window = 300;
        let overlap = 50;
        let chunks = chunk_text(&text, window, overlap);
        assert!(chunks.len() > 1);

        // Every chunk except possibly the last fills the window, and each
        // successor starts exactly `overlap` chars before its predecessor's end
        let mut start = 0usize;
        for (i, chunk) in chunks.iter().enumerate() {
            let len = chunk.chars().count();
            if i + 1 < chunks.len() {
                assert_eq!(len, window);
            }
            let end = start + len;
            if i + 1 < chunks.len() {
                let next_start = end - overlap;
                assert!(next_start > start);
                assert!(next_start < end);
                start = next_start;
            }
        }
    }

    #[test]
    fn test_reconstruction_from_non_overlapping_regions() {
        let text: String = ('a'..='z').cycle().take(777).collect();
        let window = 200;
        let overlap = 40;
        let chunks = chunk_text(&text, window, overlap);

        // First chunk whole, every later chunk minus its leading overlap
        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.extend(chunk.chars().skip(overlap));
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_final_short_chunk_once() {
        let text = "x".repeat(450);
        let chunks = chunk_text(&text, 200, 50);
        // Windows: [0,200), [150,350), [300,450) — final one is short
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 150);
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "é".repeat(500);
        let chunks = chunk_text(&text, 200, 50);
        assert!(chunks.iter().all(|c| c.chars().all(|ch| ch == 'é')));
    }
}
