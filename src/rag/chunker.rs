//! Boundary-aware text chunking with overlap.
//!
//! Greedy fixed-window scan over the document. Each window is snapped back to
//! the last sentence boundary when one falls in the second half of the window,
//! so chunks tend to end on full sentences instead of mid-word. Consecutive
//! chunks share `overlap` characters of trailing context.
//!
//! All positions are Unicode scalar values, never bytes, so CJK and other
//! multi-byte text is split safely.

use serde::{Deserialize, Serialize};

/// Chunking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkParams {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters of trailing context repeated at the start of the next chunk
    pub overlap: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

/// A sentence boundary found inside a window.
///
/// `position` is the index of the boundary character relative to the window
/// start; `end` is the index one past the boundary (past both newlines for a
/// blank line).
struct Boundary {
    position: usize,
    end: usize,
}

/// Split text into overlapping chunks, snapping to sentence boundaries.
///
/// Whitespace is trimmed from each chunk and empty chunks are dropped, so the
/// output may be shorter than the number of windows scanned.
pub fn chunk_text(text: &str, params: &ChunkParams) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let size = params.chunk_size.max(1);

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let mut end = (start + size).min(total);

        // Snap to the last sentence boundary, but only when it lands in the
        // second half of the window. The final window keeps whatever is left.
        if end < total {
            if let Some(boundary) = last_boundary(&chars[start..end]) {
                if boundary.position > size / 2 {
                    end = start + boundary.end;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        // Step back by `overlap` for shared context; always advance by at
        // least one character so the scan terminates.
        start = end.saturating_sub(params.overlap).max(start + 1);
    }

    chunks
}

/// Find the last sentence boundary in a window of characters.
///
/// Recognized boundaries: `。`, `.`, and a blank line (two consecutive
/// newlines).
fn last_boundary(window: &[char]) -> Option<Boundary> {
    let mut best: Option<Boundary> = None;

    for (i, &c) in window.iter().enumerate() {
        let candidate = match c {
            '。' | '.' => Some(Boundary {
                position: i,
                end: i + 1,
            }),
            '\n' if window.get(i + 1) == Some(&'\n') => Some(Boundary {
                position: i,
                end: i + 2,
            }),
            _ => None,
        };

        if candidate.is_some() {
            best = candidate;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(chunk_size: usize, overlap: usize) -> ChunkParams {
        ChunkParams {
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", &ChunkParams::default()).is_empty());
    }

    #[test]
    fn test_whitespace_only_text() {
        assert!(chunk_text("   \n\n   ", &ChunkParams::default()).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Just a short note", &ChunkParams::default());
        assert_eq!(chunks, vec!["Just a short note".to_string()]);
    }

    #[test]
    fn test_fixed_windows_without_boundaries() {
        // No sentence boundaries anywhere: pure greedy windows with overlap.
        let text = "a".repeat(1200);
        let chunks = chunk_text(&text, &params(500, 50));

        // Windows: [0,500), [450,950), [900,1200)
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 500);
        assert_eq!(chunks[1].chars().count(), 500);
        assert_eq!(chunks[2].chars().count(), 300);
    }

    #[test]
    fn test_overlap_repeats_trailing_context() {
        let text: String = ('a'..='z').cycle().take(300).collect();
        let chunks = chunk_text(&text, &params(200, 20));

        assert_eq!(chunks.len(), 2);
        let tail: String = chunks[0].chars().skip(180).collect();
        let head: String = chunks[1].chars().take(20).collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn test_snaps_to_period_in_second_half() {
        // Period at position 300 of a 500-char window: snap.
        let mut text = "x".repeat(300);
        text.push('.');
        text.push_str(&"y".repeat(400));

        let chunks = chunk_text(&text, &params(500, 50));
        assert_eq!(chunks[0].chars().count(), 301);
        assert!(chunks[0].ends_with('.'));
    }

    #[test]
    fn test_ignores_period_in_first_half() {
        // Period at position 100: snapping would discard most of the window.
        let mut text = "x".repeat(100);
        text.push('.');
        text.push_str(&"y".repeat(600));

        let chunks = chunk_text(&text, &params(500, 50));
        assert_eq!(chunks[0].chars().count(), 500);
    }

    #[test]
    fn test_snaps_to_blank_line() {
        let mut text = "x".repeat(300);
        text.push_str("\n\n");
        text.push_str(&"y".repeat(400));

        let chunks = chunk_text(&text, &params(500, 50));
        // Window ends after the blank line; trim removes the newlines.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "x".repeat(300));
        // Second chunk starts with overlap context and carries the y-run.
        assert!(chunks[1].ends_with('y'));
    }

    #[test]
    fn test_cjk_sentence_boundary() {
        let mut text = "漢".repeat(280);
        text.push('。');
        text.push_str(&"字".repeat(300));

        let chunks = chunk_text(&text, &params(500, 50));
        assert!(chunks[0].ends_with('。'));
        assert_eq!(chunks[0].chars().count(), 281);
    }

    #[test]
    fn test_multibyte_never_panics() {
        // 4-byte scalars mixed with ASCII; byte-indexed slicing would panic.
        let text = "𝕊omeМіх𝕖d tехt 🦀".repeat(100);
        let chunks = chunk_text(&text, &params(64, 8));
        assert!(!chunks.is_empty());
        let rejoined: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(rejoined >= text.chars().count() - chunks.len() * 8);
    }

    #[test]
    fn test_terminates_when_overlap_exceeds_window() {
        // overlap > chunk_size would stall the scan without the +1 floor.
        let text = "abcdefghij".repeat(10);
        let chunks = chunk_text(&text, &params(10, 30));
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_chunks_are_verbatim_slices() {
        let text = "The quick brown fox. Jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs. "
            .repeat(20);
        let chunks = chunk_text(&text, &params(120, 24));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(text.contains(chunk.as_str()), "not a slice: {}", chunk);
            assert!(chunk.chars().count() <= 120);
        }
        // Scan starts at the head and reaches the tail of the document.
        assert!(chunks[0].starts_with("The quick"));
        assert!(chunks.last().unwrap().ends_with("jugs."));
        // With snapping, every chunk here ends on a sentence.
        assert!(chunks.iter().all(|c| c.ends_with('.')));
    }

    #[test]
    fn test_boundary_at_window_edge() {
        // Boundary exactly at the last character of the window.
        let mut text = "x".repeat(499);
        text.push('.');
        text.push_str(&"y".repeat(100));

        let chunks = chunk_text(&text, &params(500, 50));
        assert_eq!(chunks[0].chars().count(), 500);
        assert!(chunks[0].ends_with('.'));
    }

    #[test]
    fn test_last_window_never_snaps() {
        // Final window keeps trailing text even past a mid-window period.
        let text = format!("{}. tail", "x".repeat(300));
        let chunks = chunk_text(&text, &params(500, 50));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].ends_with("tail"));
    }
}
