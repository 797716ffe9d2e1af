//! Recursive character chunking with overlap.
//!
//! Text is split on the coarsest separator that occurs in it (`"\n\n"`,
//! then `"\n"`, then `" "`, then per character). Adjacent pieces are merged
//! into chunks of at most `chunk_size` characters, and each new chunk starts
//! with up to `chunk_overlap` characters carried over from the previous one.

use std::collections::VecDeque;

use tracing::warn;

/// Target chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Characters shared between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub struct RecursiveChunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl RecursiveChunker {
    /// Overlap is clamped below the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Split `text` into trimmed, non-empty chunks in document order.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let pos = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(pos).copied().unwrap_or("");
        let finer = separators.get(pos + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks.retain(|c| !c.is_empty());
        chunks
    }

    /// Greedily pack `pieces` into chunks, carrying a tail of each chunk
    /// into the next one.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joining = if window.is_empty() { 0 } else { sep_len };

            if total + len + joining > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of {} characters, longer than the limit of {}",
                        total, self.chunk_size
                    );
                }
                if !window.is_empty() {
                    push_joined(&mut chunks, &window, separator);
                    while total > self.chunk_overlap
                        || (total > 0
                            && total + len + if window.is_empty() { 0 } else { sep_len }
                                > self.chunk_size)
                    {
                        let Some(front) = window.front() else { break };
                        let dropped = char_len(front) + if window.len() > 1 { sep_len } else { 0 };
                        total = total.saturating_sub(dropped);
                        window.pop_front();
                    }
                }
            }

            window.push_back(piece);
            total += len + if window.len() > 1 { sep_len } else { 0 };
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{:03}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = RecursiveChunker::default().split("Take a slow breath in.");
        assert_eq!(chunks, vec!["Take a slow breath in."]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(RecursiveChunker::default().split("").is_empty());
        assert!(RecursiveChunker::default().split(" \n\n \n").is_empty());
    }

    #[test]
    fn test_chunks_respect_size() {
        let chunker = RecursiveChunker::new(50, 20);
        let chunks = chunker.split(&words(200));
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(char_len(c) <= 50, "chunk too long: {}", c);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let chunker = RecursiveChunker::new(50, 20);
        let chunks = chunker.split(&words(60));
        for pair in chunks.windows(2) {
            let first_word = pair[1].split(' ').next().unwrap();
            assert!(
                pair[0].contains(first_word),
                "{:?} does not continue {:?}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_paragraphs_preferred_over_lines() {
        let chunker = RecursiveChunker::new(40, 0);
        let text = "Grounding uses the five senses.\n\nBox breathing counts to four.";
        let chunks = chunker.split(text);
        assert_eq!(
            chunks,
            vec!["Grounding uses the five senses.", "Box breathing counts to four."]
        );
    }

    #[test]
    fn test_long_word_split_by_characters() {
        let chunker = RecursiveChunker::new(10, 2);
        let chunks = chunker.split(&"a".repeat(25));
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 10));
    }

    #[test]
    fn test_multibyte_text() {
        let chunker = RecursiveChunker::new(5, 1);
        let chunks = chunker.split("ঘুমঘুমঘুমঘুম");
        assert!(chunks.iter().all(|c| char_len(c) <= 5));
        assert!(!chunks.is_empty());
    }
}
