//! Splits document text into overlapping, sentence-aligned chunks.

use serde::{Deserialize, Serialize};

/// A retrieval-sized segment of exactly one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// File or upload name of the owning document
    pub source: String,
    /// Position of the owning document in the corpus
    pub document: usize,
    /// Chunk index within the document
    pub chunk_index: usize,
    /// Character offset in the original document
    pub start_offset: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkingOptions {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 200,
        }
    }
}

pub fn split_into_chunks(
    text: &str,
    source: &str,
    document: usize,
    options: ChunkingOptions,
) -> Vec<Chunk> {
    let chunk_size = options.chunk_size.max(1);
    let overlap = options.chunk_overlap.min(chunk_size.saturating_sub(1));

    let chars: Vec<char> = text.chars().collect();
    let total_chars = chars.len();
    let mut chunks = Vec::new();

    let mut start = 0;
    while start < total_chars {
        let window_end = (start + chunk_size).min(total_chars);
        let end = if window_end < total_chars {
            sentence_boundary(&chars[start..window_end])
                .map(|len| start + len)
                .unwrap_or(window_end)
        } else {
            window_end
        };

        let chunk_text: String = chars[start..end].iter().collect();
        let trimmed = chunk_text.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk {
                text: trimmed.to_string(),
                source: source.to_string(),
                document,
                chunk_index: chunks.len(),
                start_offset: start,
            });
        }

        if end >= total_chars {
            break;
        }
        // Always advance, even when the overlap would swallow the whole chunk
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Length of the longest prefix ending in a sentence terminator, if that
/// prefix covers at least half of the window.
fn sentence_boundary(window: &[char]) -> Option<usize> {
    let min_len = window.len() / 2;
    window
        .iter()
        .enumerate()
        .rev()
        .find(|(i, c)| {
            *i + 1 >= min_len
                && (matches!(c, '\n')
                    || (matches!(c, '.' | '!' | '?')
                        && window.get(i + 1).map_or(true, |n| n.is_whitespace())))
        })
        .map(|(i, _)| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split_into_chunks("Albert was born in 1879.", "albert.txt", 0, ChunkingOptions::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Albert was born in 1879.");
        assert_eq!(chunks[0].source, "albert.txt");
        assert_eq!(chunks[0].start_offset, 0);
    }

    #[test]
    fn test_chunks_prefer_sentence_boundaries() {
        let text = "One two three. Four five six. Seven eight nine.";
        let options = ChunkingOptions {
            chunk_size: 20,
            chunk_overlap: 0,
        };
        let chunks = split_into_chunks(text, "s", 3, options);

        assert_eq!(chunks[0].text, "One two three.");
        assert!(chunks.iter().all(|c| c.document == 3));
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 20));
        let rebuilt: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rebuilt.join(" "), text);
    }

    #[test]
    fn test_overlap_repeats_tail_of_previous_chunk() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let options = ChunkingOptions {
            chunk_size: 10,
            chunk_overlap: 3,
        };
        let chunks = split_into_chunks(text, "s", 0, options);

        assert_eq!(chunks[0].text, "abcdefghij");
        assert_eq!(chunks[1].start_offset, 7);
        assert!(chunks[1].text.starts_with("hij"));
        assert!(chunks.last().unwrap().text.ends_with('z'));
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_into_chunks("", "s", 0, ChunkingOptions::default()).is_empty());
    }

    #[test]
    fn test_overlap_larger_than_chunk_still_terminates() {
        let options = ChunkingOptions {
            chunk_size: 2,
            chunk_overlap: 10,
        };
        let chunks = split_into_chunks("abcdef", "s", 0, options);
        assert!(!chunks.is_empty());
        assert!(chunks.last().unwrap().text.ends_with('f'));
    }
}
