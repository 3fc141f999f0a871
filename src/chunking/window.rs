//! Fixed-size word window chunking.
//!
//! Splits a cleaned transcript into windows of `chunk_size` words, each
//! starting `chunk_size - overlap` words after the previous one.

use super::{normalize_whitespace, ChunkRecord, ChunkingConfig};
use crate::error::Result;

/// Word-window chunker.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordWindowChunker {
    config: ChunkingConfig,
}

impl WordWindowChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Build a chunker from raw sizes, rejecting a non-advancing stride.
    pub fn with_sizes(chunk_size: usize, overlap: usize) -> Result<Self> {
        Ok(Self::new(ChunkingConfig::new(chunk_size, overlap)?))
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Split text into overlapping chunk records.
    ///
    /// The text is whitespace-normalised first; word offsets refer to the
    /// normalised text. Records carry no provenance yet.
    pub fn chunk(&self, text: &str) -> Vec<ChunkRecord> {
        let cleaned = normalize_whitespace(text);
        let words: Vec<&str> = cleaned.split(' ').filter(|w| !w.is_empty()).collect();

        let mut chunks = Vec::new();
        if words.is_empty() {
            return chunks;
        }

        let stride = self.config.stride();
        let mut start = 0;

        loop {
            let end = (start + self.config.chunk_size()).min(words.len());
            chunks.push(ChunkRecord::new(
                chunks.len(),
                words[start..end].join(" "),
                start,
                end,
            ));

            // A window that reached the end already covers every remaining word.
            if end == words.len() {
                break;
            }
            start += stride;
        }

        chunks
    }

    /// Number of chunks a text of `word_count` words produces.
    pub fn chunk_count(&self, word_count: usize) -> usize {
        if word_count == 0 {
            return 0;
        }
        if word_count <= self.config.chunk_size() {
            return 1;
        }
        let stride = self.config.stride();
        1 + (word_count - self.config.chunk_size()).div_ceil(stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[ChunkRecord]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_twelve_words_size_five_overlap_two() {
        let chunker = WordWindowChunker::with_sizes(5, 2).unwrap();
        let chunks = chunker.chunk("a b c d e f g h i j k l");

        assert_eq!(
            texts(&chunks),
            vec!["a b c d e", "d e f g h", "g h i j k", "j k l"]
        );
        let ranges: Vec<(usize, usize)> =
            chunks.iter().map(|c| (c.word_start, c.word_end)).collect();
        assert_eq!(ranges, vec![(0, 5), (3, 8), (6, 11), (9, 12)]);
        let ids: Vec<usize> = chunks.iter().map(|c| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = WordWindowChunker::with_sizes(5, 2).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk(" \n\t ").is_empty());
    }

    #[test]
    fn test_short_text_yields_single_chunk() {
        let chunker = WordWindowChunker::with_sizes(5, 2).unwrap();
        let chunks = chunker.chunk("one two  three\nfour");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "one two three four");
        assert_eq!((chunks[0].word_start, chunks[0].word_end), (0, 4));
    }

    #[test]
    fn test_exact_fit_does_not_emit_tail() {
        let chunker = WordWindowChunker::with_sizes(5, 2).unwrap();
        let chunks = chunker.chunk("a b c d e");
        assert_eq!(texts(&chunks), vec!["a b c d e"]);
    }

    #[test]
    fn test_zero_overlap() {
        let chunker = WordWindowChunker::with_sizes(2, 0).unwrap();
        let chunks = chunker.chunk("a b c d e");
        assert_eq!(texts(&chunks), vec!["a b", "c d", "e"]);
    }

    #[test]
    fn test_equal_overlap_and_size_is_rejected() {
        assert!(WordWindowChunker::with_sizes(2, 2).is_err());
        assert!(WordWindowChunker::with_sizes(2, 3).is_err());

        let chunker = WordWindowChunker::new(ChunkingConfig::new(2, 1).unwrap());
        assert_eq!(texts(&chunker.chunk("a b c d e")), vec!["a b", "b c", "c d", "d e"]);
    }

    #[test]
    fn test_counts_and_overlap_hold_across_sizes() {
        let words: Vec<String> = (0..40).map(|i| format!("w{}", i)).collect();

        for size in 1..8 {
            for overlap in 0..size {
                let chunker = WordWindowChunker::with_sizes(size, overlap).unwrap();
                for word_count in 0..words.len() {
                    let text = words[..word_count].join(" ");
                    let chunks = chunker.chunk(&text);

                    assert_eq!(chunks.len(), chunker.chunk_count(word_count));
                    if word_count > overlap {
                        let stride = size - overlap;
                        assert_eq!(chunks.len(), (word_count - overlap).div_ceil(stride));
                    }

                    for pair in chunks.windows(2) {
                        assert_eq!(pair[0].word_end - pair[1].word_start, overlap);
                    }
                    if let Some(last) = chunks.last() {
                        assert_eq!(last.word_end, word_count);
                    }
                }
            }
        }
    }
}
