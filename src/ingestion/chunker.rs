//! Sentence-aware text chunking

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Document, Node};

/// Rough token estimate used for sizing chunks
pub const CHARS_PER_TOKEN: usize = 4;

/// Splits text into overlapping chunks along sentence boundaries
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk length in bytes
    max_len: usize,
    /// Maximum overlap carried into the next chunk, in bytes
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker from token-denominated sizes
    pub fn new(chunk_size_tokens: usize, overlap_tokens: usize) -> Self {
        let max_len = (chunk_size_tokens * CHARS_PER_TOKEN).max(1);
        Self {
            max_len,
            overlap: (overlap_tokens * CHARS_PER_TOKEN).min(max_len.saturating_sub(1)),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Chunk a document into nodes that inherit its metadata
    pub fn chunk_document(&self, doc: &Document) -> Vec<Node> {
        self.split(&doc.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Node::from_document(doc, i, text))
            .collect()
    }

    /// Split text into trimmed, non-empty chunks of at most `max_len` bytes
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for piece in self.pieces(text) {
            if !current.trim().is_empty() && current.len() + piece.len() > self.max_len {
                chunks.push(current.trim().to_string());

                current = self.overlap_text(&current);
                if current.len() + piece.len() > self.max_len {
                    current.clear();
                }
            }
            current.push_str(piece);
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }

    /// Sentences, with over-long sentences broken at word (or char) boundaries
    fn pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();

        for sentence in text.split_sentence_bounds() {
            if sentence.len() <= self.max_len {
                pieces.push(sentence);
                continue;
            }

            let mut start = 0;
            let mut end = 0;
            for (offset, word) in sentence.split_word_bound_indices() {
                if word.len() > self.max_len {
                    if end > start {
                        pieces.push(&sentence[start..end]);
                    }
                    pieces.extend(self.hard_split(word));
                    start = offset + word.len();
                    end = start;
                    continue;
                }
                if offset + word.len() - start > self.max_len {
                    pieces.push(&sentence[start..end]);
                    start = offset;
                }
                end = offset + word.len();
            }
            if end > start {
                pieces.push(&sentence[start..end]);
            }
        }

        pieces
    }

    /// Split on char boundaries into slices of at most `max_len` bytes
    fn hard_split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut parts = Vec::new();
        let mut start = 0;
        while start < text.len() {
            let mut end = (start + self.max_len).min(text.len());
            while end > start && !text.is_char_boundary(end) {
                end -= 1;
            }
            if end == start {
                // max_len smaller than one char: take the whole char
                end = start + text[start..].chars().next().map(char::len_utf8).unwrap_or(1);
            }
            parts.push(&text[start..end]);
            start = end;
        }
        parts
    }

    /// Trailing text of a chunk to repeat at the start of the next one
    fn overlap_text(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while start < text.len() && !text.is_char_boundary(start) {
            start += 1;
        }
        let tail = &text[start..];
        let body = tail.trim_end();

        // Prefer starting at a sentence, then a word boundary
        if let Some(pos) = body.find(". ") {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = body.find(' ') {
            return tail[pos + 1..].to_string();
        }
        tail.to_string()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1024, 200)
    }
}
