//! Token-window document chunker.
//!
//! Splits each Document into overlapping windows of whitespace tokens,
//! carrying the parent metadata onto every Passage plus a chunk index.
//! Deterministic: identical input and parameters always produce identical
//! output, so reindexing the same corpus is idempotent.

use crate::models::{Document, Passage};

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Tokens per chunk.
    pub chunk_size: usize,
    /// Token overlap between consecutive chunks; must be < chunk_size.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { chunk_size: 200, chunk_overlap: 30 }
    }
}

/// Chunk a batch of documents in order. Chunk indices are per document,
/// starting at zero.
pub fn split_documents(docs: &[Document], config: &ChunkerConfig) -> Vec<Passage> {
    docs.iter().flat_map(|doc| split_document(doc, config)).collect()
}

fn split_document(doc: &Document, config: &ChunkerConfig) -> Vec<Passage> {
    let tokens: Vec<&str> = doc.content.split_whitespace().collect();
    let mut passages = Vec::new();

    // Content within one window: a single passage covering the whole document.
    if tokens.len() <= config.chunk_size {
        passages.push(Passage {
            content: doc.content.clone(),
            metadata: doc.metadata.clone(),
            chunk_index: 0,
        });
        return passages;
    }

    let step = config.chunk_size.saturating_sub(config.chunk_overlap).max(1);
    let mut start = 0;
    let mut chunk_index = 0;
    while start < tokens.len() {
        let end = (start + config.chunk_size).min(tokens.len());
        passages.push(Passage {
            content: tokens[start..end].join(" "),
            metadata: doc.metadata.clone(),
            chunk_index,
        });
        chunk_index += 1;
        if end == tokens.len() {
            break;
        }
        start += step;
    }

    passages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocMetadata;

    fn doc(content: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: DocMetadata::abstract_only("123", "(Smith 2020 - 123)"),
        }
    }

    #[test]
    fn test_short_document_is_single_passage() {
        let d = doc("a short abstract");
        let passages = split_documents(std::slice::from_ref(&d), &ChunkerConfig::default());
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].content, d.content);
        assert_eq!(passages[0].chunk_index, 0);
    }

    #[test]
    fn test_long_document_overlaps() {
        let words: Vec<String> = (0..25).map(|i| format!("w{i}")).collect();
        let d = doc(&words.join(" "));
        let cfg = ChunkerConfig { chunk_size: 10, chunk_overlap: 3 };
        let passages = split_documents(std::slice::from_ref(&d), &cfg);

        assert!(passages.len() > 1);
        // Consecutive chunks share the overlap tail/head.
        let first: Vec<&str> = passages[0].content.split_whitespace().collect();
        let second: Vec<&str> = passages[1].content.split_whitespace().collect();
        assert_eq!(&first[first.len() - 3..], &second[..3]);
        // Metadata is inherited, chunk indices increase.
        for (i, p) in passages.iter().enumerate() {
            assert_eq!(p.chunk_index, i);
            assert_eq!(p.metadata.pmid, "123");
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let words: Vec<String> = (0..500).map(|i| format!("tok{i}")).collect();
        let d = doc(&words.join(" "));
        let cfg = ChunkerConfig { chunk_size: 64, chunk_overlap: 16 };
        let a = split_documents(std::slice::from_ref(&d), &cfg);
        let b = split_documents(std::slice::from_ref(&d), &cfg);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.content, y.content);
            assert_eq!(x.chunk_index, y.chunk_index);
        }
    }

    #[test]
    fn test_all_tokens_covered() {
        let words: Vec<String> = (0..101).map(|i| format!("w{i}")).collect();
        let d = doc(&words.join(" "));
        let cfg = ChunkerConfig { chunk_size: 40, chunk_overlap: 10 };
        let passages = split_documents(std::slice::from_ref(&d), &cfg);
        let last: Vec<&str> = passages.last().unwrap().content.split_whitespace().collect();
        assert_eq!(*last.last().unwrap(), "w100");
    }
}
