//! Request-scoped in-memory vector index.
//!
//! Built fresh for each question and dropped with the request, which bounds
//! memory and sidesteps staleness at the cost of re-embedding per question.

use tracing::{debug, instrument};

use citeseek_common::{PipelineError, Result};

use crate::llm::LlmBackend;
use crate::models::Passage;

/// One stored passage with its embedding. Immutable once added.
struct IndexEntry {
    embedding: Vec<f32>,
    passage: Passage,
}

#[derive(Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

/// A query hit: similarity score plus the matched passage.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub score: f32,
    pub passage: Passage,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embed and store a batch of passages. Insertion order is preserved and
    /// doubles as the tie-break order at query time, so callers add passages
    /// in relevance-rank order.
    #[instrument(skip(self, backend, passages), fields(n = passages.len()))]
    pub async fn add(&mut self, backend: &dyn LlmBackend, passages: Vec<Passage>) -> Result<()> {
        if passages.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let embeddings = backend.embed(texts).await?;
        if embeddings.len() != passages.len() {
            return Err(PipelineError::MalformedResponse(format!(
                "embedding service returned {} vectors for {} passages",
                embeddings.len(),
                passages.len()
            )));
        }
        for (embedding, passage) in embeddings.into_iter().zip(passages) {
            self.entries.push(IndexEntry { embedding, passage });
        }
        debug!(total = self.entries.len(), "passages indexed");
        Ok(())
    }

    /// Top-k passages by cosine similarity. Ties keep insertion order, which
    /// preserves the original relevance rank.
    pub fn query(&self, embedded_question: &[f32], k: usize) -> Vec<ScoredPassage> {
        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (cosine_similarity(embedded_question, &e.embedding), i))
            .collect();
        // Stable sort: equal scores fall back to insertion order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(score, i)| ScoredPassage { score, passage: self.entries[i].passage.clone() })
            .collect()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocMetadata;
    use async_trait::async_trait;

    /// Embeds each passage as a fixed unit vector supplied up front.
    struct FixedEmbedder {
        vectors: std::sync::Mutex<Vec<Vec<f32>>>,
    }

    #[async_trait]
    impl LlmBackend for FixedEmbedder {
        async fn complete(&self, _messages: Vec<crate::llm::Message>) -> citeseek_common::Result<String> {
            unreachable!("index tests never complete");
        }
        async fn embed(&self, texts: Vec<String>) -> citeseek_common::Result<Vec<Vec<f32>>> {
            let mut vectors = self.vectors.lock().unwrap();
            let n = texts.len().min(vectors.len());
            Ok(vectors.drain(..n).collect())
        }
    }

    fn passage(pmid: &str, idx: usize) -> Passage {
        Passage {
            content: format!("passage {idx} of {pmid}"),
            metadata: DocMetadata::abstract_only(pmid, format!("(A 2020 - {pmid})")),
            chunk_index: idx,
        }
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity() {
        let backend = FixedEmbedder {
            vectors: std::sync::Mutex::new(vec![
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.7, 0.7],
            ]),
        };
        let mut index = VectorIndex::new();
        index
            .add(&backend, vec![passage("1", 0), passage("2", 0), passage("3", 0)])
            .await
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].passage.metadata.pmid, "1");
        assert_eq!(hits[1].passage.metadata.pmid, "3");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_ties_preserve_insertion_order() {
        let backend = FixedEmbedder {
            vectors: std::sync::Mutex::new(vec![vec![1.0, 0.0], vec![1.0, 0.0]]),
        };
        let mut index = VectorIndex::new();
        index
            .add(&backend, vec![passage("first", 0), passage("second", 0)])
            .await
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 2);
        assert_eq!(hits[0].passage.metadata.pmid, "first");
        assert_eq!(hits[1].passage.metadata.pmid, "second");
    }

    #[tokio::test]
    async fn test_mismatched_embedding_count_is_rejected() {
        let backend = FixedEmbedder {
            vectors: std::sync::Mutex::new(vec![vec![1.0, 0.0]]),
        };
        let mut index = VectorIndex::new();
        let err = index
            .add(&backend, vec![passage("1", 0), passage("2", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse(_)));
    }
}
