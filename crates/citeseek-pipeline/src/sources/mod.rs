//! Literature source clients.

pub mod pubmed;

use async_trait::async_trait;
use citeseek_common::Result;

use crate::parser::BiocCollection;

/// Interface to the literature corpus, split along the pipeline's fetch
/// stages so each can be exercised (and mocked) independently.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Relevance-ranked article identifiers for a search term.
    async fn search(&self, term: &str, max_results: usize) -> Result<Vec<String>>;

    /// One batched abstract fetch for all identifiers; returns the raw XML
    /// document tree.
    async fn fetch_abstracts(&self, pmids: &[String]) -> Result<String>;

    /// Open-access full text for one article. `Ok(None)` means the article
    /// has no usable open-access rendering and must be dropped, not failed.
    async fn fetch_full_text(&self, pmid: &str) -> Result<Option<BiocCollection>>;
}
