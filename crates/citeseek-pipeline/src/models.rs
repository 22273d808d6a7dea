//! Data models for the question-answering pipeline.

use serde::{Deserialize, Serialize};

/// A normalized unit of article text with citation metadata.
///
/// Invariant: `content` and `metadata.pmid` are never empty. Articles without
/// usable text are skipped upstream, not emitted as empty documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMetadata {
    pub pmid: String,
    /// Short human-readable reference, e.g. "(Smith 2021 - 12345678)".
    pub citation: String,
    /// Byte offset of the passage within the source article (full text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Section the passage came from, e.g. "intro", "results" (full text only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
    /// Passage kind, e.g. "paragraph", "title" (full text only). Serialized
    /// as "type" to match the BioC infon key.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl DocMetadata {
    pub fn abstract_only(pmid: impl Into<String>, citation: impl Into<String>) -> Self {
        Self {
            pmid: pmid.into(),
            citation: citation.into(),
            offset: None,
            section_type: None,
            kind: None,
        }
    }
}

/// A chunked fragment of a Document; the unit that is embedded and indexed.
/// Created at indexing time, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub metadata: DocMetadata,
    pub chunk_index: usize,
}

/// Search constraints for one request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Inclusive completion-year range; applied as a post-filter at the
    /// fetch/parse stage because esearch has no year-range parameter.
    pub year_range: (u16, u16),
    pub open_access_only: bool,
    /// Non-empty custom query replaces the question-derived term entirely.
    pub custom_query: Option<String>,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            year_range: (1900, 2100),
            open_access_only: false,
            custom_query: None,
        }
    }
}

impl SearchFilters {
    pub fn year_in_range(&self, year: u16) -> bool {
        let (min, max) = self.year_range;
        year >= min && year <= max
    }
}

/// Which retrieval path to take for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// One batched efetch of article abstracts.
    Abstracts,
    /// One BioC full-text fetch per article (open access only).
    FullText,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Abstracts => "abstracts",
            SearchMode::FullText  => "fulltext",
        }
    }
}

/// One prior turn of the conversation. Read-only input for the current turn;
/// the pipeline never mutates history, only the client appends new turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String, // "user" | "assistant"
    pub content: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, rename = "pubMedQuery")]
    pub pubmed_query: String,
    #[serde(default)]
    pub bibtex: String,
}
