//! End-to-end question-answering pipeline.
//!
//! One run per incoming question:
//!   1. Check the credential (before any network call)
//!   2. Build the search term
//!   3. esearch → relevance-ranked PMIDs
//!   4. Fetch content: one batched abstract call, or bounded-concurrency
//!      full-text fan-out with per-article isolation
//!   5. Parse into Documents (per-article failures excluded, never fatal)
//!   6. Chunk → embed → request-scoped vector index
//!   7. Retrieve top-k passages for the question
//!   8. Synthesize a grounded answer and collect the passages it used
//!   9. Deduplicate citations and emit BibTeX
//!
//! Everything runs inside the caller's future; aborting the request drops
//! the run and cancels in-flight fetches. Nothing is retained afterwards.

use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use citeseek_common::config::RetrievalConfig;
use citeseek_common::{PipelineError, Result};

use crate::chunker::{split_documents, ChunkerConfig};
use crate::citations::build_bibliography;
use crate::index::VectorIndex;
use crate::llm::LlmBackend;
use crate::models::{ConversationTurn, Document, SearchFilters, SearchMode};
use crate::query::build_search_term;
use crate::retriever::retrieve;
use crate::sources::LiteratureSource;
use crate::synthesizer::synthesize;

/// Inputs for one question/answer cycle.
#[derive(Debug, Clone)]
pub struct AnswerJob {
    pub question: String,
    /// Prior turns, oldest first. Read-only context for this run.
    pub history: Vec<ConversationTurn>,
    pub filters: SearchFilters,
    pub mode: SearchMode,
    /// LLM service credential, supplied per request.
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    /// Unique cited PMIDs, first-occurrence order.
    pub citations: Vec<String>,
    pub bibtex: String,
    /// The effective search term, echoed for the client.
    pub pubmed_query: String,
}

#[instrument(skip_all, fields(mode = job.mode.as_str()))]
pub async fn answer_question(
    job: &AnswerJob,
    source: &dyn LiteratureSource,
    backend: &dyn LlmBackend,
    cfg: &RetrievalConfig,
) -> Result<AnswerOutcome> {
    // Surface a missing credential before any upstream call is spent.
    if job.api_key.trim().is_empty() {
        return Err(PipelineError::MissingCredential);
    }

    // Full-text retrieval only works for open-access articles, so the mode
    // forces the filter regardless of what the request asked for.
    let mut filters = job.filters.clone();
    if job.mode == SearchMode::FullText {
        filters.open_access_only = true;
    }

    let term = build_search_term(&job.question, &filters);
    info!(term = %term, "searching PubMed");

    let pmids = source.search(&term, cfg.max_articles).await?;
    if pmids.is_empty() {
        debug!("search returned no articles");
    }

    let documents = match job.mode {
        SearchMode::Abstracts => fetch_abstract_documents(source, &pmids, &filters).await?,
        SearchMode::FullText => {
            fetch_full_text_documents(source, &pmids, &filters, cfg.fetch_concurrency).await
        }
    };
    info!(articles = pmids.len(), documents = documents.len(), "content fetched");

    let chunker_cfg = ChunkerConfig {
        chunk_size: cfg.chunk_size,
        chunk_overlap: cfg.chunk_overlap,
    };
    let passages = split_documents(&documents, &chunker_cfg);

    let mut index = VectorIndex::new();
    index.add(backend, passages).await?;

    let hits = retrieve(backend, &index, &job.question, cfg.top_k).await?;
    let synthesis = synthesize(backend, &job.question, &hits, &job.history).await?;
    let bibliography = build_bibliography(&synthesis.used);

    Ok(AnswerOutcome {
        answer: synthesis.answer,
        citations: bibliography.pmids,
        bibtex: bibliography.bibtex,
        pubmed_query: term,
    })
}

/// Abstract mode: one batched round trip, so a fetch failure here fails the
/// whole request.
async fn fetch_abstract_documents(
    source: &dyn LiteratureSource,
    pmids: &[String],
    filters: &SearchFilters,
) -> Result<Vec<Document>> {
    if pmids.is_empty() {
        return Ok(Vec::new());
    }
    let xml = source.fetch_abstracts(pmids).await?;
    Ok(crate::parser::parse_abstract_xml(&xml, filters))
}

/// Full-text mode: independent per-article fetches fanned out with a bounded
/// concurrency limit. One article's failure excludes that article only; each
/// article's Result is inspected on its own before anything is merged.
async fn fetch_full_text_documents(
    source: &dyn LiteratureSource,
    pmids: &[String],
    filters: &SearchFilters,
    concurrency: usize,
) -> Vec<Document> {
    let mut fetches = Vec::with_capacity(pmids.len());
    for pmid in pmids {
        let pmid = pmid.clone();
        fetches.push(async move {
            let result = source.fetch_full_text(&pmid).await;
            (pmid, result)
        });
    }

    // `buffered` keeps relevance-rank order in the output.
    let results: Vec<_> = futures::stream::iter(fetches)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut documents = Vec::new();
    for (pmid, result) in results {
        match result {
            Ok(Some(collection)) => {
                let docs = crate::parser::parse_full_text(&collection, &pmid, filters);
                if docs.is_empty() {
                    debug!(pmid, "article excluded: no usable full-text content");
                } else {
                    documents.extend(docs);
                }
            }
            Ok(None) => debug!(pmid, "article excluded: no open-access rendering"),
            Err(e) => warn!(pmid, error = %e, "article excluded: full-text fetch failed"),
        }
    }
    documents
}
