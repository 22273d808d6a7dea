//! The pipeline entry point: POST /api/chat.

use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

use citeseek_common::PipelineError;
use citeseek_pipeline::llm::OpenAiBackend;
use citeseek_pipeline::sources::pubmed::PubMedClient;
use citeseek_pipeline::{answer_question, AnswerJob, ConversationTurn, SearchFilters, SearchMode};

use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ConversationTurn>,
    pub question: String,
    #[serde(default)]
    pub api_key: String,
    /// Optional NCBI E-utilities key for higher PubMed rate limits.
    #[serde(default)]
    pub ncbi_api_key: Option<String>,
    /// Inclusive [min, max] completion-year range.
    #[serde(default = "default_years")]
    pub years: (u16, u16),
    #[serde(default = "default_mode")]
    pub search_mode: SearchMode,
    /// Advanced mode: overrides the question-derived search term.
    #[serde(default)]
    pub pubmed_query: String,
}

fn default_years() -> (u16, u16) { (1900, 2100) }
fn default_mode() -> SearchMode { SearchMode::Abstracts }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    pub citations: Vec<String>,
    pub bibtex: String,
    pub pubmed_query: String,
}

#[instrument(skip(state, req), fields(mode = req.search_mode.as_str()))]
pub async fn chat(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, PipelineError> {
    let cfg = &state.config;
    let timeout = Duration::from_secs(cfg.retrieval.timeout_secs);

    let filters = SearchFilters {
        year_range: req.years,
        open_access_only: req.search_mode == SearchMode::FullText,
        custom_query: if req.pubmed_query.trim().is_empty() {
            None
        } else {
            Some(req.pubmed_query.clone())
        },
    };

    let job = AnswerJob {
        question: req.question,
        history: req.messages,
        filters,
        mode: req.search_mode,
        api_key: req.api_key.clone(),
    };

    // Request-scoped clients: both are dropped with this handler's future.
    let source = PubMedClient::new(req.ncbi_api_key.clone(), timeout)?;
    let backend = OpenAiBackend::new(
        &cfg.llm.base_url,
        &cfg.llm.model,
        &cfg.llm.embedding_model,
        &req.api_key,
        timeout,
    )?;

    let outcome = answer_question(&job, &source, &backend, &cfg.retrieval).await?;
    info!(citations = outcome.citations.len(), "answer produced");

    Ok(Json(ChatResponse {
        answer: outcome.answer,
        citations: outcome.citations,
        bibtex: outcome.bibtex,
        pubmed_query: outcome.pubmed_query,
    }))
}
