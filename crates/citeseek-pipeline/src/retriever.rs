//! Query-time lookup: embed the question, query the index, return ranked
//! passages with provenance.

use tracing::{debug, instrument};

use citeseek_common::{PipelineError, Result};

use crate::index::{ScoredPassage, VectorIndex};
use crate::llm::LlmBackend;

#[instrument(skip(backend, index), fields(indexed = index.len()))]
pub async fn retrieve(
    backend: &dyn LlmBackend,
    index: &VectorIndex,
    question: &str,
    k: usize,
) -> Result<Vec<ScoredPassage>> {
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let mut embedded = backend.embed(vec![question.to_string()]).await?;
    let question_vec = embedded.pop().ok_or_else(|| {
        PipelineError::MalformedResponse("embedding service returned no vector for question".into())
    })?;

    let hits = index.query(&question_vec, k);
    debug!(n = hits.len(), "retrieved passages");
    Ok(hits)
}
