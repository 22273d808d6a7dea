//! Grounded answer synthesis.
//!
//! The generator is constrained to the retrieved passages and prior turns,
//! and must report which articles it actually used: it ends its reply with a
//! `SOURCES:` line listing PMIDs (or `none`). The trailer is stripped from
//! the returned answer and intersected with the supplied passages, so the
//! model cannot cite an article it was never shown. An empty grounding set
//! is a valid terminal state, not an error.

use tracing::{debug, instrument, warn};

use citeseek_common::Result;

use crate::index::ScoredPassage;
use crate::llm::{LlmBackend, Message};
use crate::models::{ConversationTurn, Passage};

const SOURCES_PREFIX: &str = "SOURCES:";

const SYSTEM_PROMPT: &str = "You are a biomedical research assistant. Answer the \
question using ONLY the numbered context passages below and the prior \
conversation. Do not use outside knowledge. Cite claims with the passage's \
citation string. After your answer, output one final line of the form \
'SOURCES: <comma-separated PMIDs of the passages you used>', or \
'SOURCES: none' if no passage supported the answer.";

pub struct SynthesisResult {
    pub answer: String,
    /// Passages the generator reported using, in retrieval order.
    pub used: Vec<Passage>,
}

#[instrument(skip(backend, passages, history), fields(n_passages = passages.len(), n_turns = history.len()))]
pub async fn synthesize(
    backend: &dyn LlmBackend,
    question: &str,
    passages: &[ScoredPassage],
    history: &[ConversationTurn],
) -> Result<SynthesisResult> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::new(
        "system",
        format!("{}\n\n{}", SYSTEM_PROMPT, context_block(passages)),
    ));

    // History stays oldest-first: the order encodes the turn sequence the
    // generator needs for coreference resolution.
    for turn in history {
        messages.push(Message::new(turn.role.clone(), turn.content.clone()));
    }
    messages.push(Message::new("user", question));

    let raw = backend.complete(messages).await?;
    let (answer, cited_pmids) = split_sources_trailer(&raw);

    let used: Vec<Passage> = passages
        .iter()
        .filter(|p| cited_pmids.iter().any(|pmid| pmid == &p.passage.metadata.pmid))
        .map(|p| p.passage.clone())
        .collect();

    if used.is_empty() {
        debug!("generator reported no grounding passages");
    }

    Ok(SynthesisResult { answer, used })
}

fn context_block(passages: &[ScoredPassage]) -> String {
    if passages.is_empty() {
        return "Context passages: none available.".to_string();
    }
    let mut block = String::from("Context passages:\n");
    for (i, p) in passages.iter().enumerate() {
        block.push_str(&format!(
            "[{}] PMID {} {}: {}\n",
            i + 1,
            p.passage.metadata.pmid,
            p.passage.metadata.citation,
            p.passage.content
        ));
    }
    block
}

/// Split the model output into (answer, cited pmids), tolerating a missing
/// or malformed trailer by returning an empty citation list.
fn split_sources_trailer(raw: &str) -> (String, Vec<String>) {
    let trimmed = raw.trim_end();
    let Some(idx) = trimmed.rfind(SOURCES_PREFIX) else {
        warn!("generator omitted the SOURCES trailer");
        return (trimmed.to_string(), Vec::new());
    };

    let answer = trimmed[..idx].trim_end().to_string();
    let trailer = trimmed[idx + SOURCES_PREFIX.len()..].trim();
    if trailer.eq_ignore_ascii_case("none") || trailer.is_empty() {
        return (answer, Vec::new());
    }

    let pmids = trailer
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .collect();
    (answer, pmids)
}
