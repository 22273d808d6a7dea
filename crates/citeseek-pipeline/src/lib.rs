//! citeseek-pipeline — retrieval-augmented question answering over PubMed.
//!
//! Build phase: search → fetch → parse → chunk → index.
//! Answer phase: retrieve → synthesize → cite.
//! Both phases run inside a single request; nothing outlives it.

pub mod chunker;
pub mod citations;
pub mod index;
pub mod llm;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod retriever;
pub mod sources;
pub mod synthesizer;

pub use models::{ConversationTurn, Document, Passage, SearchFilters, SearchMode};
pub use pipeline::{answer_question, AnswerJob, AnswerOutcome};
