//! Configuration loading for citeseek.
//! Reads citeseek.toml from the current directory or the path in the
//! CITESEEK_CONFIG env var; every field has a serde default so an absent
//! file yields a fully usable configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String { "127.0.0.1:3001".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum PubMed search hits per question.
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    /// Tokens per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Token overlap between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Passages returned per similarity query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Concurrent full-text fetches in flight.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    /// Timeout for every external HTTP call, seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_articles()      -> usize { 20 }
fn default_chunk_size()        -> usize { 200 }
fn default_chunk_overlap()     -> usize { 30 }
fn default_top_k()             -> usize { 10 }
fn default_fetch_concurrency() -> usize { 4 }
fn default_timeout_secs()      -> u64 { 30 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_articles:      default_max_articles(),
            chunk_size:        default_chunk_size(),
            chunk_overlap:     default_chunk_overlap(),
            top_k:             default_top_k(),
            fetch_concurrency: default_fetch_concurrency(),
            timeout_secs:      default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
}

fn default_chat_model()      -> String { "gpt-4o-mini".to_string() }
fn default_embedding_model() -> String { "text-embedding-3-small".to_string() }
fn default_llm_base_url()    -> String { "https://api.openai.com".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model:           default_chat_model(),
            embedding_model: default_embedding_model(),
            base_url:        default_llm_base_url(),
        }
    }
}

impl Config {
    /// Load from CITESEEK_CONFIG, ./citeseek.toml, or defaults, in that order.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var("CITESEEK_CONFIG") {
            return Self::from_path(&path);
        }
        if Path::new("citeseek.toml").exists() {
            return Self::from_path("citeseek.toml");
        }
        Ok(Self::default())
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&raw)?)
    }
}
