//! citeseek-common — shared error taxonomy and configuration used across
//! the citeseek crates.

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{PipelineError, Result};
