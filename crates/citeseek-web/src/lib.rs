//! citeseek-web — JSON API in front of the answer pipeline.

pub mod handlers;
pub mod router;
pub mod state;
