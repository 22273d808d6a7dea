use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure taxonomy for one question/answer cycle.
///
/// `NoUsableContent` is recovered locally (the offending article is excluded
/// and the pipeline continues); the other variants abort the request and are
/// surfaced to the caller as `{ "message": … }`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("article {0} yielded no usable content")]
    NoUsableContent(String),

    #[error("missing API key")]
    MissingCredential,

    #[error("answer generation failed: {0}")]
    GenerationFailure(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::UpstreamUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::MalformedResponse(e.to_string())
    }
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::MissingCredential => StatusCode::BAD_REQUEST,
            PipelineError::UpstreamUnavailable(_)
            | PipelineError::MalformedResponse(_)
            | PipelineError::NoUsableContent(_)
            | PipelineError::GenerationFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = axum::Json(serde_json::json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_client_error() {
        assert_eq!(
            PipelineError::MissingCredential.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_errors_are_bad_gateway() {
        let e = PipelineError::UpstreamUnavailable("esearch HTTP 503".into());
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
    }
}
