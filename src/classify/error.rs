use thiserror::Error;

/// Every way a single classification attempt can fail.
///
/// All variants are retryable: a differently-sampled completion may conform
/// on the next attempt, and transport problems are usually transient.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider response had no message content")]
    EmptyResponse,

    #[error("model output is not a JSON object: {0}")]
    Malformed(String),

    #[error("model output violates the response schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("model output could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("model output is inconsistent: {0}")]
    Inconsistent(String),
}

impl ClassifyError {
    /// Short stable tag for logs and the skip report.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::Transport(_) => "transport",
            ClassifyError::Status { .. } => "status",
            ClassifyError::EmptyResponse => "empty_response",
            ClassifyError::Malformed(_) => "malformed",
            ClassifyError::Schema(_) => "schema",
            ClassifyError::Decode(_) => "decode",
            ClassifyError::Inconsistent(_) => "inconsistent",
        }
    }
}
