use thiserror::Error;

pub type Result<T> = std::result::Result<T, DelayError>;

#[derive(Debug, Error)]
pub enum DelayError {
    /// Bad request data: undecodable body, missing or wrongly typed attribute, missing target.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("The model is not loaded.")]
    NotLoaded,

    /// Artifact parsed but its contents are not a usable classifier.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("inference failed: feature schema mismatch (expected {expected} columns, got {got})")]
    SchemaMismatch { expected: usize, got: usize },

    #[error("inference failed: {0}")]
    Inference(String),
}

impl DelayError {
    pub(crate) fn load(path: impl Into<String>, reason: impl ToString) -> Self {
        DelayError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for DelayError {
    fn from(e: serde_json::Error) -> Self {
        DelayError::Validation(e.to_string())
    }
}
