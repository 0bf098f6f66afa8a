use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Unsupported value: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
