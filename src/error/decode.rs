use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unknown type tag: {0}")]
    UnknownTypeTag(String),

    #[error("Malformed {kind} payload: {text:?}")]
    Malformed { kind: &'static str, text: String },

    #[error("UTF-8 decoding failed: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("JSON payload error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    /// Shorthand for the common "value text does not parse as the declared
    /// type" case.
    pub fn malformed(
        kind: &'static str,
        text: impl Into<String>,
    ) -> Self {
        DecodeError::Malformed {
            kind,
            text: text.into(),
        }
    }
}
