use std::io;

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    // ==== System / External ====
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("UTF-8 decoding failed: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    // ==== Operation errors ====
    #[error("Wrong type for operation: {0}")]
    TypeConflict(String),

    #[error("Key not found")]
    KeyNotFound,

    // ==== General ====
    #[error("Internal error: {0}")]
    Internal(String),
}
