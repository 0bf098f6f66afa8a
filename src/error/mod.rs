pub mod decode;
pub mod encode;
pub mod store;

pub use decode::DecodeError;
pub use encode::EncodeError;
pub use store::{StoreError, StoreResult};

use thiserror::Error;

/// Umbrella error for operations that cross the codec/store boundary
/// (saving and loading through a `Root` or the free functions).
#[derive(Debug, Error)]
pub enum DotkvError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid path: {0}")]
    Path(String),
}

pub type DotkvResult<T> = Result<T, DotkvError>;
