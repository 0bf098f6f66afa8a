/// The encode/decode protocol: value model, tagged payloads, type-tag
/// registry, store read/write orchestration.
pub mod codec;
/// Settings loading.
pub mod config;
/// Common error types: encoding/decoding, storage, the umbrella error.
pub mod error;
/// Path-addressed convenience layer (dotted paths, read cache, staged
/// writes).
pub mod root;
/// Abstract store contract and the in-memory backend.
pub mod store;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Core protocol: values, encode/decode, the registry and wire constants.
pub use codec::{
    build_payload, decode_entry, decode_literal, encode, encode_literal, fetch_many, fetch_value,
    known_type_names, split_payload, store_value, store_value_with_ttl, Category, DecodeMode,
    EncodedWrite, LoadOutcome, RawEntry, Scalar, ScalarKind, TaggedPayload, Value,
    DATETIME_FORMAT, DATE_FORMAT, ITEM_DIVIDER, TAG_MARKER,
};
/// Handle configuration.
pub use config::Settings;
/// Operation errors and result types.
pub use error::{DecodeError, DotkvError, DotkvResult, EncodeError, StoreError, StoreResult};
/// Path layer.
pub use root::{DotPath, Root};
/// Store contract and backends.
pub use store::{InMemoryStore, KeyType, Storage};
