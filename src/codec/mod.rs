//! The encode/decode protocol.
//!
//! - `value`: the closed native value model (`Value`, `Scalar`).
//! - `tags`: wire constants and tagged-payload assembly/splitting.
//! - `registry`: the fixed type-name ↔ formatter/reconstructor bijection.
//! - `encoder`: value classification, forced-literal sub-mode, store writes.
//! - `decoder`: tagged-or-literal reconstruction and batched reads.

pub mod decoder;
pub mod encoder;
pub mod registry;
pub mod tags;
pub mod value;

pub use decoder::{
    decode_entry, decode_literal, fetch_many, fetch_value, DecodeMode, LoadOutcome, RawEntry,
};
pub use encoder::{encode, encode_literal, store_value, store_value_with_ttl, EncodedWrite};
pub use registry::{known_type_names, ScalarKind, DATETIME_FORMAT, DATE_FORMAT};
pub use tags::{build_payload, split_payload, Category, TaggedPayload, ITEM_DIVIDER, TAG_MARKER};
pub use value::{Scalar, Value};
