//! Write side of the protocol: classify a native value, produce the store
//! primitive to invoke and the exact payload bytes, and drive the store
//! write as one logical replacement.

use bytes::Bytes;

use super::{
    tags::{build_payload, split_payload, Category},
    value::{Scalar, Value},
};
use crate::{
    error::{DotkvResult, EncodeError, StoreError, StoreResult},
    store::{KeyType, Storage},
};

/// The store write an encoded value maps to: which primitive to invoke and
/// the payload(s) to hand it.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedWrite {
    /// A single value written with `set`.
    Value(Bytes),
    /// Members of an unordered set, each independently encoded.
    SetMembers(Vec<Bytes>),
    /// Items of an ordered list, each independently encoded.
    ListItems(Vec<Bytes>),
    /// Field/value pairs of a hash, each independently encoded.
    HashFields(Vec<(Bytes, Bytes)>),
}

/// Classifies `value` and produces its store write.
///
/// Categories are checked in the protocol's precedence order: Text first
/// (string subtypes must never be read as numbers), then Set, Scalar, Map,
/// Seq, and finally the opaque fallback. Composite members go through the
/// forced-literal sub-mode and are stored flat; members are never nested
/// store structures.
pub fn encode(value: &Value) -> Result<EncodedWrite, EncodeError> {
    match value {
        Value::Text(s) => Ok(EncodedWrite::Value(encode_text(s))),
        Value::Set(members) => members
            .iter()
            .map(encode_literal)
            .collect::<Result<Vec<_>, _>>()
            .map(EncodedWrite::SetMembers),
        Value::Scalar(s) => Ok(EncodedWrite::Value(encode_scalar(s))),
        Value::Map(entries) => entries
            .iter()
            .map(|(k, v)| Ok((encode_literal(k)?, encode_literal(v)?)))
            .collect::<Result<Vec<_>, _>>()
            .map(EncodedWrite::HashFields),
        Value::Seq(items) => items
            .iter()
            .map(encode_literal)
            .collect::<Result<Vec<_>, _>>()
            .map(EncodedWrite::ListItems),
        Value::Null | Value::Opaque(_) => Ok(EncodedWrite::Value(encode_literal(value)?)),
    }
}

/// Forced-literal sub-mode: always a flat tagged byte string, never a store
/// structure. Used for members of composites and for hash keys; composites
/// at this level flatten to JSON.
pub fn encode_literal(value: &Value) -> Result<Bytes, EncodeError> {
    match value {
        Value::Text(s) => Ok(encode_text(s)),
        Value::Scalar(s) => Ok(encode_scalar(s)),
        // The set → JSON array demotion happens only here, where the tag
        // still records that the members form a set.
        Value::Set(members) => {
            let array = serde_json::Value::Array(
                members
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<_, _>>()?,
            );
            Ok(build_payload(
                Category::Set,
                "set",
                &serde_json::to_vec(&array)?,
            ))
        }
        Value::Seq(_) => Ok(build_payload(
            Category::List,
            "list",
            &serde_json::to_vec(&value.to_json()?)?,
        )),
        Value::Map(_) => Ok(build_payload(
            Category::Dict,
            "dict",
            &serde_json::to_vec(&value.to_json()?)?,
        )),
        Value::Null => Ok(build_payload(Category::Obj, "obj", b"null")),
        Value::Opaque(json) => Ok(build_payload(
            Category::Obj,
            "obj",
            &serde_json::to_vec(json)?,
        )),
    }
}

fn encode_scalar(scalar: &Scalar) -> Bytes {
    build_payload(
        Category::Num,
        scalar.kind().type_name(),
        scalar.canonical_text().as_bytes(),
    )
}

/// Text is stored raw. The one exception: raw bytes that would themselves
/// split as a tagged payload get fenced behind a `str` tag so the read back
/// cannot mistake them for an encoded scalar.
fn encode_text(text: &str) -> Bytes {
    if split_payload(text.as_bytes()).is_some() {
        build_payload(Category::Str, "str", text.as_bytes())
    } else {
        Bytes::copy_from_slice(text.as_bytes())
    }
}

/// Performs one logical save of `value` at `key`.
///
/// Composite writes delete any existing entry first: the push primitives
/// would merge into leftover members otherwise, and a save must be a
/// whole-value replacement. If the store still reports a type conflict the
/// path is deleted and the write retried exactly once; a second failure is
/// returned to the caller, never swallowed.
pub fn store_value(
    store: &dyn Storage,
    key: &str,
    value: &Value,
) -> DotkvResult<()> {
    let encoded = encode(value)?;
    match write_encoded(store, key, &encoded) {
        Err(StoreError::TypeConflict(reason)) => {
            tracing::debug!(key, %reason, "type conflict on save, replacing entry");
            store.delete(key)?;
            write_encoded(store, key, &encoded).map_err(Into::into)
        }
        other => other.map_err(Into::into),
    }
}

/// Saves `value` and arms a relative expiry on the key.
pub fn store_value_with_ttl(
    store: &dyn Storage,
    key: &str,
    value: &Value,
    ttl: std::time::Duration,
) -> DotkvResult<()> {
    store_value(store, key, value)?;
    store.expire(key, ttl)?;
    Ok(())
}

fn write_encoded(
    store: &dyn Storage,
    key: &str,
    encoded: &EncodedWrite,
) -> StoreResult<()> {
    match encoded {
        EncodedWrite::Value(payload) => store.set(key, payload.clone()),
        EncodedWrite::SetMembers(members) => {
            clear_existing(store, key)?;
            store.set_add(key, members)
        }
        EncodedWrite::ListItems(items) => {
            clear_existing(store, key)?;
            store.list_push(key, items)
        }
        EncodedWrite::HashFields(fields) => {
            clear_existing(store, key)?;
            store.hash_set_fields(key, fields)
        }
    }
}

fn clear_existing(
    store: &dyn Storage,
    key: &str,
) -> StoreResult<()> {
    if store.type_of(key)? != KeyType::None {
        store.delete(key)?;
    }
    Ok(())
}
