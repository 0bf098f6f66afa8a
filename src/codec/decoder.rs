//! Read side of the protocol: turn what the store materialized back into
//! the native value that was saved, without any external schema.

use bytes::Bytes;

use super::{
    registry::ScalarKind,
    tags::split_payload,
    value::Value,
};
use crate::{
    error::{DecodeError, DotkvResult},
    store::{KeyType, Storage},
};

/// Data read back from the store for one key, shaped by the store's own
/// structural type.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEntry {
    /// A single opaque byte value (string-typed key).
    Value(Bytes),
    /// Members of a set-typed key.
    Set(Vec<Bytes>),
    /// Items of a list-typed key, in list order.
    List(Vec<Bytes>),
    /// Field/value pairs of a hash-typed key.
    Hash(Vec<(Bytes, Bytes)>),
}

/// How single payloads are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Reconstruct the original native value (the normal mode).
    #[default]
    Typed,
    /// Skip reconstruction and surface raw payload bytes as text. Useful for
    /// inspecting what is actually stored.
    Verbatim,
}

/// Per-key result of a batched read.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The key existed and decoded.
    Found(Value),
    /// The key is absent from the store.
    Missing,
    /// The key existed but its payload did not decode.
    Failed(DecodeError),
}

impl LoadOutcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            LoadOutcome::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, LoadOutcome::Missing)
    }
}

/// Reassembles a native value from one store entry. Composite entries decode
/// each member independently as tagged-or-literal.
pub fn decode_entry(
    entry: RawEntry,
    mode: DecodeMode,
) -> Result<Value, DecodeError> {
    match entry {
        RawEntry::Value(raw) => decode_literal(&raw, mode),
        RawEntry::Set(members) => Ok(Value::Set(
            members
                .iter()
                .map(|m| decode_literal(m, mode))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        RawEntry::List(items) => Ok(Value::Seq(
            items
                .iter()
                .map(|i| decode_literal(i, mode))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        RawEntry::Hash(fields) => Ok(Value::Map(
            fields
                .iter()
                .map(|(k, v)| Ok::<_, DecodeError>((decode_literal(k, mode)?, decode_literal(v, mode)?)))
                .collect::<Result<Vec<_>, _>>()?,
        )),
    }
}

/// Decodes one flat byte string: a tagged payload is dispatched through the
/// registry by its concrete type name, anything else is literal text.
pub fn decode_literal(
    raw: &[u8],
    mode: DecodeMode,
) -> Result<Value, DecodeError> {
    if mode == DecodeMode::Verbatim {
        return Ok(Value::Text(std::str::from_utf8(raw)?.to_owned()));
    }

    let Some(payload) = split_payload(raw) else {
        return Ok(Value::Text(std::str::from_utf8(raw)?.to_owned()));
    };

    let text = std::str::from_utf8(payload.value)?;
    if let Some(kind) = ScalarKind::from_type_name(payload.type_name) {
        return Ok(Value::Scalar(kind.parse(text)?));
    }

    match payload.type_name {
        "str" => Ok(Value::Text(text.to_owned())),
        // Legacy flattened composites: the value bytes are JSON.
        "dict" | "list" => Ok(Value::from_json(serde_json::from_str(text)?)),
        "set" => match Value::from_json(serde_json::from_str(text)?) {
            Value::Seq(members) => Ok(Value::Set(members)),
            _ => Err(DecodeError::malformed("set", text)),
        },
        "obj" => {
            let json: serde_json::Value = serde_json::from_str(text)?;
            if json.is_null() {
                Ok(Value::Null)
            } else {
                Ok(Value::Opaque(json))
            }
        }
        unknown => Err(DecodeError::UnknownTypeTag(unknown.to_owned())),
    }
}

/// Batched read: one `mget` round trip first, then a per-key fallback for
/// every empty slot that asks the store for the key's structural type and
/// fetches through the matching accessor. A missing key becomes a
/// [`LoadOutcome::Missing`] marker and never aborts the rest of the batch.
pub fn fetch_many(
    store: &dyn Storage,
    keys: &[&str],
    mode: DecodeMode,
) -> DotkvResult<Vec<LoadOutcome>> {
    let slots = store.mget(keys)?;
    let mut outcomes = Vec::with_capacity(keys.len());

    for (key, slot) in keys.iter().zip(slots) {
        let outcome = match slot {
            Some(raw) => outcome_of(decode_literal(&raw, mode)),
            None => fetch_fallback(store, key, mode)?,
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Single-key read built on the batched path.
pub fn fetch_value(
    store: &dyn Storage,
    key: &str,
    mode: DecodeMode,
) -> DotkvResult<Option<Value>> {
    let outcome = fetch_many(store, &[key], mode)?
        .pop()
        .unwrap_or(LoadOutcome::Missing);
    match outcome {
        LoadOutcome::Found(value) => Ok(Some(value)),
        LoadOutcome::Missing => Ok(None),
        LoadOutcome::Failed(err) => Err(err.into()),
    }
}

fn fetch_fallback(
    store: &dyn Storage,
    key: &str,
    mode: DecodeMode,
) -> DotkvResult<LoadOutcome> {
    let entry = match store.type_of(key)? {
        KeyType::None => {
            tracing::warn!(key, "key not found in store");
            return Ok(LoadOutcome::Missing);
        }
        KeyType::String => match store.get(key)? {
            Some(raw) => RawEntry::Value(raw),
            None => {
                tracing::warn!(key, "key vanished between type probe and fetch");
                return Ok(LoadOutcome::Missing);
            }
        },
        KeyType::List => RawEntry::List(store.list_range(key, 0, -1)?),
        KeyType::Set => RawEntry::Set(store.set_members(key)?.into_iter().collect()),
        KeyType::Hash => RawEntry::Hash(store.hash_get_all(key)?),
    };

    Ok(outcome_of(decode_entry(entry, mode)))
}

fn outcome_of(decoded: Result<Value, DecodeError>) -> LoadOutcome {
    match decoded {
        Ok(value) => LoadOutcome::Found(value),
        Err(err) => {
            tracing::warn!(%err, "stored payload failed to decode");
            LoadOutcome::Failed(err)
        }
    }
}
