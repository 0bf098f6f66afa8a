use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as Json;

use crate::error::EncodeError;

/// A single tagged scalar: formatted to canonical text on write and
/// reconstructed from it on read via the type-tag registry.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A boolean, stored as literal `True`/`False` text.
    Bool(bool),
    /// An arbitrary-precision decimal.
    Decimal(Decimal),
    /// A complex number, stored in its canonical `(re+imj)` text form.
    Complex {
        re: f64,
        im: f64,
    },
    /// A calendar date without a time component.
    Date(NaiveDate),
    /// A date with time, microsecond precision.
    DateTime(NaiveDateTime),
}

/// Represents a generic native value the codec can persist.
///
/// This is the closed union every stored value is classified into. Composite
/// variants (`Set`, `Seq`, `Map`) carry members in insertion order; `Set` and
/// `Map` compare order-insensitively because the store materializes them as
/// unordered structures.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absence of a value; round-trips through the opaque path.
    Null,
    /// A UTF-8 string, stored as raw bytes.
    Text(String),
    /// A scalar, stored as a tagged byte string.
    Scalar(Scalar),
    /// An unordered collection of unique members.
    Set(Vec<Value>),
    /// An ordered list of members.
    Seq(Vec<Value>),
    /// An associative structure. Keys may be any encodable value.
    Map(Vec<(Value, Value)>),
    /// Anything else, serialized generically as JSON.
    Opaque(Json),
}

impl PartialEq for Value {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            // Sets are unordered: same size, every member present on the
            // other side.
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|m| b.contains(m))
            }
            // Map entry order is not preserved by the store either.
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(bk, bv)| k == bk && v == bv))
            }
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Builds a set, dropping duplicate members.
    pub fn set<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut unique: Vec<Value> = Vec::new();
        for member in members {
            if !unique.contains(&member) {
                unique.push(member);
            }
        }
        Value::Set(unique)
    }

    /// Builds an ordered sequence.
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Seq(items.into_iter().collect())
    }

    /// Builds a mapping from key/value pairs.
    pub fn map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Value::Map(entries.into_iter().collect())
    }

    /// Builds a complex scalar.
    pub fn complex(
        re: f64,
        im: f64,
    ) -> Self {
        Value::Scalar(Scalar::Complex { re, im })
    }

    /// Serializes an arbitrary `Serialize` value into the opaque category.
    pub fn opaque<T: Serialize>(value: &T) -> Result<Self, EncodeError> {
        Ok(Value::Opaque(serde_json::to_value(value)?))
    }

    /// Converts the value to its generic JSON form, the representation used
    /// for forced-literal composites and opaque payloads. Map keys are
    /// stringified because JSON objects only carry text keys; composite keys
    /// have no JSON rendering and are rejected.
    pub fn to_json(&self) -> Result<Json, EncodeError> {
        match self {
            Value::Null => Ok(Json::Null),
            Value::Text(s) => Ok(Json::String(s.clone())),
            Value::Scalar(Scalar::Int(i)) => Ok(Json::from(*i)),
            Value::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| {
                    EncodeError::Unsupported(format!("non-finite float {f} in JSON composite"))
                }),
            Value::Scalar(Scalar::Bool(b)) => Ok(Json::Bool(*b)),
            // Remaining scalars have no JSON number form; their canonical
            // text stands in, matching the generic serializer on the write
            // side that produced legacy payloads.
            Value::Scalar(other) => Ok(Json::String(other.canonical_text())),
            // A set inside another composite cannot be told apart from a
            // list once in JSON, so it is refused rather than silently
            // demoted. The encoder flattens a directly-held set itself,
            // under a tag that records its setness.
            Value::Set(_) => Err(EncodeError::Unsupported(
                "set has no JSON rendering".to_owned(),
            )),
            Value::Seq(members) => Ok(Json::Array(
                members
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<_, _>>()?,
            )),
            Value::Map(entries) => {
                let mut object = serde_json::Map::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match key {
                        Value::Text(s) => s.clone(),
                        Value::Scalar(s) => s.canonical_text(),
                        other => {
                            return Err(EncodeError::Unsupported(format!(
                                "map key {other:?} has no JSON rendering"
                            )))
                        }
                    };
                    object.insert(key, value.to_json()?);
                }
                Ok(Json::Object(object))
            }
            Value::Opaque(json) => Ok(json.clone()),
        }
    }

    /// Rebuilds a value from its generic JSON form. The inverse of
    /// [`Value::to_json`] up to the stringification JSON imposes: object keys
    /// come back as `Text` and non-numeric scalars as their text form.
    pub fn from_json(json: Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Scalar(Scalar::Int(i))
                } else {
                    Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Json::String(s) => Value::Text(s),
            Json::Array(items) => Value::Seq(items.into_iter().map(Value::from_json).collect()),
            Json::Object(object) => Value::Map(
                object
                    .into_iter()
                    .map(|(k, v)| (Value::Text(k), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(Scalar::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(Scalar::Int(v as i64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(Scalar::Float(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(Scalar::Bool(v))
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Scalar(Scalar::Decimal(v))
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Scalar(Scalar::Date(v))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Scalar(Scalar::DateTime(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
