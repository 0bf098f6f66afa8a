//! Type-tag registry: the fixed bijection between wire type names and
//! scalar formatters/reconstructors.
//!
//! Adding a scalar type means adding a `ScalarKind` variant; the compiler
//! then demands the matching arm in every table below, which keeps the two
//! sides of the bijection in one auditable place. There is no runtime
//! registration.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use strum_macros::EnumIter;

use super::value::Scalar;
use crate::error::DecodeError;

/// Canonical datetime text form, microsecond precision.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%6fZ";

/// Canonical date text form.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One entry per concrete scalar type the protocol round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ScalarKind {
    Int,
    Float,
    Bool,
    Decimal,
    Complex,
    Date,
    DateTime,
}

impl ScalarKind {
    /// The concrete type name recorded in the tagged payload.
    pub const fn type_name(self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
            ScalarKind::Decimal => "Decimal",
            ScalarKind::Complex => "complex",
            ScalarKind::Date => "date",
            ScalarKind::DateTime => "datetime",
        }
    }

    /// Reverse lookup from a wire type name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(ScalarKind::Int),
            "float" => Some(ScalarKind::Float),
            "bool" => Some(ScalarKind::Bool),
            "Decimal" => Some(ScalarKind::Decimal),
            "complex" => Some(ScalarKind::Complex),
            "date" => Some(ScalarKind::Date),
            "datetime" => Some(ScalarKind::DateTime),
            _ => None,
        }
    }

    /// Reconstructs a scalar from its canonical text. A recognized kind with
    /// corrupt value text fails loudly; there is no default value.
    pub fn parse(
        self,
        text: &str,
    ) -> Result<Scalar, DecodeError> {
        match self {
            ScalarKind::Int => text
                .parse::<i64>()
                .map(Scalar::Int)
                .map_err(|_| DecodeError::malformed("int", text)),
            ScalarKind::Float => text
                .parse::<f64>()
                .map(Scalar::Float)
                .map_err(|_| DecodeError::malformed("float", text)),
            ScalarKind::Bool => match text {
                "True" => Ok(Scalar::Bool(true)),
                "False" => Ok(Scalar::Bool(false)),
                _ => Err(DecodeError::malformed("bool", text)),
            },
            ScalarKind::Decimal => Decimal::from_str(text)
                .map(Scalar::Decimal)
                .map_err(|_| DecodeError::malformed("Decimal", text)),
            ScalarKind::Complex => parse_complex(text),
            ScalarKind::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(Scalar::Date)
                .map_err(|_| DecodeError::malformed("date", text)),
            ScalarKind::DateTime => NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                .map(Scalar::DateTime)
                .map_err(|_| DecodeError::malformed("datetime", text)),
        }
    }
}

impl Scalar {
    /// The registry entry this scalar formats through.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Decimal(_) => ScalarKind::Decimal,
            Scalar::Complex { .. } => ScalarKind::Complex,
            Scalar::Date(_) => ScalarKind::Date,
            Scalar::DateTime(_) => ScalarKind::DateTime,
        }
    }

    /// Deterministic canonical text form. Encoding the same scalar twice
    /// always yields identical bytes.
    pub fn canonical_text(&self) -> String {
        match self {
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(true) => "True".to_owned(),
            Scalar::Bool(false) => "False".to_owned(),
            Scalar::Decimal(d) => d.to_string(),
            Scalar::Complex { re, im } => format_complex(*re, *im),
            Scalar::Date(d) => d.format(DATE_FORMAT).to_string(),
            Scalar::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }
}

/// Wire type names the decoder reconstructs for single tagged values: the
/// scalar kinds plus tagged text and the flattened composite forms.
pub fn known_type_names() -> Vec<&'static str> {
    use strum::IntoEnumIterator;

    let mut names: Vec<&'static str> = ScalarKind::iter().map(ScalarKind::type_name).collect();
    names.extend(["str", "dict", "list", "set", "obj"]);
    names
}

/// Complex numbers print the way they parse: `(re+imj)` with the real part
/// omitted when zero.
fn format_complex(
    re: f64,
    im: f64,
) -> String {
    if re == 0.0 {
        format!("{im}j")
    } else if im.is_sign_negative() && !im.is_nan() {
        format!("({re}-{}j)", -im)
    } else {
        format!("({re}+{im}j)")
    }
}

fn parse_complex(text: &str) -> Result<Scalar, DecodeError> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);

    let Some(imag_part) = inner.strip_suffix(&['j', 'J'][..]) else {
        // No imaginary suffix: a plain real.
        let re = inner
            .parse::<f64>()
            .map_err(|_| DecodeError::malformed("complex", text))?;
        return Ok(Scalar::Complex { re, im: 0.0 });
    };

    // Find the sign that separates the real and imaginary parts, skipping a
    // leading sign and exponent signs.
    let split = imag_part
        .char_indices()
        .rev()
        .find(|&(i, c)| {
            i > 0 && matches!(c, '+' | '-') && !matches!(imag_part.as_bytes()[i - 1], b'e' | b'E')
        })
        .map(|(i, _)| i);

    let (re_text, im_text) = match split {
        Some(i) => (&imag_part[..i], &imag_part[i..]),
        None => ("", imag_part),
    };

    let re = if re_text.is_empty() {
        0.0
    } else {
        re_text
            .parse::<f64>()
            .map_err(|_| DecodeError::malformed("complex", text))?
    };
    let im = match im_text {
        "" | "+" => 1.0,
        "-" => -1.0,
        t => t
            .parse::<f64>()
            .map_err(|_| DecodeError::malformed("complex", text))?,
    };

    Ok(Scalar::Complex { re, im })
}
