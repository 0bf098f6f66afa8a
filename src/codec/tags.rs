//! Wire format of tagged payloads.
//!
//! A tagged payload is `TAG_MARKER + category + ITEM_DIVIDER + type_name +
//! ITEM_DIVIDER + value_bytes`. The constants are fixed: data already written
//! under this format must keep reading back byte-for-byte. Anything that does
//! not start with the marker, a known category and two dividers is literal
//! text, so ordinary strings that happen to contain the marker survive the
//! round trip untouched.

use bytes::{BufMut, Bytes, BytesMut};
use memchr::memmem;

/// Reserved prefix that introduces a tagged payload.
pub const TAG_MARKER: &[u8] = b"!__";

/// Reserved separator between the category, type name and value fields.
pub const ITEM_DIVIDER: &[u8] = b"__";

/// Value category recorded in a tagged payload.
///
/// Classification precedence on the write side: Text before Set before
/// Scalar before Map before Seq, with Opaque as the fallback. Text normally
/// stays untagged; `Str` only appears when raw text would itself parse as a
/// tagged payload and must be fenced off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Any scalar: numbers, booleans, dates.
    Num,
    /// Text that needed explicit tagging to stay unambiguous.
    Str,
    /// A flattened set, JSON-encoded.
    Set,
    /// A flattened list, JSON-encoded.
    List,
    /// A flattened mapping, JSON-encoded.
    Dict,
    /// Generic JSON serialization of anything else.
    Obj,
}

impl Category {
    pub const fn tag(self) -> &'static str {
        match self {
            Category::Num => "num",
            Category::Str => "str",
            Category::Set => "set",
            Category::List => "list",
            Category::Dict => "dict",
            Category::Obj => "obj",
        }
    }

    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"num" => Some(Category::Num),
            b"str" => Some(Category::Str),
            b"set" => Some(Category::Set),
            b"list" => Some(Category::List),
            b"dict" => Some(Category::Dict),
            b"obj" => Some(Category::Obj),
            _ => None,
        }
    }
}

/// A borrowed view into a successfully split tagged payload.
#[derive(Debug, PartialEq, Eq)]
pub struct TaggedPayload<'a> {
    pub category: Category,
    pub type_name: &'a str,
    pub value: &'a [u8],
}

/// Assembles a tagged payload from its three fields.
pub fn build_payload(
    category: Category,
    type_name: &str,
    value: &[u8],
) -> Bytes {
    let tag = category.tag().as_bytes();
    let mut buf = BytesMut::with_capacity(
        TAG_MARKER.len() + tag.len() + ITEM_DIVIDER.len() * 2 + type_name.len() + value.len(),
    );
    buf.put_slice(TAG_MARKER);
    buf.put_slice(tag);
    buf.put_slice(ITEM_DIVIDER);
    buf.put_slice(type_name.as_bytes());
    buf.put_slice(ITEM_DIVIDER);
    buf.put_slice(value);
    buf.freeze()
}

/// Splits raw bytes into a tagged payload, or `None` when the bytes are
/// literal text.
///
/// Strict on purpose: the marker must come first, the category must be one
/// the protocol knows, and both dividers must be present. The value part is
/// never scanned, so dividers inside it are harmless.
pub fn split_payload(raw: &[u8]) -> Option<TaggedPayload<'_>> {
    let rest = raw.strip_prefix(TAG_MARKER)?;

    let div = memmem::find(rest, ITEM_DIVIDER)?;
    let category = Category::from_tag(&rest[..div])?;
    let rest = &rest[div + ITEM_DIVIDER.len()..];

    let div = memmem::find(rest, ITEM_DIVIDER)?;
    let type_name = std::str::from_utf8(&rest[..div]).ok()?;
    let value = &rest[div + ITEM_DIVIDER.len()..];

    Some(TaggedPayload {
        category,
        type_name,
        value,
    })
}
