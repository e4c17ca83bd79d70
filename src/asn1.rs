//! Minimal ASN.1 DER encoder.
//!
//! Covers exactly the universal types a self-signed X.509 certificate needs.
//! Every constructor returns a [`Value`] node; [`Value::to_der`] serializes a
//! tree into canonical DER (definite lengths, shortest length form, sorted
//! SET members). Nothing in here knows about certificates.

use time::{OffsetDateTime, UtcOffset};

use crate::error::CertError;

pub type Result<T> = std::result::Result<T, CertError>;

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_BIT_STRING: u8 = 0x03;
pub const TAG_NULL: u8 = 0x05;
pub const TAG_OID: u8 = 0x06;
pub const TAG_UTF8_STRING: u8 = 0x0C;
pub const TAG_UTC_TIME: u8 = 0x17;
pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_SET: u8 = 0x31;
/// Class bits for a constructed, context-specific tag (`[n]`).
pub const TAG_CONTEXT_CONSTRUCTED: u8 = 0xA0;

/// An abstract ASN.1 node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A primitive value: tag plus raw content octets.
    Primitive { tag: u8, content: Vec<u8> },
    /// A constructed value whose content is the concatenation of its children.
    Constructed { tag: u8, children: Vec<Value> },
    /// A complete TLV that was already encoded and must be emitted verbatim.
    Encoded(Vec<u8>),
}

impl Value {
    /// Returns the tag byte of this node.
    ///
    /// For [`Value::Encoded`] this is the first byte of the stored TLV.
    pub fn tag(&self) -> Option<u8> {
        match self {
            Value::Primitive { tag, .. } | Value::Constructed { tag, .. } => Some(*tag),
            Value::Encoded(bytes) => bytes.first().copied(),
        }
    }

    /// Serializes the node and all of its children into DER.
    pub fn to_der(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Primitive { tag, content } => write_tlv(*tag, content, out),
            Value::Constructed { tag, children } => {
                let mut encoded: Vec<Vec<u8>> = children.iter().map(Value::to_der).collect();
                // DER: SET OF members are ordered by their encodings.
                if *tag == TAG_SET {
                    encoded.sort();
                }
                write_tlv(*tag, &encoded.concat(), out);
            }
            Value::Encoded(bytes) => out.extend_from_slice(bytes),
        }
    }
}

fn write_tlv(tag: u8, content: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    out.extend(encode_length(content.len()));
    out.extend_from_slice(content);
}

/// Encodes a definite length.
///
/// Lengths below 128 use the one-byte short form. Anything larger uses the
/// long form `0x80 | k` followed by the `k` significant big-endian bytes of
/// the length, never with a leading zero byte.
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes = len.to_be_bytes();
    let significant = strip_leading_zeros(&bytes);
    let mut out = Vec::with_capacity(1 + significant.len());
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    // Keep the final byte so zero still has a representation.
    &bytes[skip.min(bytes.len().saturating_sub(1))..]
}

/// `SEQUENCE { children... }`
pub fn sequence(children: Vec<Value>) -> Value {
    Value::Constructed {
        tag: TAG_SEQUENCE,
        children,
    }
}

/// `SET { children... }`, emitted in canonical DER order.
pub fn set(children: Vec<Value>) -> Value {
    Value::Constructed {
        tag: TAG_SET,
        children,
    }
}

/// Encodes a big-endian magnitude as an INTEGER.
///
/// A `0x00` byte is prepended when the first byte has its high bit set so the
/// value is never read back as negative. The caller supplies a minimal
/// magnitude (no redundant leading zero bytes). An empty slice encodes zero.
pub fn integer_from_bytes(bytes: &[u8]) -> Value {
    let mut content = Vec::with_capacity(bytes.len() + 1);
    match bytes.first() {
        None => content.push(0x00),
        Some(first) if first & 0x80 != 0 => {
            content.push(0x00);
            content.extend_from_slice(bytes);
        }
        Some(_) => content.extend_from_slice(bytes),
    }
    Value::Primitive {
        tag: TAG_INTEGER,
        content,
    }
}

/// Encodes a non-negative integer with its minimal big-endian bytes.
pub fn integer(value: u64) -> Value {
    let bytes = value.to_be_bytes();
    integer_from_bytes(strip_leading_zeros(&bytes))
}

/// Encodes an OBJECT IDENTIFIER from its arcs.
///
/// The first two arcs are packed as `arc0 * 40 + arc1`; every following arc
/// is written base-128, high bit set on all but its last byte.
pub fn object_identifier(arcs: &[u64]) -> Result<Value> {
    let (first, second) = match arcs {
        [first, second, ..] => (*first, *second),
        _ => {
            return Err(CertError::InvalidOid(format!(
                "expected at least two arcs, got {}",
                arcs.len()
            )));
        }
    };
    if first > 2 || (first < 2 && second > 39) {
        return Err(CertError::InvalidOid(format!(
            "first arcs {first}.{second} out of range"
        )));
    }
    let head = (first * 40)
        .checked_add(second)
        .ok_or_else(|| CertError::InvalidOid(format!("arc {second} overflows")))?;

    let mut content = Vec::with_capacity(arcs.len() + 4);
    encode_base128(head, &mut content);
    for &arc in &arcs[2..] {
        encode_base128(arc, &mut content);
    }
    Ok(Value::Primitive {
        tag: TAG_OID,
        content,
    })
}

fn encode_base128(value: u64, out: &mut Vec<u8>) {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push(0x80 | (rest & 0x7F) as u8);
        rest >>= 7;
    }
    out.extend(groups.iter().rev());
}

pub fn utf8_string(value: &str) -> Value {
    Value::Primitive {
        tag: TAG_UTF8_STRING,
        content: value.as_bytes().to_vec(),
    }
}

/// Encodes a date as UTCTime (`yyMMddHHmmss'Z'`), converted to UTC first.
///
/// UTCTime only carries years 1950 through 2049; anything else is an
/// [`CertError::EncodingError`].
pub fn utc_time(date: OffsetDateTime) -> Result<Value> {
    let utc = date.to_offset(UtcOffset::UTC);
    let year = utc.year();
    if !(1950..=2049).contains(&year) {
        return Err(CertError::EncodingError(format!(
            "year {year} cannot be represented as UTCTime"
        )));
    }
    let text = format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}Z",
        year % 100,
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second()
    );
    Ok(Value::Primitive {
        tag: TAG_UTC_TIME,
        content: text.into_bytes(),
    })
}

/// BIT STRING of whole bytes; the unused-bits prefix is always 0.
pub fn bit_string(data: &[u8]) -> Value {
    let mut content = Vec::with_capacity(data.len() + 1);
    content.push(0x00);
    content.extend_from_slice(data);
    Value::Primitive {
        tag: TAG_BIT_STRING,
        content,
    }
}

pub fn null() -> Value {
    Value::Primitive {
        tag: TAG_NULL,
        content: Vec::new(),
    }
}

/// Explicit `[tag_number]` wrapper around `content`.
///
/// `tag_number` must fit in the low five bits (0..=30).
pub fn context_specific(tag_number: u8, content: Value) -> Value {
    debug_assert!(tag_number < 0x1F, "high tag numbers are not supported");
    Value::Constructed {
        tag: TAG_CONTEXT_CONSTRUCTED | tag_number,
        children: vec![content],
    }
}

/// Embeds an already encoded TLV without touching its bytes.
pub fn encoded(bytes: Vec<u8>) -> Value {
    Value::Encoded(bytes)
}
