//! Bounds-checked sequential reader for framed-message bodies.
//!
//! `BinaryCursor` applies a declarative field schema to a byte buffer:
//! each field names a primitive kind, and variable-length kinds reference
//! an earlier field for their length. Any read past the end of the buffer,
//! or a length reference to a field that has not been decoded yet, aborts
//! the whole decode. There are no partial results.
//!
//! The schema interpreter is internal to the codec module; message types
//! expose ordinary typed structs, not string-keyed maps.

use crate::error::{GatewayError, Result};

/// Primitive field kinds understood by the cursor.
///
/// Adding a kind means extending this enum and the single `match` in
/// [`BinaryCursor::apply`]; schemas and call sites are untouched.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Big-endian unsigned 16-bit integer.
    U16,
    /// Big-endian unsigned 32-bit integer.
    U32,
    /// UTF-8 text whose byte length comes from an earlier field.
    Text {
        /// Name of the already-decoded field supplying the length.
        length_from: &'static str,
    },
    /// Raw bytes rendered as a lowercase hex string, length from an
    /// earlier field.
    Hex {
        /// Name of the already-decoded field supplying the length.
        length_from: &'static str,
    },
}

/// One entry in a field schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name, used for length references and result lookup.
    pub name: &'static str,
    /// Primitive kind.
    pub kind: FieldKind,
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Decoded u16.
    U16(u16),
    /// Decoded u32.
    U32(u32),
    /// Decoded text.
    Text(String),
    /// Decoded bytes as a hex string.
    Hex(String),
}

impl FieldValue {
    /// Numeric value usable as a length prefix, if this field is numeric.
    fn as_length(&self) -> Option<usize> {
        match self {
            FieldValue::U16(v) => Some(*v as usize),
            FieldValue::U32(v) => Some(*v as usize),
            _ => None,
        }
    }

    /// The u16 value, if this field decoded as one.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            FieldValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    /// The u32 value, if this field decoded as one.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// The string value, for text and hex fields.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Hex(s) => Some(s),
            _ => None,
        }
    }
}

/// Result of applying a schema: named values in decode order plus the
/// final offset reached.
#[derive(Debug)]
pub struct DecodedFields {
    fields: Vec<(&'static str, FieldValue)>,
    /// Offset of the first byte after the last decoded field.
    pub offset: usize,
}

impl DecodedFields {
    /// Look up a decoded field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Required u16 field; `MalformedFrame` if absent or mistyped.
    pub fn require_u16(&self, name: &'static str) -> Result<u16> {
        self.get(name)
            .and_then(FieldValue::as_u16)
            .ok_or_else(|| GatewayError::MalformedFrame(format!("missing u16 field {name}")))
    }

    /// Required u32 field; `MalformedFrame` if absent or mistyped.
    pub fn require_u32(&self, name: &'static str) -> Result<u32> {
        self.get(name)
            .and_then(FieldValue::as_u32)
            .ok_or_else(|| GatewayError::MalformedFrame(format!("missing u32 field {name}")))
    }

    /// Required text/hex field; `MalformedFrame` if absent or mistyped.
    pub fn require_str(&self, name: &'static str) -> Result<String> {
        self.get(name)
            .and_then(FieldValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError::MalformedFrame(format!("missing string field {name}")))
    }
}

/// Bounds-checked sequential reader over a byte buffer.
#[derive(Debug)]
pub struct BinaryCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> BinaryCursor<'a> {
    /// Create a cursor starting at `offset`.
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    /// Current offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read a big-endian u16, advancing the cursor.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2, "u16")?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a big-endian u32, advancing the cursor.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4, "u32")?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read `len` bytes as UTF-8 text (lossy), advancing the cursor.
    pub fn read_text(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len, "text")?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read `len` bytes rendered as lowercase hex, advancing the cursor.
    pub fn read_hex(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len, "hex")?;
        Ok(to_hex(bytes))
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(len).ok_or_else(|| {
            GatewayError::MalformedFrame(format!("{what} length overflow at offset {}", self.offset))
        })?;
        if end > self.buf.len() {
            return Err(GatewayError::MalformedFrame(format!(
                "buffer too short for {what} at offset {}: need {}, have {}",
                self.offset,
                len,
                self.buf.len() - self.offset.min(self.buf.len())
            )));
        }
        let bytes = &self.buf[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    /// Decode fields in schema order.
    ///
    /// Fails on any out-of-bounds read or on a length reference to a field
    /// that is not yet decoded or is not numeric. On success the returned
    /// offset is the cursor position after the final field.
    pub fn apply(mut self, schema: &[FieldSpec]) -> Result<DecodedFields> {
        let mut fields: Vec<(&'static str, FieldValue)> = Vec::with_capacity(schema.len());

        let resolve_length = |fields: &[(&'static str, FieldValue)], name: &str| {
            fields
                .iter()
                .find(|(n, _)| *n == name)
                .and_then(|(_, v)| v.as_length())
                .ok_or_else(|| {
                    GatewayError::MalformedFrame(format!(
                        "length reference to undecoded field {name}"
                    ))
                })
        };

        for spec in schema {
            let value = match spec.kind {
                FieldKind::U16 => FieldValue::U16(self.read_u16()?),
                FieldKind::U32 => FieldValue::U32(self.read_u32()?),
                FieldKind::Text { length_from } => {
                    let len = resolve_length(&fields, length_from)?;
                    FieldValue::Text(self.read_text(len)?)
                }
                FieldKind::Hex { length_from } => {
                    let len = resolve_length(&fields, length_from)?;
                    FieldValue::Hex(self.read_hex(len)?)
                }
            };
            fields.push((spec.name, value));
        }

        Ok(DecodedFields {
            fields,
            offset: self.offset,
        })
    }
}

/// Render bytes as a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(out, "{b:02x}");
    }
    out
}
