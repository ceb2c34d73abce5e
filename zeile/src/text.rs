//! Text codecs. `String` and `StringJson` are length-prefixed UTF-8, `FixedString` always occupies its configured
//! number of bytes.
//!
//! A `FixedString` longer than its slot is cut at the last complete character that still fits, so a fixed string
//! written by this crate always decodes again. The rest of the slot is filled with zero bytes, which are stripped on
//! read together with any other trailing NUL characters.

use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{DecodeError, EncodeError};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO 8859-1: every character below U+0100 as one byte
    Latin1,
    Ascii,
}

impl TextEncoding {

    pub fn name(&self) -> &'static str {
        match *self {
            TextEncoding::Utf8    => "UTF-8",
            TextEncoding::Utf16Le => "UTF-16LE",
            TextEncoding::Utf16Be => "UTF-16BE",
            TextEncoding::Latin1  => "ISO-8859-1",
            TextEncoding::Ascii   => "ASCII",
        }
    }

    /// Encodes as many whole characters of `s` as fit into `length` bytes and pads the rest with zeros.
    pub fn encode_fixed(&self, s: &str, length: usize) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(length);
        for ch in s.chars() {
            let start = out.len();
            self.push_char(ch, &mut out)?;
            if out.len() > length {
                out.truncate(start);
                break;
            }
        }
        out.resize(length, 0);
        Ok(out)
    }

    /// Decodes a complete slot and strips trailing NUL characters.
    pub fn decode_fixed(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let mut s = match *self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)?.to_owned(),
            TextEncoding::Utf16Le => self.decode_utf16(bytes, u16::from_le_bytes)?,
            TextEncoding::Utf16Be => self.decode_utf16(bytes, u16::from_be_bytes)?,
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Ascii if bytes.is_ascii() => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Ascii => return Err(DecodeError::Text(self.name())),
        };
        let trimmed = s.trim_end_matches('\0').len();
        s.truncate(trimmed);
        Ok(s)
    }

    fn push_char(&self, ch: char, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match *self {
            TextEncoding::Utf8 => {
                let mut tmp = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
            }
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                let mut tmp = [0u16; 2];
                for unit in ch.encode_utf16(&mut tmp) {
                    match *self {
                        TextEncoding::Utf16Le => out.extend_from_slice(&unit.to_le_bytes()),
                        _ => out.extend_from_slice(&unit.to_be_bytes()),
                    }
                }
            }
            TextEncoding::Latin1 => {
                let b = u8::try_from(u32::from(ch)).map_err(|_| EncodeError::Unrepresentable { ch, encoding: self.name() })?;
                out.push(b);
            }
            TextEncoding::Ascii if ch.is_ascii() => out.push(ch as u8),
            TextEncoding::Ascii => return Err(EncodeError::Unrepresentable { ch, encoding: self.name() }),
        }
        Ok(())
    }

    /// An odd slot length leaves one byte that can't hold a code unit; it has to be padding.
    fn decode_utf16(&self, bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, DecodeError> {
        let chunks = bytes.chunks_exact(2);
        if chunks.remainder().iter().any(|&b| b != 0) {
            return Err(DecodeError::Text(self.name()));
        }
        let units = chunks.map(|c| unit([c[0], c[1]]));
        char::decode_utf16(units).collect::<Result<String, _>>().map_err(|_| DecodeError::Text(self.name()))
    }

}

fn expect_str(value: &Value) -> Result<&str, EncodeError> {
    value.as_str().ok_or(EncodeError::Type { expected: "string", found: value.typename() })
}

pub(crate) fn write_string(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    let s = expect_str(value)?;
    w.write_length(s.len())?;
    w.write_bytes(s.as_bytes());
    Ok(())
}

pub(crate) fn read_string(r: &mut ReadCursor) -> Result<Value, DecodeError> {
    let len = r.read_length()?;
    let bytes = r.read_bytes(len)?;
    Ok(Value::Str(std::str::from_utf8(bytes)?.to_owned()))
}

pub(crate) fn write_fixed(w: &mut WriteCursor, value: &Value, length: usize, encoding: TextEncoding) -> Result<(), EncodeError> {
    let bytes = encoding.encode_fixed(expect_str(value)?, length)?;
    w.write_bytes(&bytes);
    Ok(())
}

pub(crate) fn read_fixed(r: &mut ReadCursor, length: usize, encoding: TextEncoding) -> Result<Value, DecodeError> {
    encoding.decode_fixed(r.read_bytes(length)?).map(Value::Str)
}

pub(crate) fn write_json(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    let doc = match value {
        Value::Json(doc) => doc,
        other => return Err(EncodeError::Type { expected: "json", found: other.typename() }),
    };
    let bytes = serde_json::to_vec(doc)?;
    w.write_length(bytes.len())?;
    w.write_bytes(&bytes);
    Ok(())
}

/// An empty document decodes as the empty object.
pub(crate) fn read_json(r: &mut ReadCursor) -> Result<Value, DecodeError> {
    let len = r.read_length()?;
    let bytes = r.read_bytes(len)?;
    if bytes.is_empty() {
        return Ok(Value::Json(serde_json::Value::Object(serde_json::Map::new())));
    }
    Ok(Value::Json(serde_json::from_slice(bytes)?))
}
