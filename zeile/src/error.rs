use std::fmt::{self, Display, Formatter};
use thiserror::Error;

use crate::transform::TransformError;

/// One step on the way from the top-level record down to the value that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// Location of a failing value inside a record, rendered as `roles[2].name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // errors bubble up from the leaf, so segments arrive innermost first
    fn prepend(&mut self, segment: Segment) {
        self.0.insert(0, segment);
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("value {value} is out of range for {codec}")]
    Range { codec: &'static str, value: String },
    #[error("expected {expected}, found {found}")]
    Type { expected: &'static str, found: &'static str },
    #[error("length {0} exceeds maximum {1}")]
    Length(u64, u64),
    #[error("character {ch:?} cannot be represented in {encoding}")]
    Unrepresentable { ch: char, encoding: &'static str },
    #[error("utc offset of {0} seconds is not a whole number of minutes")]
    Offset(i32),
    #[error("no value supplied")]
    MissingValue,
    #[error("list of {0} elements occupies no bytes and could not be read back")]
    ZeroWidth(usize),
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl EncodeError {
    /// Attaches the name of the codec that raised this error.
    pub fn by(self, codec: &'static str) -> EncoderError {
        EncoderError { inner: self, codec, path: FieldPath::default() }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of buffer: requested {requested} bytes, {remaining} remaining")]
    Underflow { requested: usize, remaining: usize },
    #[error("varint exceeds the 64 bit domain")]
    VarintOverflow,
    #[error("length {0} exceeds maximum {1}")]
    Length(u64, u64),
    #[error("string slice was not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("bytes are not valid {0}")]
    Text(&'static str),
    #[error("invalid json document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timestamp {0} cannot be represented")]
    Timestamp(u64),
    #[error("utc offset of {0} minutes is out of range")]
    Offset(i16),
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Attaches the name of the codec that raised this error and the input position it was raised at.
    pub fn at(self, codec: &'static str, at: usize) -> DecoderError {
        DecoderError { inner: self, codec, path: FieldPath::default(), at }
    }
}

#[derive(Debug, Error)]
#[error("{inner} (field {path}, codec {codec})")]
pub struct EncoderError {
    #[source]
    inner: EncodeError,
    codec: &'static str,
    path: FieldPath,
}

impl EncoderError {
    pub fn inner(&self) -> &EncodeError {
        &self.inner
    }

    pub fn into_inner(self) -> EncodeError {
        self.inner
    }

    pub fn codec(&self) -> &'static str {
        self.codec
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub(crate) fn within(mut self, segment: Segment) -> Self {
        self.path.prepend(segment);
        self
    }
}

#[derive(Debug, Error)]
#[error("{inner} at input position {at} (field {path}, codec {codec})")]
pub struct DecoderError {
    #[source]
    inner: DecodeError,
    codec: &'static str,
    path: FieldPath,
    at: usize,
}

impl DecoderError {
    pub fn inner(&self) -> &DecodeError {
        &self.inner
    }

    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    pub fn codec(&self) -> &'static str {
        self.codec
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn position(&self) -> usize {
        self.at
    }

    pub(crate) fn within(mut self, segment: Segment) -> Self {
        self.path.prepend(segment);
        self
    }
}

/// Raised while a schema is being defined, never while data flows through it.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("field {field} is declared twice in schema {schema}")]
    DuplicateField { schema: String, field: String },
    #[error("precision {0} is outside 0..=9")]
    Precision(u8),
    #[error("default of field {field} cannot be encoded by its codec: {source}")]
    Default {
        field: String,
        #[source]
        source: EncodeError,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncoderError),
    #[error(transparent)]
    Decode(#[from] DecoderError),
    #[error("payload transform failed: {0}")]
    Transform(#[source] TransformError),
    #[error("{remaining} trailing bytes at input position {at}")]
    Trailing { at: usize, remaining: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_rendering() {
        let err = EncodeError::MissingValue
            .by("String")
            .within(Segment::Field("name".to_owned()))
            .within(Segment::Index(2))
            .within(Segment::Field("roles".to_owned()));
        assert_eq!("roles[2].name", err.path().to_string());
        assert_eq!("no value supplied (field roles[2].name, codec String)", err.to_string());
    }

    #[test]
    fn root_path() {
        let err = DecodeError::VarintOverflow.at("List", 7);
        assert!(err.path().is_empty());
        assert_eq!("varint exceeds the 64 bit domain at input position 7 (field <root>, codec List)", err.to_string());
    }
}
