//! The record walker. It applies a schema's codecs to a record's values strictly in declared order; there is nothing
//! on the wire that names a field or its type. Nested records are walked recursively and consume exactly the bytes
//! their own fields define.

use crate::codec::Codec;
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{DecoderError, EncodeError, EncoderError, Segment};
use crate::schema::Schema;
use crate::value::{Record, Value};

pub struct RecordCodec<'s> {
    schema: &'s Schema,
}

impl<'s> RecordCodec<'s> {

    pub fn new(schema: &'s Schema) -> Self {
        RecordCodec { schema }
    }

    /// Every field that isn't skipped must be present in `record`; defaults have to be filled in beforehand, see
    /// `Schema::fill_defaults`. Fields of `record` the schema doesn't know are ignored.
    pub fn write(&self, w: &mut WriteCursor, record: &Record) -> Result<(), EncoderError> {
        for field in self.schema.fields() {
            if matches!(field.codec(), Codec::Skip) {
                continue;
            }
            record
                .get(field.name())
                .ok_or_else(|| EncodeError::MissingValue.by(field.codec().name()))
                .and_then(|value| field.codec().write(w, value))
                .map_err(|e| e.within(Segment::Field(field.name().to_owned())))?;
        }
        Ok(())
    }

    pub(crate) fn write_value(&self, w: &mut WriteCursor, value: &Value) -> Result<(), EncoderError> {
        match value {
            Value::Record(record) => self.write(w, record),
            other => Err(EncodeError::Type { expected: "record", found: other.typename() }.by("Record")),
        }
    }

    pub fn read(&self, r: &mut ReadCursor) -> Result<Record, DecoderError> {
        self.read_fields(r, false)
    }

    /// Like `read`, but if the input ends exactly between two fields, the remaining fields take their default (or
    /// the codec's empty value). This lets a schema that gained fields at its end read payloads written before.
    pub fn read_with_tail_defaults(&self, r: &mut ReadCursor) -> Result<Record, DecoderError> {
        self.read_fields(r, true)
    }

    fn read_fields(&self, r: &mut ReadCursor, tail_defaults: bool) -> Result<Record, DecoderError> {
        let mut record = Record::with_capacity(self.schema.len());
        for field in self.schema.fields() {
            let value = match field.codec() {
                Codec::Skip => field.default_or_zero(),
                _ if tail_defaults && !r.has_more() => field.default_or_zero(),
                codec => codec.read(r).map_err(|e| e.within(Segment::Field(field.name().to_owned())))?,
            };
            record.push(field.name().to_owned(), value);
        }
        Ok(record)
    }

}
