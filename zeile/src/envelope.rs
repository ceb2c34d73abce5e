//! Top-level entry points. An `Envelope` packs one record (or a run of records) of a single schema into a fresh
//! buffer, optionally passing the bytes through a `Transform`, and unpacks them again.

use tracing::debug;

use crate::cursor::{Limits, ReadCursor, WriteCursor};
use crate::error::Error;
use crate::record::RecordCodec;
use crate::schema::Schema;
use crate::transform::{Identity, Transform};
use crate::value::Record;

/// What to do with input left over after a single record has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trailing {
    #[default]
    Reject,
    Ignore,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub limits: Limits,
    pub trailing: Trailing,
    /// Fill fields missing at the very end of the input with their defaults instead of failing. Allows a schema
    /// that was extended at its end to read payloads of its earlier version.
    pub tail_defaults: bool,
}

pub struct Envelope<'a> {
    schema: &'a Schema,
    transform: &'a dyn Transform,
    options: Options,
}

impl<'a> Envelope<'a> {

    pub fn new(schema: &'a Schema) -> Self {
        Envelope { schema, transform: &Identity, options: Options::default() }
    }

    pub fn transform(mut self, transform: &'a dyn Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Missing fields that declare a default are filled in before packing.
    pub fn serialize(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let mut w = WriteCursor::with_limits(self.options.limits);
        self.write_record(&mut w, record)?;
        self.finish(w, 1)
    }

    /// Packs all records back to back, without any separator or count.
    pub fn serialize_all(&self, records: &[Record]) -> Result<Vec<u8>, Error> {
        let mut w = WriteCursor::with_limits(self.options.limits);
        for record in records {
            self.write_record(&mut w, record)?;
        }
        self.finish(w, records.len())
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Record, Error> {
        let payload = self.transform.decode(bytes).map_err(|e| {
            debug!(schema = self.schema.name(), error = %e, "transform failed");
            Error::Transform(e)
        })?;
        let mut r = ReadCursor::with_limits(&payload, self.options.limits);
        let record = self.read_record(&mut r)?;
        if r.has_more() && self.options.trailing == Trailing::Reject {
            debug!(schema = self.schema.name(), at = r.position(), remaining = r.remaining(), "trailing bytes");
            return Err(Error::Trailing { at: r.position(), remaining: r.remaining() });
        }
        debug!(schema = self.schema.name(), bytes = bytes.len(), payload = payload.len(), "record deserialized");
        Ok(record)
    }

    /// Reads records until the input is exhausted. Empty input yields no records.
    pub fn deserialize_all(&self, bytes: &[u8]) -> Result<Vec<Record>, Error> {
        let payload = self.transform.decode(bytes).map_err(|e| {
            debug!(schema = self.schema.name(), error = %e, "transform failed");
            Error::Transform(e)
        })?;
        let mut r = ReadCursor::with_limits(&payload, self.options.limits);
        let mut records = Vec::new();
        while r.has_more() {
            let at = r.position();
            records.push(self.read_record(&mut r)?);
            // a record of zero width would never exhaust the input
            if r.position() == at {
                debug!(schema = self.schema.name(), at, remaining = r.remaining(), "record consumed no input");
                return Err(Error::Trailing { at, remaining: r.remaining() });
            }
        }
        debug!(schema = self.schema.name(), bytes = bytes.len(), records = records.len(), "records deserialized");
        Ok(records)
    }

    fn write_record(&self, w: &mut WriteCursor, record: &Record) -> Result<(), Error> {
        let record = self.schema.fill_defaults(record);
        RecordCodec::new(self.schema).write(w, &record).map_err(|e| {
            debug!(schema = self.schema.name(), error = %e, "serialization failed");
            Error::Encode(e)
        })
    }

    fn read_record(&self, r: &mut ReadCursor) -> Result<Record, Error> {
        let codec = RecordCodec::new(self.schema);
        let record = if self.options.tail_defaults {
            codec.read_with_tail_defaults(r)
        } else {
            codec.read(r)
        };
        record.map_err(|e| {
            debug!(schema = self.schema.name(), error = %e, "deserialization failed");
            Error::Decode(e)
        })
    }

    fn finish(&self, w: WriteCursor, records: usize) -> Result<Vec<u8>, Error> {
        let packed = w.into_inner();
        let len = packed.len();
        let out = self.transform.encode(packed).map_err(|e| {
            debug!(schema = self.schema.name(), error = %e, "transform failed");
            Error::Transform(e)
        })?;
        debug!(schema = self.schema.name(), records, packed = len, bytes = out.len(), "serialized");
        Ok(out)
    }

}

#[cfg(test)]
mod tests {
    use super::{Envelope, Options, Trailing};
    use crate::codec::Codec;
    use crate::cursor::Limits;
    use crate::error::{DecodeError, EncodeError, Error};
    use crate::schema::Schema;
    use crate::value::{Record, Value};

    fn user() -> Schema {
        Schema::builder("User")
            .field("id", Codec::UInt32)
            .field("name", Codec::String)
            .field_with_default("active", Codec::Bool, true)
            .build()
            .unwrap()
    }

    #[test]
    fn defaults_are_filled_in() {
        let schema = user();
        let envelope = Envelope::new(&schema);
        let bytes = envelope.serialize(&Record::new().with("id", 1u32).with("name", "a")).unwrap();
        assert_eq!(&[0x01, 0x00, 0x00, 0x00, 0x01, b'a', 0x01], &bytes[..]);
        assert_eq!(Some(&Value::Bool(true)), envelope.deserialize(&bytes).unwrap().get("active"));
    }

    #[test]
    fn trailing_bytes() {
        let schema = user();
        let mut bytes = Envelope::new(&schema).serialize(&Record::new().with("id", 1u32).with("name", "a")).unwrap();
        bytes.extend_from_slice(&[0xde, 0xad]);
        match Envelope::new(&schema).deserialize(&bytes) {
            Err(Error::Trailing { at: 7, remaining: 2 }) => (),
            other => panic!("unexpected {:?}", other),
        }
        let lenient = Envelope::new(&schema).options(Options { trailing: Trailing::Ignore, ..Options::default() });
        assert!(lenient.deserialize(&bytes).is_ok());
    }

    #[test]
    fn runs_of_records() {
        let schema = user();
        let envelope = Envelope::new(&schema);
        let records: Vec<Record> = (0..3u32)
            .map(|i| Record::new().with("id", i).with("name", format!("user{}", i)).with("active", i % 2 == 0))
            .collect();
        let bytes = envelope.serialize_all(&records).unwrap();
        assert_eq!(3 * (4 + 1 + 5 + 1), bytes.len());
        assert_eq!(records, envelope.deserialize_all(&bytes).unwrap());
        assert!(envelope.deserialize_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn zero_width_runs_stop() {
        let schema = Schema::builder("Empty").field("s", Codec::Skip).build().unwrap();
        let envelope = Envelope::new(&schema);
        assert!(envelope.deserialize_all(&[]).unwrap().is_empty());
        match envelope.deserialize_all(&[0x00]) {
            Err(Error::Trailing { at: 0, remaining: 1 }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn nested_defaults_are_filled_in() {
        let inner = Schema::builder("Inner").field("a", Codec::UInt8).field_with_default("b", Codec::UInt8, 5u8).build().unwrap();
        let schema = Schema::builder("Outer")
            .field("x", Codec::UInt8)
            .field_with_default("y", Codec::UInt8, 6u8)
            .field("inner", Codec::record(inner.clone()))
            .field("list", Codec::list(Codec::record(inner)))
            .build()
            .unwrap();
        let record = Record::new()
            .with("x", 1u8)
            .with("inner", Record::new().with("a", 2u8))
            .with("list", vec![Record::new().with("a", 3u8)]);
        let bytes = Envelope::new(&schema).serialize(&record).unwrap();
        assert_eq!(&[0x01, 0x06, 0x02, 0x05, 0x01, 0x03, 0x05], &bytes[..]);
    }

    #[test]
    fn limits_apply_on_both_sides() {
        let schema = user();
        let strict = Envelope::new(&schema).options(Options { limits: Limits { max_length: 3 }, ..Options::default() });
        let record = Record::new().with("id", 1u32).with("name", "admin");
        match strict.serialize(&record) {
            Err(Error::Encode(e)) => assert!(matches!(e.inner(), EncodeError::Length(5, 3))),
            other => panic!("unexpected {:?}", other),
        }
        let bytes = Envelope::new(&schema).serialize(&record).unwrap();
        match strict.deserialize(&bytes) {
            Err(Error::Decode(e)) => assert!(matches!(e.inner(), DecodeError::Length(5, 3))),
            other => panic!("unexpected {:?}", other),
        }
    }
}
