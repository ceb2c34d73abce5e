//! A `Codec` converts between one `Value` and its bytes. Codecs are picked per field when a schema is defined and
//! never inspect a value to decide how to encode it: the bytes a codec writes are exactly the bytes it reads back.
//!
//! The built-in codecs are the variants of the closed `Codec` enum. Anything else can be plugged in through the
//! `FieldCodec` trait and `Codec::custom`.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Offset, Utc};

use crate::composite;
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{DecodeError, DecoderError, EncodeError, EncoderError, SchemaError};
use crate::record::RecordCodec;
use crate::scalar;
use crate::schema::Schema;
use crate::text::{self, TextEncoding};
use crate::time::{self, Precision};
use crate::value::Value;

/// User-supplied codec. Implementations must be stateless: the same value always yields the same bytes and `read`
/// consumes exactly what `write` produced.
pub trait FieldCodec: Debug + Send + Sync {
    /// Shows up in error messages.
    fn name(&self) -> &'static str;

    fn write(&self, cursor: &mut WriteCursor, value: &Value) -> Result<(), EncodeError>;

    fn read(&self, cursor: &mut ReadCursor) -> Result<Value, DecodeError>;

    fn min_width(&self) -> usize {
        0
    }

    fn zero(&self) -> Value {
        Value::Null
    }
}

#[derive(Debug, Clone)]
pub enum Codec {
    /// Occupies no bytes at all. The field keeps its place in the record but is dropped from the wire.
    Skip,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    /// High half first, then low half, each as a little-endian `u64`
    UInt128,
    Float32,
    Float64,
    /// Varint byte length followed by UTF-8
    String,
    /// Exactly `length` bytes of text in `encoding`, zero-padded
    FixedString { length: usize, encoding: TextEncoding },
    /// Varint byte length followed by a JSON document
    StringJson,
    /// Days since 1970-01-01 as `u16`
    Date,
    /// Seconds since the epoch as `u32`
    DateTime32,
    /// Ticks of `10^-precision` seconds since the epoch as `u64`
    DateTime64(Precision),
    /// `DateTime32` followed by the utc offset in minutes as `i16`
    DateTime32Tz,
    /// `DateTime64` followed by the utc offset in minutes as `i16`
    DateTime64Tz(Precision),
    /// Flag byte (1 = null, 0 = present) followed by the inner value if present
    Nullable(Box<Codec>),
    /// Varint element count followed by the elements
    List(Box<Codec>),
    /// The fields of another schema, without any length prefix
    Record(Arc<Schema>),
    Custom(Arc<dyn FieldCodec>),
}

impl Codec {

    pub fn fixed_string(length: usize, encoding: TextEncoding) -> Codec {
        Codec::FixedString { length, encoding }
    }

    pub fn datetime64(precision: u8) -> Result<Codec, SchemaError> {
        Ok(Codec::DateTime64(Precision::new(precision)?))
    }

    pub fn datetime64_tz(precision: u8) -> Result<Codec, SchemaError> {
        Ok(Codec::DateTime64Tz(Precision::new(precision)?))
    }

    pub fn nullable(inner: Codec) -> Codec {
        Codec::Nullable(Box::new(inner))
    }

    pub fn list(inner: Codec) -> Codec {
        Codec::List(Box::new(inner))
    }

    pub fn record(schema: impl Into<Arc<Schema>>) -> Codec {
        Codec::Record(schema.into())
    }

    pub fn custom<C: FieldCodec + 'static>(codec: C) -> Codec {
        Codec::Custom(Arc::new(codec))
    }

    /// Returns the mnemonic of the codec. This is useful for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Skip             => "Skip",
            Codec::Bool             => "Bool",
            Codec::Int8             => "Int8",
            Codec::Int16            => "Int16",
            Codec::Int32            => "Int32",
            Codec::Int64            => "Int64",
            Codec::UInt8            => "UInt8",
            Codec::UInt16           => "UInt16",
            Codec::UInt32           => "UInt32",
            Codec::UInt64           => "UInt64",
            Codec::UInt128          => "UInt128",
            Codec::Float32          => "Float32",
            Codec::Float64          => "Float64",
            Codec::String           => "String",
            Codec::FixedString {..} => "FixedString",
            Codec::StringJson       => "StringJson",
            Codec::Date             => "Date",
            Codec::DateTime32       => "DateTime32",
            Codec::DateTime64(_)    => "DateTime64",
            Codec::DateTime32Tz     => "DateTime32TZ",
            Codec::DateTime64Tz(_)  => "DateTime64TZ",
            Codec::Nullable(_)      => "Nullable",
            Codec::List(_)          => "List",
            Codec::Record(_)        => "Record",
            Codec::Custom(c)        => c.name(),
        }
    }

    /// The smallest number of bytes any value of this codec occupies.
    pub fn min_width(&self) -> usize {
        match self {
            Codec::Skip                               => 0,
            Codec::Bool | Codec::Int8 | Codec::UInt8  => 1,
            Codec::Int16 | Codec::UInt16 | Codec::Date => 2,
            Codec::Int32 | Codec::UInt32 | Codec::Float32 | Codec::DateTime32 => 4,
            Codec::Int64 | Codec::UInt64 | Codec::Float64 | Codec::DateTime64(_) => 8,
            Codec::UInt128                            => 16,
            Codec::DateTime32Tz                       => 6,
            Codec::DateTime64Tz(_)                    => 10,
            Codec::FixedString { length, .. }         => *length,
            Codec::String | Codec::StringJson        => 1,
            Codec::Nullable(_) | Codec::List(_)       => 1,
            Codec::Record(schema)                     => schema.fields().iter().map(|f| f.codec().min_width()).sum(),
            Codec::Custom(c)                          => c.min_width(),
        }
    }

    /// The empty value of this codec: zero, the empty string, the epoch and so on. Used for skipped fields and for
    /// fields missing at the end of the input when no default is declared.
    pub fn zero(&self) -> Value {
        match self {
            Codec::Skip | Codec::Nullable(_) => Value::Null,
            Codec::Bool => Value::Bool(false),
            Codec::Int8 | Codec::Int16 | Codec::Int32 | Codec::Int64 => Value::Int(0),
            Codec::UInt8 | Codec::UInt16 | Codec::UInt32 | Codec::UInt64 | Codec::UInt128 => Value::UInt(0),
            Codec::Float32 => Value::F32(0.0),
            Codec::Float64 => Value::F64(0.0),
            Codec::String | Codec::FixedString { .. } => Value::Str(String::new()),
            Codec::StringJson => Value::Json(serde_json::Value::Object(serde_json::Map::new())),
            // both defaults are 1970-01-01
            Codec::Date => Value::Date(NaiveDate::default()),
            Codec::DateTime32 | Codec::DateTime64(_) => Value::DateTime(DateTime::<Utc>::default()),
            Codec::DateTime32Tz | Codec::DateTime64Tz(_) => Value::DateTimeTz(DateTime::<Utc>::default().with_timezone(&Utc.fix())),
            Codec::List(_) => Value::List(Vec::new()),
            Codec::Record(schema) => Value::Record(schema.zero()),
            Codec::Custom(c) => c.zero(),
        }
    }

    pub fn write(&self, w: &mut WriteCursor, value: &Value) -> Result<(), EncoderError> {
        let leaf = match self {
            Codec::Nullable(inner)       => return composite::write_nullable(inner, w, value),
            Codec::List(inner)           => return composite::write_list(inner, w, value),
            Codec::Record(schema)        => return RecordCodec::new(schema).write_value(w, value),
            Codec::Skip                  => Ok(()),
            Codec::Bool                  => scalar::write_bool(w, value),
            Codec::Int8                  => scalar::write_int::<i8>(w, value, "Int8"),
            Codec::Int16                 => scalar::write_int::<i16>(w, value, "Int16"),
            Codec::Int32                 => scalar::write_int::<i32>(w, value, "Int32"),
            Codec::Int64                 => scalar::write_int::<i64>(w, value, "Int64"),
            Codec::UInt8                 => scalar::write_int::<u8>(w, value, "UInt8"),
            Codec::UInt16                => scalar::write_int::<u16>(w, value, "UInt16"),
            Codec::UInt32                => scalar::write_int::<u32>(w, value, "UInt32"),
            Codec::UInt64                => scalar::write_int::<u64>(w, value, "UInt64"),
            Codec::UInt128               => scalar::write_u128(w, value),
            Codec::Float32               => scalar::write_f32(w, value),
            Codec::Float64               => scalar::write_f64(w, value),
            Codec::String                => text::write_string(w, value),
            Codec::FixedString { length, encoding } => text::write_fixed(w, value, *length, *encoding),
            Codec::StringJson            => text::write_json(w, value),
            Codec::Date                  => time::write_date(w, value),
            Codec::DateTime32            => time::write_datetime32(w, value),
            Codec::DateTime64(p)         => time::write_datetime64(w, value, *p),
            Codec::DateTime32Tz          => time::write_datetime32(w, value).and_then(|_| time::write_offset(w, value)),
            Codec::DateTime64Tz(p)       => time::write_datetime64(w, value, *p).and_then(|_| time::write_offset(w, value)),
            Codec::Custom(c)             => c.write(w, value),
        };
        leaf.map_err(|e| e.by(self.name()))
    }

    pub fn read(&self, r: &mut ReadCursor) -> Result<Value, DecoderError> {
        let leaf = match self {
            Codec::Nullable(inner)       => return composite::read_nullable(inner, r),
            Codec::List(inner)           => return composite::read_list(inner, r),
            Codec::Record(schema)        => return RecordCodec::new(schema).read(r).map(Value::Record),
            Codec::Skip                  => Ok(Value::Null),
            Codec::Bool                  => scalar::read_bool(r),
            Codec::Int8                  => scalar::read_int::<i8>(r),
            Codec::Int16                 => scalar::read_int::<i16>(r),
            Codec::Int32                 => scalar::read_int::<i32>(r),
            Codec::Int64                 => scalar::read_int::<i64>(r),
            Codec::UInt8                 => scalar::read_uint::<u8>(r),
            Codec::UInt16                => scalar::read_uint::<u16>(r),
            Codec::UInt32                => scalar::read_uint::<u32>(r),
            Codec::UInt64                => scalar::read_uint::<u64>(r),
            Codec::UInt128               => scalar::read_u128(r),
            Codec::Float32               => r.get::<f32>().map(Value::F32),
            Codec::Float64               => r.get::<f64>().map(Value::F64),
            Codec::String                => text::read_string(r),
            Codec::FixedString { length, encoding } => text::read_fixed(r, *length, *encoding),
            Codec::StringJson            => text::read_json(r),
            Codec::Date                  => time::read_date(r),
            Codec::DateTime32            => time::read_datetime32(r).map(Value::DateTime),
            Codec::DateTime64(p)         => time::read_datetime64(r, *p).map(Value::DateTime),
            Codec::DateTime32Tz          => time::read_datetime32(r).and_then(|utc| time::read_offset(r, utc)),
            Codec::DateTime64Tz(p)       => time::read_datetime64(r, *p).and_then(|utc| time::read_offset(r, utc)),
            Codec::Custom(c)             => c.read(r),
        };
        leaf.map_err(|e| e.at(self.name(), r.position()))
    }

}

#[cfg(test)]
mod tests {
    use super::{Codec, FieldCodec};
    use crate::cursor::{ReadCursor, WriteCursor};
    use crate::error::{DecodeError, EncodeError};
    use crate::schema::Schema;
    use crate::value::Value;

    /// Dotted quad stored as four raw bytes.
    #[derive(Debug)]
    struct Ipv4;

    impl FieldCodec for Ipv4 {
        fn name(&self) -> &'static str {
            "Ipv4"
        }

        fn write(&self, cursor: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
            let addr = value.as_str().ok_or(EncodeError::Type { expected: "string", found: value.typename() })?;
            let addr: std::net::Ipv4Addr = addr.parse().map_err(|e| EncodeError::Custom(format!("{}", e)))?;
            cursor.write_bytes(&addr.octets());
            Ok(())
        }

        fn read(&self, cursor: &mut ReadCursor) -> Result<Value, DecodeError> {
            let b = cursor.read_bytes(4)?;
            Ok(Value::Str(std::net::Ipv4Addr::new(b[0], b[1], b[2], b[3]).to_string()))
        }

        fn min_width(&self) -> usize {
            4
        }
    }

    #[test]
    fn custom_codec() {
        let codec = Codec::custom(Ipv4);
        let mut w = WriteCursor::new();
        codec.write(&mut w, &Value::from("192.168.0.1")).unwrap();
        assert_eq!(&[192, 168, 0, 1], w.as_slice());
        let buf = w.into_inner();
        assert_eq!(Value::from("192.168.0.1"), codec.read(&mut ReadCursor::new(&buf)).unwrap());

        let err = codec.write(&mut WriteCursor::new(), &Value::from("localhost")).unwrap_err();
        assert_eq!("Ipv4", err.codec());
        assert!(matches!(err.inner(), EncodeError::Custom(_)));
    }

    #[test]
    fn widths() {
        let inner = Schema::builder("Inner").field("a", Codec::UInt8).field("b", Codec::Int64).build().unwrap();
        assert_eq!(9, Codec::record(inner).min_width());
        assert_eq!(10, Codec::datetime64_tz(6).unwrap().min_width());
        assert_eq!(0, Codec::Skip.min_width());
        assert_eq!(4, Codec::custom(Ipv4).min_width());
    }

    #[test]
    fn precision_is_validated() {
        assert!(Codec::datetime64(9).is_ok());
        assert!(Codec::datetime64(10).is_err());
    }

    #[test]
    fn decode_errors_carry_position() {
        let buf = [0x01, 0x02, 0x03];
        let mut r = ReadCursor::new(&buf);
        r.read_bytes(1).unwrap();
        let err = Codec::UInt32.read(&mut r).unwrap_err();
        assert_eq!("UInt32", err.codec());
        assert_eq!(1, err.position());
        assert!(matches!(err.inner(), DecodeError::Underflow { requested: 4, remaining: 2 }));
    }
}
