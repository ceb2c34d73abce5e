//! Conveniently pack and unpack your Rust data structures with `zeile`.
//!
//! # Two-step serialization
//!
//! `zeile` is not self-describing, so serde alone can't produce its wire format: the serializer sees a struct's
//! fields but not which codec each of them wants. Instead, `to_value` first turns the data structure into a schema
//! agnostic `Value`, then `conform` brings that value into the shape the schema's codecs accept. This mainly concerns
//! dates and timestamps, which serde hands over as ISO 8601 strings, and `StringJson` fields, which accept any
//! structure and pack it as a JSON document.
//!
//! Structs are matched against the schema by field name. The order of the fields in the struct does not matter; the
//! order in the schema is what ends up on the wire.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use zeile::{Codec, Schema};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Role {
//!     role_id: u8,
//!     role_name: String,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     user_id: u32,
//!     roles: Vec<Role>,
//!     nickname: Option<String>,
//! }
//!
//! let role = Schema::builder("Role")
//!     .field("role_id", Codec::UInt8)
//!     .field("role_name", Codec::String)
//!     .build()
//!     .unwrap();
//! let user = Schema::builder("User")
//!     .field("user_id", Codec::UInt32)
//!     .field("roles", Codec::list(Codec::record(role)))
//!     .field("nickname", Codec::nullable(Codec::String))
//!     .build()
//!     .unwrap();
//!
//! let msg = User {
//!     user_id: 7,
//!     roles: vec![Role { role_id: 1, role_name: "admin".to_owned() }],
//!     nickname: None,
//! };
//! let bytes = zeile_serde::to_bytes(&user, &msg).unwrap();
//! assert_eq!(bytes, [
//!     0x07, 0x00, 0x00, 0x00,             // user_id
//!     0x01,                               // List of length 1
//!       0x01,                             // role_id
//!       0x05,                             // String of length 5
//!         0x61, 0x64, 0x6d, 0x69, 0x6e,   // 'admin'
//!     0x01,                               // nickname is null
//! ]);
//!
//! let deserialized: User = zeile_serde::from_bytes(&user, &bytes).unwrap();
//! assert_eq!(msg, deserialized);
//! ```
//!
//! For comparison, `serde_json` produces a string of 73 bytes for the same message, while `zeile` needs 13.

mod de;
mod error;
mod ser;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeile::{Codec, Envelope, Record, Schema, Value};

pub use de::{from_value, Deserializer};
pub use error::{Error, Result};
pub use ser::{to_value, Serializer};

pub fn to_bytes<T: ?Sized + Serialize>(schema: &Schema, value: &T) -> Result<Vec<u8>> {
    to_bytes_with(&Envelope::new(schema), value)
}

/// Like `to_bytes`, with the transform and options of `envelope`.
pub fn to_bytes_with<T: ?Sized + Serialize>(envelope: &Envelope, value: &T) -> Result<Vec<u8>> {
    let record = conform(envelope.schema(), to_value(value)?)?;
    Ok(envelope.serialize(&record)?)
}

pub fn from_bytes<T: DeserializeOwned>(schema: &Schema, bytes: &[u8]) -> Result<T> {
    from_bytes_with(&Envelope::new(schema), bytes)
}

pub fn from_bytes_with<T: DeserializeOwned>(envelope: &Envelope, bytes: &[u8]) -> Result<T> {
    from_value(Value::Record(envelope.deserialize(bytes)?))
}

/// Coerces a schema agnostic value into what the codecs of `schema` accept, recursing through nullable, list and
/// record codecs. Fields the schema doesn't know are dropped, fields it declares but `value` lacks stay missing so
/// their defaults can apply.
pub fn conform(schema: &Schema, value: Value) -> Result<Record> {
    match value {
        Value::Record(record) => conform_record(schema, record),
        other => Err(Error::NotARecord(other.typename())),
    }
}

fn conform_record(schema: &Schema, mut record: Record) -> Result<Record> {
    let mut out = Record::with_capacity(schema.len());
    for field in schema.fields() {
        if let Some(value) = record.remove(field.name()) {
            out.insert(field.name(), conform_value(field.name(), field.codec(), value)?);
        }
    }
    Ok(out)
}

fn conform_value(field: &str, codec: &Codec, value: Value) -> Result<Value> {
    let parse = |expected, value| Error::Parse { field: field.to_owned(), expected, value };
    Ok(match (codec, value) {
        (Codec::StringJson, value) => Value::Json(to_json(value)?),
        (_, Value::Null) => Value::Null,
        (Codec::Nullable(inner), value) => conform_value(field, inner, value)?,
        (Codec::List(inner), Value::List(items)) => {
            Value::List(items.into_iter().map(|v| conform_value(field, inner, v)).collect::<Result<_>>()?)
        }
        (Codec::Record(schema), Value::Record(record)) => Value::Record(conform_record(schema, record)?),
        // precision is given up silently, magnitude is not
        (Codec::Float32, Value::F64(v)) if v.is_finite() && (v as f32).is_infinite() => {
            return Err(parse("float32", v.to_string()))
        }
        (Codec::Float32, Value::F64(v)) => Value::F32(v as f32),
        (Codec::Date, Value::Str(s)) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            Ok(date) => Value::Date(date),
            Err(_) => return Err(parse("date", s)),
        },
        (Codec::DateTime32 | Codec::DateTime64(_), Value::Str(s)) => match DateTime::parse_from_rfc3339(&s) {
            Ok(dt) => Value::DateTime(dt.with_timezone(&Utc)),
            Err(_) => return Err(parse("timestamp", s)),
        },
        (Codec::DateTime32Tz | Codec::DateTime64Tz(_), Value::Str(s)) => match DateTime::parse_from_rfc3339(&s) {
            Ok(dt) => Value::DateTimeTz(dt),
            Err(_) => return Err(parse("timestamp", s)),
        },
        (_, value) => value,
    })
}

fn to_json(value: Value) -> Result<serde_json::Value> {
    use serde_json::Value as Json;
    let out_of_range = |v: String| Error::Message(format!("{} does not fit into a json number", v));
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(v) => Json::Bool(v),
        Value::Int(v) => i64::try_from(v).map(Json::from).map_err(|_| out_of_range(v.to_string()))?,
        Value::UInt(v) => u64::try_from(v).map(Json::from).map_err(|_| out_of_range(v.to_string()))?,
        Value::F32(v) => Json::from(f64::from(v)),
        Value::F64(v) => Json::from(v),
        Value::Str(v) => Json::String(v),
        Value::Json(v) => v,
        Value::Date(v) => Json::String(v.to_string()),
        Value::DateTime(v) => Json::String(v.to_rfc3339()),
        Value::DateTimeTz(v) => Json::String(v.to_rfc3339()),
        Value::List(items) => Json::Array(items.into_iter().map(to_json).collect::<Result<_>>()?),
        Value::Record(record) => Json::Object(record.into_iter().map(|(k, v)| -> Result<(String, Json)> { Ok((k, to_json(v)?)) }).collect::<Result<_>>()?),
    })
}
