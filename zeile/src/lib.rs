//! `zeile` packs structured records into a compact binary row. The wire format carries no tags, no field names and no
//! type information: a `Schema` fixes the order and the codec of every field once, and both sides of the wire walk the
//! same schema. Scalars are little-endian, string lengths and list counts are LEB128 varints.
//!
//! Because nothing on the wire is self-describing, a payload can only be read with the schema it was written with.
//! Adding fields at the end of a schema stays readable for old payloads if `Options::tail_defaults` is set; any other
//! change to a schema changes the format.
//!
//! # A note on integers
//!
//! `Value` stores integers as `i128` or `u128`, wide enough for every integer codec. The codecs accept either variant
//! as long as the number fits their range, so `Value::Int(5)` can be written by a `UInt8` codec and `Value::UInt(5)`
//! by an `Int8` codec. Unsigned integers are always read back as `Value::UInt`, signed ones as `Value::Int`.
//!
//! # Examples
//!
//! ```
//! use zeile::*;
//!
//! let schema = Schema::builder("User")
//!     .field("id", Codec::UInt32)
//!     .field("name", Codec::String)
//!     .field("active", Codec::Bool)
//!     .build()
//!     .unwrap();
//! let record = Record::new().with("id", 123u32).with("name", "admin").with("active", true);
//! let buf = serialize(&schema, &record).unwrap();
//! assert_eq!(buf, [
//!     0x7b, // 123
//!     0x00,
//!     0x00,
//!     0x00,
//!     0x05, // String of length 5
//!     0x61, // 'a'
//!     0x64, // 'd'
//!     0x6d, // 'm'
//!     0x69, // 'i'
//!     0x6e, // 'n'
//!     0x01, // true
//! ]);
//! let decoded = deserialize(&schema, &buf).unwrap();
//! assert_eq!(Some(&Value::UInt(123)), decoded.get("id"));
//! assert_eq!(record.get("name"), decoded.get("name"));
//! ```

mod codec;
mod composite;
mod cursor;
mod envelope;
mod error;
mod record;
mod scalar;
mod schema;
mod text;
mod time;
mod value;
pub mod transform;
pub mod varint;

pub use codec::*;
pub use cursor::*;
pub use envelope::*;
pub use error::*;
pub use record::*;
pub use schema::*;
pub use text::TextEncoding;
pub use time::Precision;
pub use value::*;

/// Packs a single record with default options and no transform.
pub fn serialize(schema: &Schema, record: &Record) -> Result<Vec<u8>, Error> {
    Envelope::new(schema).serialize(record)
}

/// Unpacks a single record with default options and no transform. The whole input has to be consumed.
pub fn deserialize(schema: &Schema, bytes: &[u8]) -> Result<Record, Error> {
    Envelope::new(schema).deserialize(bytes)
}
