use crate::codec::Codec;
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{DecodeError, DecoderError, EncodeError, EncoderError, Segment};
use crate::value::Value;

const NULL: u8 = 1;
const PRESENT: u8 = 0;

pub(crate) fn write_nullable(inner: &Codec, w: &mut WriteCursor, value: &Value) -> Result<(), EncoderError> {
    if value.is_null() {
        w.put(NULL);
        Ok(())
    } else {
        w.put(PRESENT);
        inner.write(w, value)
    }
}

/// Any nonzero flag means null.
pub(crate) fn read_nullable(inner: &Codec, r: &mut ReadCursor) -> Result<Value, DecoderError> {
    let flag = r.get::<u8>().map_err(|e| e.at("Nullable", r.position()))?;
    if flag == PRESENT {
        inner.read(r)
    } else {
        Ok(Value::Null)
    }
}

pub(crate) fn write_list(inner: &Codec, w: &mut WriteCursor, value: &Value) -> Result<(), EncoderError> {
    let items = match value {
        Value::List(items) => items,
        other => return Err(EncodeError::Type { expected: "list", found: other.typename() }.by("List")),
    };
    w.write_length(items.len()).map_err(|e| e.by("List"))?;
    let start = w.position();
    for (i, item) in items.iter().enumerate() {
        inner.write(w, item).map_err(|e| e.within(Segment::Index(i)))?;
    }
    if !items.is_empty() && w.position() == start {
        return Err(EncodeError::ZeroWidth(items.len()).by("List"));
    }
    Ok(())
}

pub(crate) fn read_list(inner: &Codec, r: &mut ReadCursor) -> Result<Value, DecoderError> {
    let count = r.read_length().map_err(|e| e.at("List", r.position()))?;
    // reject counts that can't possibly be backed by the remaining input before allocating for them. Every element
    // is charged at least one byte, so the work stays bounded by the input even for elements of zero width.
    let needed = count.saturating_mul(inner.min_width().max(1));
    if needed > r.remaining() {
        return Err(DecodeError::Underflow { requested: needed, remaining: r.remaining() }.at("List", r.position()));
    }
    let mut items = Vec::with_capacity(count.min(r.remaining()));
    for i in 0..count {
        items.push(inner.read(r).map_err(|e| e.within(Segment::Index(i)))?);
    }
    Ok(Value::List(items))
}

#[cfg(test)]
mod tests {
    use crate::codec::Codec;
    use crate::cursor::{ReadCursor, WriteCursor};
    use crate::error::{DecodeError, EncodeError, Segment};
    use crate::schema::Schema;
    use crate::value::{Record, Value};

    #[test]
    fn nullable_overhead() {
        let codec = Codec::nullable(Codec::UInt32);
        assert_eq!(&[0x01], &write(&codec, &Value::Null)[..]);
        assert_eq!(&[0x00, 0x2a, 0x00, 0x00, 0x00], &write(&codec, &Value::UInt(42))[..]);
        assert_roundtrip(&codec, Value::Null);
        assert_roundtrip(&codec, Value::UInt(42));
        let codec = Codec::nullable(Codec::String);
        assert_eq!(1 + 1 + 5, write(&codec, &Value::from("admin")).len());
    }

    #[test]
    fn nested_nullable() {
        let codec = Codec::nullable(Codec::nullable(Codec::Bool));
        assert_eq!(&[0x00, 0x00, 0x01], &write(&codec, &Value::Bool(true))[..]);
        // the inner absence can't be told apart from the outer one
        assert_eq!(&[0x01], &write(&codec, &Value::Null)[..]);
    }

    #[test]
    fn list_layout() {
        let codec = Codec::list(Codec::UInt16);
        let bytes = write(&codec, &Value::from(vec![1u16, 2, 3]));
        assert_eq!(&[0x03, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00], &bytes[..]);
        assert_roundtrip(&codec, Value::from(vec![1u16, 2, 3]));
        assert_roundtrip(&codec, Value::List(vec![]));
    }

    #[test]
    fn list_of_nullable() {
        let codec = Codec::list(Codec::nullable(Codec::String));
        assert_roundtrip(&codec, Value::from(vec![Some("red"), None, Some("blue"), None]));
        assert_roundtrip(&codec, Value::from(vec![None::<&str>, None, None]));
    }

    #[test]
    fn list_of_lists() {
        let codec = Codec::list(Codec::list(Codec::Int8));
        let value = Value::List(vec![Value::from(vec![1i8, -1]), Value::List(vec![]), Value::from(vec![127i8])]);
        let bytes = assert_roundtrip(&codec, value);
        assert_eq!(&[0x03, 0x02, 0x01, 0xff, 0x00, 0x01, 0x7f], &bytes[..]);
    }

    #[test]
    fn list_of_records() {
        let role = Schema::builder("Role").field("role_id", Codec::UInt8).field("role_name", Codec::String).build().unwrap();
        let codec = Codec::list(Codec::record(role));
        let roles = vec![
            Record::new().with("role_id", 1u8).with("role_name", "admin"),
            Record::new().with("role_id", 2u8).with("role_name", "editor"),
        ];
        assert_roundtrip(&codec, Value::from(roles));
    }

    #[test]
    fn element_errors_name_their_index() {
        let codec = Codec::list(Codec::UInt8);
        let err = codec.write(&mut WriteCursor::new(), &Value::from(vec![1u16, 2, 300])).unwrap_err();
        assert_eq!(&[Segment::Index(2)], err.path().segments());
        assert!(matches!(err.inner(), EncodeError::Range { .. }));
        let err = codec.write(&mut WriteCursor::new(), &Value::UInt(1)).unwrap_err();
        assert!(matches!(err.inner(), EncodeError::Type { expected: "list", .. }));
    }

    #[test]
    fn impossible_count_fails_early() {
        let buf = [0xff, 0xff, 0xff, 0x0f, 0x00];
        let err = Codec::list(Codec::UInt32).read(&mut ReadCursor::new(&buf)).unwrap_err();
        assert!(matches!(err.inner(), DecodeError::Underflow { .. }));
        assert_eq!("List", err.codec());
    }

    #[test]
    fn zero_width_elements() {
        let codec = Codec::list(Codec::Skip);
        assert_roundtrip(&codec, Value::List(vec![]));
        let err = codec.write(&mut WriteCursor::new(), &Value::List(vec![Value::Null; 3])).unwrap_err();
        assert!(matches!(err.inner(), EncodeError::ZeroWidth(3)));

        let buf = [0xff, 0xff, 0xff, 0xff, 0x0f];
        let err = codec.read(&mut ReadCursor::new(&buf)).unwrap_err();
        assert!(matches!(err.inner(), DecodeError::Underflow { requested: 0xffff_ffff, remaining: 0 }));
        let empty = Schema::builder("Empty").build().unwrap();
        assert!(Codec::list(Codec::record(empty)).read(&mut ReadCursor::new(&[0x02, 0x00])).is_err());
    }

    #[test]
    fn truncated_element() {
        let buf = [0x02, 0x01, 0x00, 0x02];
        let err = Codec::list(Codec::UInt16).read(&mut ReadCursor::new(&buf)).unwrap_err();
        assert!(matches!(err.inner(), DecodeError::Underflow { .. }));
    }

    fn write(codec: &Codec, value: &Value) -> Vec<u8> {
        let mut w = WriteCursor::new();
        codec.write(&mut w, value).unwrap();
        w.into_inner()
    }

    fn assert_roundtrip(codec: &Codec, value: Value) -> Vec<u8> {
        let bytes = write(codec, &value);
        let mut r = ReadCursor::new(&bytes);
        assert_eq!(value, codec.read(&mut r).unwrap());
        assert!(!r.has_more());
        bytes
    }
}
