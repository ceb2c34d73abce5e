use crate::cursor::{Fixed, ReadCursor, WriteCursor};
use crate::error::{DecodeError, EncodeError};
use crate::value::Value;

pub(crate) fn write_bool(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    match *value {
        Value::Bool(b) => {
            w.put(u8::from(b));
            Ok(())
        }
        ref other => Err(EncodeError::Type { expected: "bool", found: other.typename() }),
    }
}

/// Any nonzero byte is true.
pub(crate) fn read_bool(r: &mut ReadCursor) -> Result<Value, DecodeError> {
    Ok(Value::Bool(r.get::<u8>()? != 0))
}

/// Accepts both integer variants as long as the number fits `T`.
pub(crate) fn write_int<T>(w: &mut WriteCursor, value: &Value, codec: &'static str) -> Result<(), EncodeError>
where
    T: Fixed + TryFrom<i128> + TryFrom<u128>,
{
    let fitted = match *value {
        Value::Int(i) => T::try_from(i).ok(),
        Value::UInt(u) => T::try_from(u).ok(),
        ref other => return Err(EncodeError::Type { expected: "integer", found: other.typename() }),
    };
    let v = fitted.ok_or_else(|| EncodeError::Range { codec, value: number(value) })?;
    w.put(v);
    Ok(())
}

pub(crate) fn read_int<T: Fixed + Into<i128>>(r: &mut ReadCursor) -> Result<Value, DecodeError> {
    Ok(Value::Int(r.get::<T>()?.into()))
}

pub(crate) fn read_uint<T: Fixed + Into<u128>>(r: &mut ReadCursor) -> Result<Value, DecodeError> {
    Ok(Value::UInt(r.get::<T>()?.into()))
}

pub(crate) fn write_u128(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    let v = match *value {
        Value::UInt(u) => u,
        Value::Int(i) => u128::try_from(i).map_err(|_| EncodeError::Range { codec: "UInt128", value: i.to_string() })?,
        ref other => return Err(EncodeError::Type { expected: "integer", found: other.typename() }),
    };
    w.put((v >> 64) as u64);
    w.put(v as u64);
    Ok(())
}

pub(crate) fn read_u128(r: &mut ReadCursor) -> Result<Value, DecodeError> {
    let hi = r.get::<u64>()?;
    let lo = r.get::<u64>()?;
    Ok(Value::UInt(u128::from(hi) << 64 | u128::from(lo)))
}

pub(crate) fn write_f32(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    match *value {
        Value::F32(v) => {
            w.put(v);
            Ok(())
        }
        ref other => Err(EncodeError::Type { expected: "f32", found: other.typename() }),
    }
}

/// An `f32` is widened, which is exact.
pub(crate) fn write_f64(w: &mut WriteCursor, value: &Value) -> Result<(), EncodeError> {
    match *value {
        Value::F64(v) => w.put(v),
        Value::F32(v) => w.put(f64::from(v)),
        ref other => return Err(EncodeError::Type { expected: "f64", found: other.typename() }),
    }
    Ok(())
}

fn number(value: &Value) -> String {
    match *value {
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        _ => value.typename().to_owned(),
    }
}
