//! Cursors are created fresh for every call and never shared. A `WriteCursor` owns the growing output, a `ReadCursor`
//! borrows the input and keeps track of how much of it has been consumed. All fixed-width scalars are little-endian.

use crate::error::{DecodeError, EncodeError};
use crate::varint;

/// A scalar with a fixed width on the wire.
pub trait Fixed: Copy + sealed::Sealed {
    const WIDTH: usize;

    fn put_le(self, out: &mut Vec<u8>);

    /// `bytes` is exactly `WIDTH` long.
    fn from_le(bytes: &[u8]) -> Self;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! fixed {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl Fixed for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();

                #[inline]
                fn put_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn from_le(bytes: &[u8]) -> Self {
                    let mut tmp = [0u8; std::mem::size_of::<$t>()];
                    tmp.copy_from_slice(bytes);
                    <$t>::from_le_bytes(tmp)
                }
            }
        )*
    };
}

fixed!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

/// Upper bounds enforced on both sides of the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum byte length of a string and maximum element count of a list.
    pub max_length: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { max_length: u64::from(u32::MAX) }
    }
}

#[derive(Debug, Default)]
pub struct WriteCursor {
    buf: Vec<u8>,
    limits: Limits,
}

impl WriteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        WriteCursor { buf: Vec::new(), limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    #[inline]
    pub fn put<T: Fixed>(&mut self, value: T) {
        value.put_le(&mut self.buf);
    }

    #[inline]
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Returns the number of written bytes.
    pub fn write_varint(&mut self, value: u64) -> usize {
        varint::encode(value, &mut self.buf)
    }

    /// Writes a length or count prefix after checking it against the configured maximum.
    pub fn write_length(&mut self, len: usize) -> Result<(), EncodeError> {
        let len = u64::try_from(len).map_err(|_| EncodeError::Length(u64::MAX, self.limits.max_length))?;
        if len > self.limits.max_length {
            return Err(EncodeError::Length(len, self.limits.max_length));
        }
        self.write_varint(len);
        Ok(())
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    limits: Limits,
}

impl<'a> ReadCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_limits(buf, Limits::default())
    }

    pub fn with_limits(buf: &'a [u8], limits: Limits) -> Self {
        ReadCursor { buf, pos: 0, limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    #[inline]
    pub fn get<T: Fixed>(&mut self) -> Result<T, DecodeError> {
        self.read_bytes(T::WIDTH).map(T::from_le)
    }

    /// Consumes the next `len` bytes. Fails without advancing if fewer remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            Err(DecodeError::Underflow { requested: len, remaining: self.remaining() })
        } else {
            self.pos += len;
            Ok(&self.buf[self.pos - len..self.pos])
        }
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let (value, c) = varint::decode(&self.buf[self.pos..])?;
        self.pos += c;
        Ok(value)
    }

    /// Reads a length or count prefix and checks it against the configured maximum.
    pub fn read_length(&mut self) -> Result<usize, DecodeError> {
        let len = self.read_varint()?;
        if len > self.limits.max_length {
            return Err(DecodeError::Length(len, self.limits.max_length));
        }
        usize::try_from(len).map_err(|_| DecodeError::Length(len, usize::MAX as u64))
    }

    pub fn has_more(&self) -> bool {
        self.pos < self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian() {
        let mut w = WriteCursor::new();
        w.put(0x0102u16);
        w.put(-2i32);
        w.put(1.0f32);
        assert_eq!(&[0x02, 0x01, 0xfe, 0xff, 0xff, 0xff, 0x00, 0x00, 0x80, 0x3f], w.as_slice());
        let buf = w.into_inner();
        let mut r = ReadCursor::new(&buf);
        assert_eq!(0x0102u16, r.get::<u16>().unwrap());
        assert_eq!(-2i32, r.get::<i32>().unwrap());
        assert_eq!(1.0f32, r.get::<f32>().unwrap());
        assert!(!r.has_more());
    }

    #[test]
    fn underflow_does_not_advance() {
        let buf = [1, 2, 3];
        let mut r = ReadCursor::new(&buf);
        assert_eq!(&[1], r.read_bytes(1).unwrap());
        assert!(matches!(r.get::<u32>(), Err(DecodeError::Underflow { requested: 4, remaining: 2 })));
        assert_eq!(1, r.position());
        assert_eq!(&[2, 3], r.read_bytes(2).unwrap());
        assert!(matches!(r.read_bytes(1), Err(DecodeError::Underflow { requested: 1, remaining: 0 })));
        assert_eq!(&[] as &[u8], r.read_bytes(0).unwrap());
    }

    #[test]
    fn length_limits() {
        let limits = Limits { max_length: 3 };
        let mut w = WriteCursor::with_limits(limits);
        w.write_length(3).unwrap();
        assert!(matches!(w.write_length(4), Err(EncodeError::Length(4, 3))));
        let buf = [0x04];
        let mut r = ReadCursor::with_limits(&buf, limits);
        assert!(matches!(r.read_length(), Err(DecodeError::Length(4, 3))));
    }
}
