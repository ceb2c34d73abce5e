//! Whole-payload transforms such as compression or encryption. The engine never looks into the transformed bytes; a
//! failing transform is handed back to the caller as `Error::Transform` with the error it raised inside.

use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};

pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

pub trait Transform: Send + Sync {
    /// Applied to the packed record before it is handed out.
    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, TransformError>;

    /// The inverse of `encode`, applied before the record is unpacked.
    fn decode<'b>(&self, bytes: &'b [u8]) -> Result<Cow<'b, [u8]>, TransformError>;
}

/// Passes bytes through untouched and without copying them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        Ok(bytes)
    }

    fn decode<'b>(&self, bytes: &'b [u8]) -> Result<Cow<'b, [u8]>, TransformError> {
        Ok(Cow::Borrowed(bytes))
    }
}

pub struct FnTransform<E, D> {
    encode: E,
    decode: D,
}

/// Builds a transform from a pair of closures.
///
/// ```
/// use zeile::transform::{self, Transform};
///
/// let xor = |bytes: &[u8]| -> Result<Vec<u8>, transform::TransformError> {
///     Ok(bytes.iter().map(|b| b ^ 0x5a).collect())
/// };
/// let t = transform::from_fn(move |bytes: Vec<u8>| xor(&bytes), xor);
/// let encoded = t.encode(vec![1, 2, 3]).unwrap();
/// assert_eq!(vec![0x5b, 0x58, 0x59], encoded);
/// assert_eq!(&[1, 2, 3], &t.decode(&encoded).unwrap()[..]);
/// ```
pub fn from_fn<E, D>(encode: E, decode: D) -> FnTransform<E, D>
where
    E: Fn(Vec<u8>) -> Result<Vec<u8>, TransformError> + Send + Sync,
    D: Fn(&[u8]) -> Result<Vec<u8>, TransformError> + Send + Sync,
{
    FnTransform { encode, decode }
}

impl<E, D> Transform for FnTransform<E, D>
where
    E: Fn(Vec<u8>) -> Result<Vec<u8>, TransformError> + Send + Sync,
    D: Fn(&[u8]) -> Result<Vec<u8>, TransformError> + Send + Sync,
{
    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        (self.encode)(bytes)
    }

    fn decode<'b>(&self, bytes: &'b [u8]) -> Result<Cow<'b, [u8]>, TransformError> {
        (self.decode)(bytes).map(Cow::Owned)
    }
}

impl<E, D> Debug for FnTransform<E, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransform")
    }
}
