//! Lengths and counts are written as unsigned LEB128: the integer is cut into groups of seven bits, least significant
//! group first. Every group except the last one has its high bit set to signal that another group follows.
//!
//! ```text
//!   0 -> 00
//! 127 -> 7f
//! 128 -> 80 01
//! 300 -> ac 02
//! ```

use crate::error::DecodeError;

/// A `u64` never needs more than ten groups.
pub const MAX_GROUPS: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD: u8 = 0x7f;

/// Returns the number of bytes `value` occupies on the wire.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Appends the encoding of `value` to `out` and returns the number of written bytes.
pub fn encode(mut value: u64, out: &mut Vec<u8>) -> usize {
    let mut c = 0;
    loop {
        let group = (value as u8) & PAYLOAD;
        value >>= 7;
        c += 1;
        if value == 0 {
            out.push(group);
            return c;
        }
        out.push(group | CONTINUATION);
    }
}

/// Returns the decoded value and the number of consumed bytes.
pub fn decode(buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate() {
        if i == MAX_GROUPS {
            return Err(DecodeError::VarintOverflow);
        }
        let group = u64::from(byte & PAYLOAD);
        // the last group may only contribute the single remaining bit
        if i == MAX_GROUPS - 1 && group > 1 {
            return Err(DecodeError::VarintOverflow);
        }
        value |= group << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(DecodeError::Underflow { requested: buf.len() + 1, remaining: buf.len() })
}
