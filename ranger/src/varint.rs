//! Variable-length integer encoding and decoding
//!
//! Unsigned integers are written little-endian in base 128. Each byte uses:
//! - 7 bits for the value
//! - 1 "continuation" bit to indicate if more bytes follow
//!
//! A `u64` occupies at most [MAX_LEN] bytes. Lengths, counts, and non-static integer fields
//! all use this encoding.

use crate::Error;
use bytes::{Buf, BufMut, Bytes, BytesMut};

const BITS_PER_BYTE: usize = 8;
const DATA_BITS_PER_BYTE: usize = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// The maximum number of bytes a varint-encoded `u64` can occupy.
pub const MAX_LEN: usize = 10;

/// Encodes an unsigned 64-bit integer as a varint.
///
/// The caller must ensure the buffer has at least [size] bytes of capacity.
pub fn write(value: u64, buf: &mut impl BufMut) {
    if value < CONTINUATION_BIT_MASK as u64 {
        // Fast path for small values (common case for lengths).
        buf.put_u8(value as u8);
        return;
    }

    let mut val = value;
    while val >= CONTINUATION_BIT_MASK as u64 {
        buf.put_u8((val as u8) | CONTINUATION_BIT_MASK);
        val >>= DATA_BITS_PER_BYTE;
    }
    buf.put_u8(val as u8);
}

/// Decodes an unsigned 64-bit integer from a varint.
///
/// Returns [Error::ShortRead] if the buffer ends before a terminating byte and
/// [Error::Overflow] if the encoding does not fit in 64 bits.
pub fn read(buf: &mut impl Buf) -> Result<u64, Error> {
    let max_bits = std::mem::size_of::<u64>() * BITS_PER_BYTE;
    let mut result = 0u64;
    let mut shift = 0;

    loop {
        if !buf.has_remaining() {
            return Err(Error::ShortRead);
        }
        let byte = buf.get_u8();

        // If this must be the last byte, check for set bits beyond 64. Because the continuation
        // bit is the most-significant bit, this also rejects an 11th byte.
        let remaining_bits = max_bits - shift;
        if remaining_bits <= DATA_BITS_PER_BYTE {
            let relevant_bits = BITS_PER_BYTE - byte.leading_zeros() as usize;
            if relevant_bits > remaining_bits {
                return Err(Error::Overflow);
            }
        }

        result |= u64::from(byte & DATA_BITS_MASK) << shift;
        if byte & CONTINUATION_BIT_MASK == 0 {
            return Ok(result);
        }
        shift += DATA_BITS_PER_BYTE;
    }
}

/// Calculates the number of bytes needed to encode an unsigned integer as a varint.
pub fn size(value: u64) -> usize {
    let mut value = value;
    let mut n = 0;
    loop {
        n += 1;
        value >>= DATA_BITS_PER_BYTE;
        if value == 0 {
            return n;
        }
    }
}

/// Encodes a value into a freshly allocated buffer.
pub fn encode(value: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(size(value));
    write(value, &mut buf);
    buf.freeze()
}

/// Decodes a value from the front of `data`, returning it with the number of bytes consumed.
pub fn decode(data: &[u8]) -> Result<(u64, usize), Error> {
    let mut cursor = data;
    let value = read(&mut cursor)?;
    Ok((value, data.len() - cursor.len()))
}
