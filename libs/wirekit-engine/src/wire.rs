//! Wire-level primitives: varints, zigzag, tags and field skipping.

use bytes::{Buf, BufMut};

use wirekit_api::error::WireError;
use wirekit_api::schema::{WireType, MAX_FIELD_NUMBER};

/// A u64 never needs more than ten 7-bit groups.
pub const MAX_VARINT_LEN: usize = 10;

pub fn encode_varint(mut value: u64, buf: &mut impl BufMut) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Encoded size of `value` in bytes (1..=10).
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

pub fn decode_varint(buf: &mut impl Buf) -> Result<u64, WireError> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(WireError::malformed("truncated varint"));
        }
        let byte = buf.get_u8();
        // The tenth byte may only carry the top bit of a u64.
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(WireError::malformed("varint overflows 64 bits"));
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(WireError::malformed("varint longer than 10 bytes"))
}

pub fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

pub fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

pub fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

pub fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

pub fn tag_value(number: u32, wire_type: WireType) -> u64 {
    (u64::from(number) << 3) | wire_type as u64
}

pub fn encode_tag(number: u32, wire_type: WireType, buf: &mut impl BufMut) {
    encode_varint(tag_value(number, wire_type), buf);
}

/// Read one tag. Fails on wire number 0, numbers above the 29-bit limit,
/// and the undefined wire types 6 and 7.
pub fn decode_tag(buf: &mut impl Buf) -> Result<(u32, WireType), WireError> {
    let raw = decode_varint(buf)?;
    let wire_bits = (raw & 0x7) as u8;
    let wire_type = WireType::from_bits(wire_bits)
        .ok_or_else(|| WireError::malformed(format!("invalid wire type {wire_bits}")))?;
    let number = raw >> 3;
    if number == 0 || number > u64::from(MAX_FIELD_NUMBER) {
        return Err(WireError::malformed(format!("invalid field number {number}")));
    }
    Ok((number as u32, wire_type))
}

/// Split a length-delimited payload off the front of `buf`.
pub fn take_len<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], WireError> {
    let len = decode_varint(buf)?;
    let len = usize::try_from(len)
        .ok()
        .filter(|&len| len <= buf.len())
        .ok_or_else(|| {
            WireError::malformed(format!(
                "length {len} exceeds remaining {} bytes",
                buf.len()
            ))
        })?;
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

/// Check that `n` fixed-width bytes are available.
pub fn ensure_remaining(buf: &[u8], n: usize) -> Result<(), WireError> {
    if buf.len() < n {
        Err(WireError::malformed(format!(
            "truncated fixed-width value: need {n} bytes, have {}",
            buf.len()
        )))
    } else {
        Ok(())
    }
}

/// Advance past the value following a tag of `wire_type`.
pub fn skip_value(wire_type: WireType, buf: &mut &[u8]) -> Result<(), WireError> {
    match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
        }
        WireType::I64 => {
            ensure_remaining(buf, 8)?;
            buf.advance(8);
        }
        WireType::I32 => {
            ensure_remaining(buf, 4)?;
            buf.advance(4);
        }
        WireType::Len => {
            take_len(buf)?;
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(WireError::malformed("group wire types are not supported"));
        }
    }
    Ok(())
}
