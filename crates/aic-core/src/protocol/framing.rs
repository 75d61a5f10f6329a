//! Length-prefix framing for payloads written to device sockets.
//!
//! Wire format:
//! ```text
//! [length:varint (1-4 bytes)][payload:N]
//! ```
//! The length is a base-128 varint: low-order 7 bits first, every byte except
//! the last carries the continuation bit `0x80`.  This is the same prefix a
//! protobuf "delimited message" reader expects, which is what the emulated
//! hardware daemons inside the VM use to split the stream.
//!
//! # Why a varint? (for beginners)
//!
//! Most sensor payloads are a few dozen bytes.  A fixed 4-byte length would
//! waste three bytes per message; a varint spends one byte for lengths below
//! 128, two below 16 384, and so on.

use std::ops::Deref;

use thiserror::Error;

/// Maximum bytes a varint-encoded `u32` can occupy.
pub const MAX_VARINT_LEN: usize = 5;

/// Largest payload [`frame_payload`] accepts.  Keeping lengths below `2^28`
/// guarantees the prefix never exceeds 4 bytes.
pub const MAX_FRAMED_PAYLOAD: usize = (1 << 28) - 1;

const CONTINUATION_BIT: u8 = 0x80;
const PAYLOAD_BITS: u8 = 0x7F;

/// Errors that can occur while framing or reading a varint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The input ended before the final varint byte.
    #[error("insufficient data: varint truncated after {available} byte(s)")]
    InsufficientData { available: usize },

    /// The varint does not fit in 32 bits.
    #[error("varint overflows 32 bits")]
    Overflow,

    /// The payload is too large to be framed with a 4-byte prefix.
    #[error("payload of {len} bytes exceeds the {max} byte framing limit")]
    PayloadTooLarge { len: usize, max: usize },
}

/// An encoded varint held on the stack.
///
/// Dereferences to the encoded bytes, so it can be passed anywhere a `&[u8]`
/// is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarintBytes {
    buf: [u8; MAX_VARINT_LEN],
    len: usize,
}

impl Deref for VarintBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Encodes `value` as a base-128 varint.
///
/// # Examples
///
/// ```rust
/// use aic_core::protocol::framing::encode_varint;
///
/// assert_eq!(&*encode_varint(10), &[0x0A]);
/// assert_eq!(&*encode_varint(300), &[0xAC, 0x02]);
/// ```
pub fn encode_varint(value: u32) -> VarintBytes {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut len = 0;
    let mut remaining = value;

    while remaining > u32::from(PAYLOAD_BITS) {
        buf[len] = (remaining as u8 & PAYLOAD_BITS) | CONTINUATION_BIT;
        remaining >>= 7;
        len += 1;
    }
    buf[len] = remaining as u8;
    len += 1;

    VarintBytes { buf, len }
}

/// Decodes one varint from the beginning of `bytes`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// - [`FramingError::InsufficientData`] if `bytes` ends before the final byte.
/// - [`FramingError::Overflow`] if the value needs more than 32 bits.
pub fn decode_varint(bytes: &[u8]) -> Result<(u32, usize), FramingError> {
    let mut value: u32 = 0;

    for (index, &byte) in bytes.iter().enumerate() {
        if index == MAX_VARINT_LEN {
            return Err(FramingError::Overflow);
        }

        let group = u32::from(byte & PAYLOAD_BITS);
        let shift = 7 * index as u32;
        // The fifth group only has room for the top 4 bits of a u32.
        if index == MAX_VARINT_LEN - 1 && group > 0x0F {
            return Err(FramingError::Overflow);
        }
        value |= group << shift;

        if byte & CONTINUATION_BIT == 0 {
            return Ok((value, index + 1));
        }
    }

    if bytes.len() >= MAX_VARINT_LEN {
        return Err(FramingError::Overflow);
    }
    Err(FramingError::InsufficientData {
        available: bytes.len(),
    })
}

/// Prepends the varint-encoded length of `payload` to the payload bytes.
///
/// The result is meant to be written to the device socket in one go.
///
/// # Errors
///
/// Returns [`FramingError::PayloadTooLarge`] for payloads of `2^28` bytes or more.
///
/// # Examples
///
/// ```rust
/// use aic_core::protocol::framing::frame_payload;
///
/// let framed = frame_payload(b"hello").unwrap();
/// assert_eq!(framed, b"\x05hello");
/// ```
pub fn frame_payload(payload: &[u8]) -> Result<Vec<u8>, FramingError> {
    if payload.len() > MAX_FRAMED_PAYLOAD {
        return Err(FramingError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_FRAMED_PAYLOAD,
        });
    }

    let prefix = encode_varint(payload.len() as u32);
    let mut framed = Vec::with_capacity(prefix.len() + payload.len());
    framed.extend_from_slice(&prefix);
    framed.extend_from_slice(payload);
    Ok(framed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_zero_is_single_zero_byte() {
        assert_eq!(&*encode_varint(0), &[0x00]);
    }

    #[test]
    fn test_encode_127_fits_in_one_byte() {
        assert_eq!(&*encode_varint(127), &[0x7F]);
    }

    #[test]
    fn test_encode_128_needs_continuation_byte() {
        assert_eq!(&*encode_varint(128), &[0x80, 0x01]);
    }

    #[test]
    fn test_encode_300_matches_protobuf_reference() {
        // 300 = 0b1_0010_1100 → low group 0x2C | 0x80, high group 0x02
        assert_eq!(&*encode_varint(300), &[0xAC, 0x02]);
    }

    #[test]
    fn test_encode_largest_four_byte_value() {
        let encoded = encode_varint((1 << 28) - 1);
        assert_eq!(&*encoded, &[0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn test_encode_u32_max_uses_five_bytes() {
        assert_eq!(&*encode_varint(u32::MAX), &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_encoded_length_boundaries() {
        let cases: [(u32, usize); 8] = [
            (0, 1),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (2_097_151, 3),
            (2_097_152, 4),
            ((1 << 28) - 1, 4),
        ];
        for (value, expected_len) in cases {
            assert_eq!(
                encode_varint(value).len(),
                expected_len,
                "unexpected prefix length for {value}"
            );
        }
    }

    #[test]
    fn test_decode_reports_consumed_bytes() {
        let bytes = [0xAC, 0x02, 0xFF];
        assert_eq!(decode_varint(&bytes), Ok((300, 2)));
    }

    #[test]
    fn test_decode_empty_input_is_insufficient() {
        assert_eq!(
            decode_varint(&[]),
            Err(FramingError::InsufficientData { available: 0 })
        );
    }

    #[test]
    fn test_decode_truncated_varint_is_insufficient() {
        assert_eq!(
            decode_varint(&[0x80, 0x80]),
            Err(FramingError::InsufficientData { available: 2 })
        );
    }

    #[test]
    fn test_decode_six_byte_varint_overflows() {
        assert_eq!(
            decode_varint(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]),
            Err(FramingError::Overflow)
        );
    }

    #[test]
    fn test_decode_fifth_byte_with_high_bits_overflows() {
        assert_eq!(
            decode_varint(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]),
            Err(FramingError::Overflow)
        );
    }

    #[test]
    fn test_frame_payload_ten_bytes_is_eleven_bytes() {
        // Arrange
        let payload = [0xA5u8; 10];

        // Act
        let framed = frame_payload(&payload).unwrap();

        // Assert
        assert_eq!(framed.len(), 11);
        assert_eq!(framed[0], 0x0A);
        assert_eq!(&framed[1..], &payload);
    }

    #[test]
    fn test_frame_empty_payload_is_single_zero() {
        assert_eq!(frame_payload(&[]).unwrap(), vec![0x00]);
    }

    #[test]
    fn test_frame_payload_with_two_byte_prefix() {
        let payload = vec![7u8; 200];
        let framed = frame_payload(&payload).unwrap();
        assert_eq!(&framed[..2], &[0xC8, 0x01]);
        assert_eq!(framed.len(), 202);
    }
}
