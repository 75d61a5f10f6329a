//! Reader for the recording request message.
//!
//! Recording requests arrive as a protobuf-encoded message with two fields:
//!
//! | Field | Name          | Wire type        |
//! |-------|---------------|------------------|
//! | 1     | `recfilename` | length-delimited |
//! | 2     | `startstop`   | varint (int32)   |
//!
//! Only what the player needs is implemented here.  Fields with other numbers
//! are skipped according to their wire type so newer producers can add fields
//! without breaking older players.

use thiserror::Error;

use crate::domain::recording::RecordingRequest;
use crate::protocol::framing::{decode_varint, FramingError};

const FIELD_FILENAME: u32 = 1;
const FIELD_START_STOP: u32 = 2;

const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LENGTH_DELIMITED: u32 = 2;
const WIRE_FIXED32: u32 = 5;

/// Errors that can occur while reading a recording request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// A tag, length or varint value could not be read.
    #[error("malformed varint: {0}")]
    Varint(#[from] FramingError),

    /// A length-delimited field claims more bytes than remain.
    #[error("field {field} needs {needed} bytes but only {available} remain")]
    Truncated {
        field: u32,
        needed: usize,
        available: usize,
    },

    /// The filename is not valid UTF-8.
    #[error("recording filename is not valid UTF-8")]
    InvalidFilename,

    /// A wire type this reader cannot skip (groups, reserved values).
    #[error("unsupported wire type {wire_type} for field {field}")]
    UnsupportedWireType { field: u32, wire_type: u32 },
}

/// Decodes a recording request from its protobuf encoding.
///
/// Missing fields take their protobuf defaults: an empty filename and
/// `start_stop == 0`.
///
/// # Errors
///
/// Returns a [`PayloadError`] if the bytes are not a well-formed message.
pub fn decode_recording_payload(bytes: &[u8]) -> Result<RecordingRequest, PayloadError> {
    let mut filename = String::new();
    let mut start_stop: i32 = 0;
    let mut cursor = 0;

    while cursor < bytes.len() {
        let (tag, used) = decode_varint(&bytes[cursor..])?;
        cursor += used;
        let field = tag >> 3;
        let wire_type = tag & 0x07;

        match wire_type {
            WIRE_VARINT => {
                let (value, used) = decode_wide_varint(&bytes[cursor..])?;
                cursor += used;
                if field == FIELD_START_STOP {
                    // Negative int32 values are sign-extended to 64 bits on the wire.
                    start_stop = value as i32;
                }
            }
            WIRE_LENGTH_DELIMITED => {
                let (len, used) = decode_varint(&bytes[cursor..])?;
                cursor += used;
                let len = len as usize;
                let available = bytes.len() - cursor;
                if len > available {
                    return Err(PayloadError::Truncated {
                        field,
                        needed: len,
                        available,
                    });
                }
                let value = &bytes[cursor..cursor + len];
                cursor += len;
                if field == FIELD_FILENAME {
                    filename = std::str::from_utf8(value)
                        .map_err(|_| PayloadError::InvalidFilename)?
                        .to_owned();
                }
            }
            WIRE_FIXED64 | WIRE_FIXED32 => {
                let len = if wire_type == WIRE_FIXED64 { 8 } else { 4 };
                let available = bytes.len() - cursor;
                if len > available {
                    return Err(PayloadError::Truncated {
                        field,
                        needed: len,
                        available,
                    });
                }
                cursor += len;
            }
            other => {
                return Err(PayloadError::UnsupportedWireType {
                    field,
                    wire_type: other,
                })
            }
        }
    }

    Ok(RecordingRequest {
        filename,
        start_stop,
    })
}

/// Reads a varint field value, which protobuf allows to span up to 10 bytes.
fn decode_wide_varint(bytes: &[u8]) -> Result<(u64, usize), PayloadError> {
    const MAX_WIDE_LEN: usize = 10;
    let mut value: u64 = 0;

    for (index, &byte) in bytes.iter().take(MAX_WIDE_LEN).enumerate() {
        value |= u64::from(byte & 0x7F) << (7 * index as u32);
        if byte & 0x80 == 0 {
            return Ok((value, index + 1));
        }
    }

    if bytes.len() >= MAX_WIDE_LEN {
        return Err(FramingError::Overflow.into());
    }
    Err(FramingError::InsufficientData {
        available: bytes.len(),
    }
    .into())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds `recfilename = name, startstop = value` the way a protobuf encoder would.
    fn encode(name: &str, value: u8) -> Vec<u8> {
        let mut bytes = vec![0x0A, name.len() as u8];
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&[0x10, value]);
        bytes
    }

    #[test]
    fn test_decode_filename_and_start_flag() {
        // Arrange
        let bytes = encode("video.mp4", 1);

        // Act
        let request = decode_recording_payload(&bytes).unwrap();

        // Assert
        assert_eq!(request.filename, "video.mp4");
        assert_eq!(request.start_stop, 1);
    }

    #[test]
    fn test_missing_start_stop_defaults_to_zero() {
        let bytes = [0x0A, 0x03, b'a', b'b', b'c'];
        let request = decode_recording_payload(&bytes).unwrap();
        assert_eq!(request.filename, "abc");
        assert_eq!(request.start_stop, 0);
    }

    #[test]
    fn test_empty_message_decodes_to_defaults() {
        let request = decode_recording_payload(&[]).unwrap();
        assert!(request.filename.is_empty());
        assert_eq!(request.start_stop, 0);
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // Arrange: field 3 varint, field 4 fixed32, field 5 bytes, then the known fields.
        let mut bytes = vec![0x18, 0x96, 0x01];
        bytes.extend_from_slice(&[0x25, 1, 2, 3, 4]);
        bytes.extend_from_slice(&[0x2A, 0x02, 0xFF, 0xFF]);
        bytes.extend_from_slice(&encode("snap.png", 2));

        // Act
        let request = decode_recording_payload(&bytes).unwrap();

        // Assert
        assert_eq!(request.filename, "snap.png");
        assert_eq!(request.start_stop, 2);
    }

    #[test]
    fn test_negative_start_stop_is_sign_extended() {
        // -1 as int32 occupies ten bytes on the wire.
        let bytes = [
            0x10, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01,
        ];
        let request = decode_recording_payload(&bytes).unwrap();
        assert_eq!(request.start_stop, -1);
    }

    #[test]
    fn test_truncated_filename_is_rejected() {
        let bytes = [0x0A, 0x09, b'v', b'i'];
        assert_eq!(
            decode_recording_payload(&bytes),
            Err(PayloadError::Truncated {
                field: 1,
                needed: 9,
                available: 2
            })
        );
    }

    #[test]
    fn test_invalid_utf8_filename_is_rejected() {
        let bytes = [0x0A, 0x02, 0xC3, 0x28];
        assert_eq!(
            decode_recording_payload(&bytes),
            Err(PayloadError::InvalidFilename)
        );
    }

    #[test]
    fn test_group_wire_type_is_unsupported() {
        // field 1, wire type 3 (start group)
        assert_eq!(
            decode_recording_payload(&[0x0B]),
            Err(PayloadError::UnsupportedWireType {
                field: 1,
                wire_type: 3
            })
        );
    }

    #[test]
    fn test_truncated_tag_is_a_varint_error() {
        assert!(matches!(
            decode_recording_payload(&[0x80]),
            Err(PayloadError::Varint(FramingError::InsufficientData { .. }))
        ));
    }
}
