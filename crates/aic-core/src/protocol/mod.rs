//! Protocol module containing the device framing codec, the tunnel control
//! commands, and the recording payload reader.

pub mod framing;
pub mod recording_payload;
pub mod tunnel;

pub use framing::{decode_varint, encode_varint, frame_payload, FramingError};
pub use recording_payload::{decode_recording_payload, PayloadError};
pub use tunnel::TunnelCommand;
