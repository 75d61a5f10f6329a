//! # aic-core
//!
//! Shared library for the AiC player relay containing the device framing
//! codec, the tunnel control command codes, and the domain types that describe
//! sensors, broker envelopes, and recording requests.
//!
//! This crate is used by the `aic-player` relay services.
//! It has zero dependencies on sockets, async runtimes, or the message broker.
//!
//! # Architecture overview (for beginners)
//!
//! The AiC player sits between a virtual Android device (the "VM") and a
//! message broker.  External producers publish sensor readings and recording
//! commands to the broker; the player consumes them and pushes them to the VM
//! over plain TCP.  It also tunnels the VM's OpenGL command stream to a local
//! renderer process.
//!
//! This crate (`aic-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How bytes travel over the wire.  Device payloads are
//!   prefixed with a base-128 varint length, tunnel control commands are
//!   4-byte integers, and recording requests use a tiny protobuf-compatible
//!   reader.
//!
//! - **`domain`** – Pure types with no I/O: the sensor catalogue
//!   (`SensorKind`, `SensorParams`, `DeviceEndpoint`), the consumed broker
//!   message (`Envelope`), and the recording requests (`RecordingRequest`,
//!   `RecordingCommand`).

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `aic_core::SensorParams` instead of `aic_core::domain::sensor::SensorParams`.
pub use domain::envelope::Envelope;
pub use domain::recording::{RecordingCommand, RecordingRequest};
pub use domain::sensor::{DeviceEndpoint, ReconnectPolicy, SensorError, SensorKind, SensorParams};
pub use protocol::framing::{decode_varint, encode_varint, frame_payload, FramingError};
pub use protocol::recording_payload::{decode_recording_payload, PayloadError};
pub use protocol::tunnel::TunnelCommand;
