//! Application layer: the use cases of the relay.
//!
//! - [`forward_sensor`]: moves one sensor's broker messages to its device
//!   endpoint, framed with a varint length prefix.
//! - [`recording`]: serialises recording start/stop/snapshot requests from
//!   every source through a single owning actor.

pub mod forward_sensor;
pub mod recording;

pub use forward_sensor::{DeviceForwarder, ForwardError};
pub use recording::{
    CoordinatorError, Outcome, Recorder, RecorderError, RecordingCoordinator, RecordingHandle,
    StopSignal,
};
