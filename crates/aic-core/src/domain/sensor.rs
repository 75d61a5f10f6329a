//! Sensor catalogue and device endpoint description.
//!
//! Each emulated hardware sensor inside the VM listens on a fixed TCP port.
//! The player consumes readings for that sensor from its own broker queue and
//! writes them, framed, to the sensor's port.
//!
//! | Sensor    | Port  | Interval | Policy             |
//! |-----------|-------|----------|--------------------|
//! | `battery` | 22473 | 2 s      | connect-send-close |
//! | `sensors` | 22471 | 100 ms   | persistent         |
//! | `gps`     | 22475 | 2 s      | connect-send-close |
//! | `gsm`     | 6704  | 1 s      | connect-send-close |
//! | `nfc`     | 22800 | 1 s      | connect-send-close |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Prefix shared by every queue the player consumes from.
pub const QUEUE_PREFIX: &str = "android-events";

/// Returns the queue name `android-events.<vm_id>.<topic>`.
///
/// # Examples
///
/// ```rust
/// use aic_core::domain::sensor::event_queue;
///
/// assert_eq!(event_queue("vm7", "gps"), "android-events.vm7.gps");
/// ```
pub fn event_queue(vm_id: &str, topic: &str) -> String {
    format!("{QUEUE_PREFIX}.{vm_id}.{topic}")
}

/// Errors produced when naming a sensor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SensorError {
    #[error("unknown sensor '{0}'")]
    UnknownSensor(String),
}

/// How the forwarder manages its device socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Dial once with address reuse and keep the socket open.  Redial after a
    /// fixed delay if it is lost.
    Persistent,
    /// Dial a fresh socket for every forwarded message and close it at the
    /// end of the iteration.
    ConnectSendClose,
}

/// Where a sensor's readings are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
    pub policy: ReconnectPolicy,
}

/// The emulated sensors the player knows how to feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Battery,
    Sensors,
    Gps,
    Gsm,
    Nfc,
}

impl SensorKind {
    /// Every sensor, in the order the player starts them.
    pub const ALL: [SensorKind; 5] = [
        SensorKind::Sensors,
        SensorKind::Battery,
        SensorKind::Gps,
        SensorKind::Gsm,
        SensorKind::Nfc,
    ];

    /// The lowercase name used in queue names and logs.
    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Battery => "battery",
            SensorKind::Sensors => "sensors",
            SensorKind::Gps => "gps",
            SensorKind::Gsm => "gsm",
            SensorKind::Nfc => "nfc",
        }
    }

    /// TCP port of the device endpoint inside the VM.
    pub fn port(self) -> u16 {
        match self {
            SensorKind::Battery => 22473,
            SensorKind::Sensors => 22471,
            SensorKind::Gps => 22475,
            SensorKind::Gsm => 6704,
            SensorKind::Nfc => 22800,
        }
    }

    /// Pause between two forwarding iterations.
    pub fn interval(self) -> Duration {
        match self {
            SensorKind::Sensors => Duration::from_millis(100),
            SensorKind::Battery | SensorKind::Gps => Duration::from_secs(2),
            SensorKind::Gsm | SensorKind::Nfc => Duration::from_secs(1),
        }
    }

    pub fn policy(self) -> ReconnectPolicy {
        match self {
            SensorKind::Sensors => ReconnectPolicy::Persistent,
            _ => ReconnectPolicy::ConnectSendClose,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorKind {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| SensorError::UnknownSensor(s.to_owned()))
    }
}

/// Everything a forwarder needs to know about its sensor.  Built once at
/// startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorParams {
    pub kind: SensorKind,
    /// Broker queue the readings are consumed from.
    pub queue: String,
    pub endpoint: DeviceEndpoint,
    pub interval: Duration,
}

impl SensorParams {
    /// Derives the parameters of `kind` for the VM `vm_id` reachable at `vm_host`.
    pub fn new(kind: SensorKind, vm_id: &str, vm_host: &str) -> Self {
        Self {
            kind,
            queue: event_queue(vm_id, kind.name()),
            endpoint: DeviceEndpoint {
                host: vm_host.to_owned(),
                port: kind.port(),
                policy: kind.policy(),
            },
            interval: kind.interval(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
