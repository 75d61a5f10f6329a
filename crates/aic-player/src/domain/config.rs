//! Player configuration types.
//!
//! [`PlayerConfig`] is built exactly once at startup (from CLI arguments and
//! environment variables in `main.rs`) and then handed by value or clone to
//! each long-running task.  Nothing reads the environment after that point.

use std::path::PathBuf;

use aic_core::domain::sensor::event_queue;
use aic_core::{SensorKind, SensorParams};

/// Broker host value that turns every broker consumer off.
pub const BROKER_DISABLED_HOST: &str = "0";

/// Topic of the recording command queue.
pub const RECORDING_TOPIC: &str = "recording";

/// Connection settings for the AMQP broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// All runtime configuration for the player.
///
/// # Example
///
/// ```rust
/// use aic_player::domain::PlayerConfig;
///
/// let cfg = PlayerConfig::default();
/// assert_eq!(cfg.broker.port, 5672);
/// assert!(cfg.enabled_sensors.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub broker: BrokerSettings,
    /// Identifier of the VM, used in every queue name.
    pub vm_id: String,
    /// Host running the VM: device endpoints, GL tunnel and recording commands.
    pub vm_host: String,
    /// Sensors whose forwarders should run.
    pub enabled_sensors: Vec<SensorKind>,
    pub record_enabled: bool,
    /// Base directory recordings and snapshots are written into.
    pub record_dir: PathBuf,
    pub gl_tunnel_enabled: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            broker: BrokerSettings {
                host: "127.0.0.1".to_string(),
                port: 5672,
                username: "guest".to_string(),
                password: "guest".to_string(),
            },
            vm_id: "0".to_string(),
            vm_host: "127.0.0.1".to_string(),
            enabled_sensors: Vec::new(),
            record_enabled: false,
            record_dir: PathBuf::from("records"),
            gl_tunnel_enabled: false,
        }
    }
}

impl PlayerConfig {
    /// `false` when the broker host is the literal `"0"`.
    pub fn broker_enabled(&self) -> bool {
        self.broker.host != BROKER_DISABLED_HOST
    }

    /// Parameters of every enabled sensor, in startup order.
    pub fn sensor_params(&self) -> Vec<SensorParams> {
        SensorKind::ALL
            .into_iter()
            .filter(|kind| self.enabled_sensors.contains(kind))
            .map(|kind| SensorParams::new(kind, &self.vm_id, &self.vm_host))
            .collect()
    }

    /// Queue carrying recording requests for this VM.
    pub fn recording_queue(&self) -> String {
        event_queue(&self.vm_id, RECORDING_TOPIC)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
