//! Optional TOML file overriding the player's timings and buffer sizes.
//!
//! Every field has a default, so the file (and every table in it) may be
//! omitted entirely.  A complete file looks like this:
//!
//! ```toml
//! [broker]
//! max_attempts = 5
//! initial_backoff_ms = 1000
//!
//! [sensors]
//! reconnect_delay_ms = 3000
//!
//! [tunnel]
//! retry_delay_ms = 5000
//! chunk_size = 4194304
//!
//! [recording]
//! command_port = 32500
//! retry_delay_ms = 1000
//! poll_interval_ms = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::infrastructure::broker::RetryPolicy;
use crate::infrastructure::recording_sources::CommandChannelConfig;
use crate::infrastructure::tunnel::{TunnelConfig, DEFAULT_CHUNK_SIZE};

/// Error type for tuning file operations.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("I/O error reading tuning file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tuning TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid tuning value: {0}")]
    Invalid(&'static str),
}

// ── Schema ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    pub broker: BrokerTuning,
    pub sensors: SensorTuning,
    pub tunnel: TunnelTuning,
    pub recording: RecordingTuning,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerTuning {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SensorTuning {
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TunnelTuning {
    pub retry_delay_ms: u64,
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RecordingTuning {
    pub command_port: u16,
    pub retry_delay_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for BrokerTuning {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 1000,
        }
    }
}

impl Default for SensorTuning {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 3000,
        }
    }
}

impl Default for TunnelTuning {
    fn default() -> Self {
        Self {
            retry_delay_ms: 5000,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for RecordingTuning {
    fn default() -> Self {
        Self {
            command_port: 32500,
            retry_delay_ms: 1000,
            poll_interval_ms: 100,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses and validates tuning TOML.
///
/// # Errors
///
/// Returns [`TuningError::Parse`] for malformed TOML or unknown keys and
/// [`TuningError::Invalid`] for values the player cannot run with.
pub fn parse_tuning(content: &str) -> Result<Tuning, TuningError> {
    let tuning: Tuning = toml::from_str(content)?;
    if tuning.broker.max_attempts == 0 {
        return Err(TuningError::Invalid("broker.max_attempts must be at least 1"));
    }
    if tuning.tunnel.chunk_size == 0 {
        return Err(TuningError::Invalid("tunnel.chunk_size must be positive"));
    }
    Ok(tuning)
}

/// Loads the tuning file at `path`, or the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns [`TuningError::Io`] if the file cannot be read, otherwise the
/// errors of [`parse_tuning`].
pub fn load_tuning(path: Option<&Path>) -> Result<Tuning, TuningError> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tuning(&content)
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl Tuning {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.broker.max_attempts,
            Duration::from_millis(self.broker.initial_backoff_ms),
        )
    }

    pub fn sensor_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.sensors.reconnect_delay_ms)
    }

    pub fn tunnel_config(&self, host: &str) -> TunnelConfig {
        TunnelConfig {
            retry_delay: Duration::from_millis(self.tunnel.retry_delay_ms),
            chunk_size: self.tunnel.chunk_size,
            ..TunnelConfig::new(host)
        }
    }

    pub fn command_channel(&self, host: &str, base_dir: &Path) -> CommandChannelConfig {
        CommandChannelConfig {
            port: self.recording.command_port,
            retry_delay: Duration::from_millis(self.recording.retry_delay_ms),
            poll_interval: Duration::from_millis(self.recording.poll_interval_ms),
            ..CommandChannelConfig::new(host, base_dir)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let tuning = parse_tuning("").unwrap();
        assert_eq!(tuning, Tuning::default());
        assert_eq!(tuning.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_partial_table_keeps_other_defaults() {
        // Arrange
        let content = "[tunnel]\nretry_delay_ms = 250\n";

        // Act
        let tuning = parse_tuning(content).unwrap();

        // Assert
        let tunnel = tuning.tunnel_config("10.0.0.2");
        assert_eq!(tunnel.retry_delay, Duration::from_millis(250));
        assert_eq!(tunnel.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(tunnel.control_port, 25000);
        assert_eq!(tuning.sensor_reconnect_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_command_channel_conversion() {
        let tuning = parse_tuning("[recording]\ncommand_port = 4000\n").unwrap();

        let channel = tuning.command_channel("vm", Path::new("/rec"));

        assert_eq!(channel.port, 4000);
        assert_eq!(channel.host, "vm");
        assert_eq!(channel.base_dir, PathBuf::from("/rec"));
        assert_eq!(channel.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let result = parse_tuning("[broker]\nmax_attempts = 0\n");
        assert!(matches!(result, Err(TuningError::Invalid(_))));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = parse_tuning("[broker]\nmax_attemps = 3\n");
        assert!(matches!(result, Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_tuning(Some(Path::new("/nonexistent/aic-player/tuning.toml")));
        assert!(matches!(result, Err(TuningError::Io { .. })));
    }

    #[test]
    fn test_no_path_yields_defaults() {
        assert_eq!(load_tuning(None).unwrap(), Tuning::default());
    }
}
