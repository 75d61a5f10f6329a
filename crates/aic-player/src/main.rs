//! AiC player relay: entry point.
//!
//! Starts the relay duties selected by the configuration and runs until
//! Ctrl+C:
//!
//! - one device forwarder per enabled sensor;
//! - the GL tunnel manager;
//! - the recording coordinator with its broker listener and TCP command
//!   channel.
//!
//! # Usage
//!
//! ```text
//! aic-player [OPTIONS]
//!
//! Options:
//!   --amqp-host <HOST>          Broker host, "0" disables the broker [default: 127.0.0.1]
//!   --amqp-port <PORT>          Broker port [default: 5672]
//!   --amqp-username <USER>      SASL PLAIN user [default: guest]
//!   --amqp-password <PASS>      SASL PLAIN password [default: guest]
//!   --vm-id <ID>                VM identifier used in queue names [default: 0]
//!   --vm-host <HOST>            Host running the VM [default: 127.0.0.1]
//!   --enable-sensors <y|n>      Forward motion sensors [default: n]
//!   --enable-battery <y|n>      Forward battery readings [default: n]
//!   --enable-gps <y|n>          Forward GPS fixes [default: n]
//!   --enable-gsm <y|n>          Forward GSM events [default: n]
//!   --enable-nfc <y|n>          Forward NFC events [default: n]
//!   --enable-record <y|n>       Accept recording commands [default: n]
//!   --path-record <DIR>         Base directory for recordings [default: records]
//!   --enable-gl-tunnel <y|n>    Run the GL tunnel [default: n]
//!   --record-command <CMD>      Program started for each recording
//!   --snapshot-command <CMD>    Program run for each snapshot
//!   --config <FILE>             Optional TOML tuning file
//! ```
//!
//! # Environment variable overrides
//!
//! Every option can also be set through the environment; CLI args take
//! precedence when both are present.
//!
//! | Variable                      | Option               |
//! |-------------------------------|----------------------|
//! | `AIC_PLAYER_AMQP_HOST`        | `--amqp-host`        |
//! | `AIC_PLAYER_AMQP_PORT`        | `--amqp-port`        |
//! | `AIC_PLAYER_AMQP_USERNAME`    | `--amqp-username`    |
//! | `AIC_PLAYER_AMQP_PASSWORD`    | `--amqp-password`    |
//! | `AIC_PLAYER_VM_ID`            | `--vm-id`            |
//! | `AIC_PLAYER_VM_HOST`          | `--vm-host`          |
//! | `AIC_PLAYER_ENABLE_SENSORS`   | `--enable-sensors`   |
//! | `AIC_PLAYER_ENABLE_BATTERY`   | `--enable-battery`   |
//! | `AIC_PLAYER_ENABLE_GPS`       | `--enable-gps`       |
//! | `AIC_PLAYER_ENABLE_GSM`       | `--enable-gsm`       |
//! | `AIC_PLAYER_ENABLE_NFC`       | `--enable-nfc`       |
//! | `AIC_PLAYER_ENABLE_RECORD`    | `--enable-record`    |
//! | `AIC_PLAYER_PATH_RECORD`      | `--path-record`      |
//! | `AIC_PLAYER_ENABLE_GL_TUNNEL` | `--enable-gl-tunnel` |
//! | `AIC_PLAYER_RECORD_COMMAND`   | `--record-command`   |
//! | `AIC_PLAYER_SNAPSHOT_COMMAND` | `--snapshot-command` |
//! | `AIC_PLAYER_CONFIG`           | `--config`           |
//!
//! Boolean options accept any value starting with `y`, `Y` or `1` as true and
//! `n`, `N` or `0` as false.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use aic_core::SensorKind;
use aic_player::application::{DeviceForwarder, RecordingCoordinator};
use aic_player::domain::{BrokerSettings, PlayerConfig};
use aic_player::infrastructure::broker::AmqpConnector;
use aic_player::infrastructure::recorder::CommandRecorder;
use aic_player::infrastructure::recording_sources::{
    prepare_base_dir, run_broker_listener, run_tcp_commands,
};
use aic_player::infrastructure::tunnel::TunnelManager;
use aic_player::infrastructure::tuning::{load_tuning, Tuning};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Parses a y/n style flag.
fn parse_flag(value: &str) -> Result<bool, String> {
    match value.chars().next() {
        Some('y' | 'Y' | '1') => Ok(true),
        Some('n' | 'N' | '0') => Ok(false),
        _ => Err(format!("expected y/n/1/0, got '{value}'")),
    }
}

/// AiC player relay.
///
/// Forwards broker sensor messages to the VM, tunnels the GL stream and
/// coordinates screen recordings.
#[derive(Debug, Parser)]
#[command(name = "aic-player", about = "Relay core of the AiC player", version)]
struct Cli {
    /// Broker host.  The literal "0" disables every broker consumer.
    #[arg(long, default_value = "127.0.0.1", env = "AIC_PLAYER_AMQP_HOST")]
    amqp_host: String,

    #[arg(long, default_value_t = 5672, env = "AIC_PLAYER_AMQP_PORT")]
    amqp_port: u16,

    #[arg(long, default_value = "guest", env = "AIC_PLAYER_AMQP_USERNAME")]
    amqp_username: String,

    #[arg(long, default_value = "guest", env = "AIC_PLAYER_AMQP_PASSWORD")]
    amqp_password: String,

    /// VM identifier used in every queue name.
    #[arg(long, default_value = "0", env = "AIC_PLAYER_VM_ID")]
    vm_id: String,

    /// Host running the VM: device endpoints, GL tunnel and recording commands.
    #[arg(long, default_value = "127.0.0.1", env = "AIC_PLAYER_VM_HOST")]
    vm_host: String,

    #[arg(
        long,
        default_value = "n",
        env = "AIC_PLAYER_ENABLE_SENSORS",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    enable_sensors: bool,

    #[arg(
        long,
        default_value = "n",
        env = "AIC_PLAYER_ENABLE_BATTERY",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    enable_battery: bool,

    #[arg(
        long,
        default_value = "n",
        env = "AIC_PLAYER_ENABLE_GPS",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    enable_gps: bool,

    #[arg(
        long,
        default_value = "n",
        env = "AIC_PLAYER_ENABLE_GSM",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    enable_gsm: bool,

    #[arg(
        long,
        default_value = "n",
        env = "AIC_PLAYER_ENABLE_NFC",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    enable_nfc: bool,

    #[arg(
        long,
        default_value = "n",
        env = "AIC_PLAYER_ENABLE_RECORD",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    enable_record: bool,

    /// Base directory recordings and snapshots are written into.
    #[arg(long, default_value = "records", env = "AIC_PLAYER_PATH_RECORD")]
    path_record: PathBuf,

    #[arg(
        long,
        default_value = "n",
        env = "AIC_PLAYER_ENABLE_GL_TUNNEL",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    enable_gl_tunnel: bool,

    /// Program started for each recording; the destination is appended.
    #[arg(long, env = "AIC_PLAYER_RECORD_COMMAND")]
    record_command: Option<String>,

    /// Program run for each snapshot; the destination is appended.
    #[arg(long, env = "AIC_PLAYER_SNAPSHOT_COMMAND")]
    snapshot_command: Option<String>,

    /// Optional TOML file overriding retry delays and buffer sizes.
    #[arg(long, env = "AIC_PLAYER_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`PlayerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is empty.
    fn into_player_config(self) -> anyhow::Result<PlayerConfig> {
        anyhow::ensure!(!self.vm_id.trim().is_empty(), "--vm-id must not be empty");
        anyhow::ensure!(!self.vm_host.trim().is_empty(), "--vm-host must not be empty");
        anyhow::ensure!(
            !self.amqp_host.trim().is_empty(),
            "--amqp-host must not be empty (use \"0\" to disable the broker)"
        );

        let enabled_sensors = [
            (SensorKind::Sensors, self.enable_sensors),
            (SensorKind::Battery, self.enable_battery),
            (SensorKind::Gps, self.enable_gps),
            (SensorKind::Gsm, self.enable_gsm),
            (SensorKind::Nfc, self.enable_nfc),
        ]
        .into_iter()
        .filter_map(|(kind, enabled)| enabled.then_some(kind))
        .collect();

        Ok(PlayerConfig {
            broker: BrokerSettings {
                host: self.amqp_host,
                port: self.amqp_port,
                username: self.amqp_username,
                password: self.amqp_password,
            },
            vm_id: self.vm_id,
            vm_host: self.vm_host,
            enabled_sensors,
            record_enabled: self.enable_record,
            record_dir: self.path_record,
            gl_tunnel_enabled: self.enable_gl_tunnel,
        })
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn spawn_forwarders(config: &PlayerConfig, tuning: &Tuning) {
    if !config.broker_enabled() {
        if !config.enabled_sensors.is_empty() {
            warn!("broker disabled; sensor forwarding is off");
        }
        return;
    }

    for params in config.sensor_params() {
        let sensor = params.kind;
        let forwarder = DeviceForwarder::new(params, AmqpConnector::new(config.broker.clone()))
            .with_retry(tuning.retry_policy())
            .with_reconnect_delay(tuning.sensor_reconnect_delay());
        tokio::spawn(async move {
            if let Err(e) = forwarder.run().await {
                error!("{sensor} forwarder stopped: {e}");
            }
        });
    }
}

async fn spawn_recording(
    config: &PlayerConfig,
    tuning: &Tuning,
    recorder: CommandRecorder,
) -> anyhow::Result<()> {
    prepare_base_dir(&config.record_dir).await.with_context(|| {
        format!(
            "could not create recording directory {}",
            config.record_dir.display()
        )
    })?;

    let handle = RecordingCoordinator::spawn(Arc::new(recorder));

    let channel = tuning.command_channel(&config.vm_host, &config.record_dir);
    let tcp_handle = handle.clone();
    tokio::spawn(async move {
        if let Err(e) = run_tcp_commands(channel, tcp_handle).await {
            error!("recording command channel stopped: {e}");
        }
    });

    if config.broker_enabled() {
        let listener = run_broker_listener(
            AmqpConnector::new(config.broker.clone()),
            config.recording_queue(),
            tuning.retry_policy(),
            config.record_dir.clone(),
            handle,
        );
        tokio::spawn(async move {
            if let Err(e) = listener.await {
                error!("recording broker listener stopped: {e}");
            }
        });
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let recorder =
        CommandRecorder::new(cli.record_command.as_deref(), cli.snapshot_command.as_deref());
    let tuning = load_tuning(cli.config.as_deref()).context("could not load tuning file")?;
    let config = cli.into_player_config()?;

    info!(
        "AiC player starting: vm {} on {}, broker {}:{}",
        config.vm_id, config.vm_host, config.broker.host, config.broker.port
    );

    spawn_forwarders(&config, &tuning);

    if config.gl_tunnel_enabled {
        tokio::spawn(TunnelManager::new(tuning.tunnel_config(&config.vm_host)).run());
    }

    if config.record_enabled {
        spawn_recording(&config, &tuning, recorder).await?;
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("received Ctrl+C; shutting down");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
