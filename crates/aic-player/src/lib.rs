//! aic-player library crate.
//!
//! The relay core of the AiC player.  It consumes sensor readings and
//! recording commands from an AMQP broker, pushes the readings to the emulated
//! hardware inside the VM, tunnels the VM's OpenGL stream to a local renderer,
//! and keeps at most one screen recording running at a time.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! AMQP broker                                    Rendering host (VM)
//!      ↓                                                ↕
//! [aic-player]
//!   ├── domain/            PlayerConfig
//!   ├── application/
//!   │     ├── forward_sensor/  broker message → framed bytes → device socket
//!   │     └── recording/       single-owner recording coordinator (actor)
//!   └── infrastructure/
//!         ├── transport/        TCP connect helper with socket options
//!         ├── broker/           connect-with-retry, AMQP session (lapin)
//!         ├── tunnel/           GL tunnel control + data roles, copy sessions
//!         ├── recording_sources/ broker listener + TCP command channel
//!         ├── recorder/         external recorder process
//!         └── tuning/           optional TOML tuning file
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` talks to the outside world only through the
//!   [`infrastructure::broker::BrokerConnector`] and
//!   [`application::recording::Recorder`] seams plus the socket helper.
//! - `infrastructure` owns every socket, broker client and child process.

/// Domain layer: runtime configuration.
pub mod domain;

/// Application layer: sensor forwarding and the recording coordinator.
pub mod application;

/// Infrastructure layer: sockets, broker, tunnel, recording sources.
pub mod infrastructure;
