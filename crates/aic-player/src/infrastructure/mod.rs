//! Infrastructure layer for the AiC player.
//!
//! # Sub-modules
//!
//! - **`transport`** – Outbound TCP connect helper (`Plain`, `NoDelay`,
//!   `ReuseAddress`).
//! - **`broker`** – Broker seam, connect-with-retry, and the `lapin` AMQP
//!   implementation.
//! - **`tunnel`** – GL tunnel control role, data role and copy sessions.
//! - **`recording_sources`** – The two producers of recording commands: the
//!   broker listener and the TCP command channel.
//! - **`recorder`** – A [`crate::application::Recorder`] that drives an
//!   external capture program.
//! - **`tuning`** – Optional TOML file overriding retry delays and buffer
//!   sizes.

pub mod broker;
pub mod recorder;
pub mod recording_sources;
pub mod transport;
pub mod tunnel;
pub mod tuning;
