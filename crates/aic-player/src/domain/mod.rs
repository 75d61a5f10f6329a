//! Domain layer for the AiC player binary.
//!
//! Only configuration lives here; the sensor catalogue, envelopes and
//! recording requests are shared through `aic-core`.

pub mod config;

pub use config::{BrokerSettings, PlayerConfig};
