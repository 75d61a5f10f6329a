//! Broker connection manager.
//!
//! Every consumer in the player (one per sensor plus the recording listener)
//! owns its own broker session.  A session is established in four steps:
//!
//! 1. open the TCP transport to the broker;
//! 2. log in (vhost `/`, SASL PLAIN);
//! 3. open channel 1;
//! 4. start consuming the queue (no-ack, non-exclusive).
//!
//! A failure at any step throws the half-built connection away; the next
//! attempt starts again from step 1.  [`connect_with_retry`] runs attempts with
//! a doubling back-off and gives up with [`BrokerError::Exhausted`].
//!
//! The two traits below are the seam between the relay logic and the real
//! AMQP client in [`amqp`], so forwarders and listeners can be tested with
//! in-memory sessions.

pub mod amqp;
#[cfg(test)]
pub mod mock;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

use aic_core::Envelope;

pub use amqp::AmqpConnector;
pub use retry::{connect_with_retry, RetryPolicy};

/// Errors raised while establishing or using a broker session.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("could not open socket to the broker: {0}")]
    Transport(String),

    #[error("could not log in to the broker: {0}")]
    Login(String),

    #[error("could not open broker channel: {0}")]
    Channel(String),

    #[error("could not consume from queue '{queue}': {reason}")]
    Consume { queue: String, reason: String },

    #[error("broker session closed")]
    Closed,

    #[error("could not connect to the broker after {attempts} tries")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Option<Box<BrokerError>>,
    },
}

/// Establishes subscribed broker sessions.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    type Session: BrokerSession;

    /// Runs one full connect / login / channel / consume attempt for `queue`.
    async fn establish(&self, queue: &str) -> Result<Self::Session, BrokerError>;
}

/// A connected, subscribed broker session.
#[async_trait]
pub trait BrokerSession: Send {
    /// Waits for the next message on the subscribed queue.
    ///
    /// An error means the session is dead and must be re-established.
    async fn next_envelope(&mut self) -> Result<Envelope, BrokerError>;
}
