//! Domain types for the AiC player relay.
//!
//! This module contains pure data and rules with no infrastructure
//! dependencies: no sockets, no broker client, no async runtime.
//!
//! # What belongs here? (for beginners)
//!
//! The domain layer answers "what" questions: which sensors exist and where
//! their device endpoints live, what a consumed broker message looks like, and
//! how a recording request turns into a start, stop or snapshot command.  The
//! "how" (dialing sockets, talking AMQP, spawning tasks) lives in the
//! `aic-player` crate, which depends on these types but never the reverse.

/// A consumed broker message.
pub mod envelope;

/// Recording requests and the commands they map to.
pub mod recording;

/// Sensor catalogue, device endpoints and reconnect policies.
pub mod sensor;
