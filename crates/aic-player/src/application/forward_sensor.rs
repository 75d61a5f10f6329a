//! Device forwarder: broker message → framed bytes → device socket.
//!
//! One forwarder runs per enabled sensor.  Each iteration it makes sure the
//! device socket is connected, consumes exactly one broker message, writes it
//! with a varint length prefix and sleeps the sensor's interval.  Forwarding
//! within one forwarder is strictly sequential.
//!
//! # Socket lifecycle
//!
//! | Policy             | Dial                    | After each iteration |
//! |--------------------|-------------------------|----------------------|
//! | `Persistent`       | once, with address reuse | keep open           |
//! | `ConnectSendClose` | every iteration, plain   | close               |
//!
//! A failed write drops the socket so the next iteration redials; the message
//! itself is not retried.  A dead broker session is re-established with the
//! usual back-off, and only an exhausted retry budget stops the forwarder.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, info, warn};

use aic_core::{frame_payload, Envelope, FramingError, ReconnectPolicy, SensorParams};

use crate::infrastructure::broker::{
    connect_with_retry, BrokerConnector, BrokerError, BrokerSession, RetryPolicy,
};
use crate::infrastructure::transport::{open_socket, SocketOptions};

/// Default wait before redialing an unreachable device endpoint.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Errors that stop a forwarder.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("sensor broker session unavailable: {0}")]
    Broker(#[from] BrokerError),
}

/// Failure to deliver one message; never stops the forwarder.
#[derive(Debug, Error)]
enum DeliveryError {
    #[error("message cannot be framed: {0}")]
    Framing(#[from] FramingError),

    #[error("write to device failed: {0}")]
    Write(#[from] io::Error),
}

/// Forwards one sensor's broker queue to its device endpoint.
pub struct DeviceForwarder<C> {
    params: SensorParams,
    connector: C,
    retry: RetryPolicy,
    reconnect_delay: Duration,
}

impl<C: BrokerConnector> DeviceForwarder<C> {
    pub fn new(params: SensorParams, connector: C) -> Self {
        Self {
            params,
            connector,
            retry: RetryPolicy::default(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Runs the forwarding loop.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::Broker`] once a broker session cannot be
    /// (re-)established within the retry budget.  Otherwise never returns.
    pub async fn run(self) -> Result<(), ForwardError> {
        let sensor = self.params.kind;
        let mut session =
            connect_with_retry(&self.connector, &self.params.queue, &self.retry).await?;
        info!(
            "{sensor}: forwarding '{}' to {}:{}",
            self.params.queue, self.params.endpoint.host, self.params.endpoint.port
        );

        let mut device: Option<TcpStream> = None;
        loop {
            if device.is_none() {
                device = self.dial_device().await;
            }

            let mut write_failed = false;
            match device.as_mut() {
                Some(stream) => match session.next_envelope().await {
                    Ok(envelope) => match deliver(stream, &envelope).await {
                        Ok(()) => debug!("{sensor}: forwarded {} bytes", envelope.body.len()),
                        Err(DeliveryError::Write(e)) => {
                            warn!("{sensor}: write to device failed: {e}");
                            write_failed = true;
                        }
                        Err(e) => warn!("{sensor}: dropping message: {e}"),
                    },
                    Err(e) => {
                        warn!("{sensor}: broker session lost: {e}; reconnecting");
                        session =
                            connect_with_retry(&self.connector, &self.params.queue, &self.retry)
                                .await?;
                    }
                },
                None => {
                    warn!(
                        "{sensor}: device endpoint {}:{} unreachable; retrying in {:?}",
                        self.params.endpoint.host, self.params.endpoint.port, self.reconnect_delay
                    );
                    time::sleep(self.reconnect_delay).await;
                }
            }
            if write_failed {
                device = None;
            }

            time::sleep(self.params.interval).await;

            if self.params.endpoint.policy == ReconnectPolicy::ConnectSendClose {
                device = None;
            }
        }
    }

    async fn dial_device(&self) -> Option<TcpStream> {
        let endpoint = &self.params.endpoint;
        let options = match endpoint.policy {
            ReconnectPolicy::Persistent => SocketOptions::ReuseAddress,
            ReconnectPolicy::ConnectSendClose => SocketOptions::Plain,
        };
        match open_socket(&endpoint.host, endpoint.port, options).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                debug!("{}: {e}", self.params.kind);
                None
            }
        }
    }
}

/// Frames the envelope body and writes prefix and payload in full.
async fn deliver(stream: &mut TcpStream, envelope: &Envelope) -> Result<(), DeliveryError> {
    let framed = frame_payload(&envelope.body)?;
    stream.write_all(&framed).await?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
