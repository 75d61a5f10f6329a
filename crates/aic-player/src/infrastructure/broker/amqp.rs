//! AMQP 0-9-1 implementation of the broker seam, built on `lapin`.
//!
//! `lapin` performs the TCP connect and the SASL PLAIN login inside
//! [`Connection::connect_uri`]; I/O failures there are reported as transport
//! failures and everything else as a login failure.  The first channel
//! created on a fresh connection is channel 1.

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::options::BasicConsumeOptions;
use lapin::types::FieldTable;
use lapin::uri::{AMQPAuthority, AMQPUri, AMQPUserInfo};
use lapin::{Channel, Connection, ConnectionProperties, Consumer};
use tracing::debug;

use aic_core::Envelope;

use super::{BrokerConnector, BrokerError, BrokerSession};
use crate::domain::BrokerSettings;

const VHOST: &str = "/";

/// Opens AMQP sessions against one broker with fixed credentials.
#[derive(Debug, Clone)]
pub struct AmqpConnector {
    settings: BrokerSettings,
}

impl AmqpConnector {
    pub fn new(settings: BrokerSettings) -> Self {
        Self { settings }
    }

    fn uri(&self) -> AMQPUri {
        AMQPUri {
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: self.settings.username.clone(),
                    password: self.settings.password.clone(),
                },
                host: self.settings.host.clone(),
                port: self.settings.port,
            },
            vhost: VHOST.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl BrokerConnector for AmqpConnector {
    type Session = AmqpSession;

    async fn establish(&self, queue: &str) -> Result<AmqpSession, BrokerError> {
        let connection = Connection::connect_uri(self.uri(), ConnectionProperties::default())
            .await
            .map_err(|e| match e {
                lapin::Error::IOError(_) => BrokerError::Transport(e.to_string()),
                other => BrokerError::Login(other.to_string()),
            })?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BrokerError::Channel(e.to_string()))?;
        debug!("opened channel {} for '{queue}'", channel.id());

        let consumer = channel
            .basic_consume(
                queue,
                &format!("aic-player.{queue}"),
                BasicConsumeOptions {
                    no_ack: true,
                    exclusive: false,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Consume {
                queue: queue.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(AmqpSession {
            queue: queue.to_owned(),
            _connection: connection,
            _channel: channel,
            consumer,
        })
    }
}

/// A subscribed AMQP consumer plus the connection and channel keeping it alive.
pub struct AmqpSession {
    queue: String,
    _connection: Connection,
    _channel: Channel,
    consumer: Consumer,
}

#[async_trait]
impl BrokerSession for AmqpSession {
    async fn next_envelope(&mut self) -> Result<Envelope, BrokerError> {
        match self.consumer.next().await {
            Some(Ok(delivery)) => {
                let has_content_type = delivery.properties.content_type().is_some();
                Ok(Envelope::new(delivery.data, has_content_type))
            }
            Some(Err(e)) => Err(BrokerError::Consume {
                queue: self.queue.clone(),
                reason: e.to_string(),
            }),
            None => Err(BrokerError::Closed),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
