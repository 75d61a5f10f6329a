//! Scripted broker for unit tests.
//!
//! Each call to [`BrokerConnector::establish`] hands out the next scripted
//! session.  A session replays its deliveries (messages or errors) in order
//! and then waits forever, like an idle queue.  Once the script is used up,
//! `establish` fails with a transport error.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use aic_core::Envelope;

use super::{BrokerConnector, BrokerError, BrokerSession};

/// One delivery of a scripted session.
pub type Delivery = Result<Envelope, BrokerError>;

/// A [`BrokerConnector`] replaying a fixed list of sessions.
pub struct ScriptedConnector {
    sessions: Mutex<VecDeque<Vec<Delivery>>>,
    queues: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(sessions: Vec<Vec<Delivery>>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            queues: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared log of the queue named by every `establish` call.
    pub fn queues(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.queues)
    }
}

#[async_trait]
impl BrokerConnector for ScriptedConnector {
    type Session = ScriptedSession;

    async fn establish(&self, queue: &str) -> Result<ScriptedSession, BrokerError> {
        self.queues.lock().expect("lock poisoned").push(queue.to_owned());
        match self.sessions.lock().expect("lock poisoned").pop_front() {
            Some(deliveries) => Ok(ScriptedSession {
                deliveries: deliveries.into(),
            }),
            None => Err(BrokerError::Transport("script exhausted".to_string())),
        }
    }
}

/// A session replaying its deliveries, then idling.
pub struct ScriptedSession {
    deliveries: VecDeque<Delivery>,
}

#[async_trait]
impl BrokerSession for ScriptedSession {
    async fn next_envelope(&mut self) -> Result<Envelope, BrokerError> {
        match self.deliveries.pop_front() {
            Some(delivery) => delivery,
            None => std::future::pending().await,
        }
    }
}
