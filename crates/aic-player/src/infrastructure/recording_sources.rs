//! The two producers of recording commands.
//!
//! - **Broker listener**: consumes `android-events.<vm-id>.recording`.  Only
//!   messages carrying a content-type property are decoded.
//! - **TCP command channel**: a plain TCP connection to `<vm-host>:32500`.
//!   A reader task peeks how many bytes are available (at most 1024), reads
//!   exactly that many as one record and hands it over a channel to the
//!   consumer, which decodes it and submits it to the coordinator.
//!
//! Both sources decode the same protobuf payload, classify it against the
//! base recording directory and submit the resulting command through their
//! own [`RecordingHandle`].

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use aic_core::{decode_recording_payload, Envelope};

use crate::application::recording::{CoordinatorError, Outcome, RecordingHandle};
use crate::infrastructure::broker::{
    connect_with_retry, BrokerConnector, BrokerError, BrokerSession, RetryPolicy,
};
use crate::infrastructure::transport::{open_socket, SocketOptions};

/// Largest record the TCP command channel reads at once.
pub const MAX_RECORD_LEN: usize = 1024;

const RECORD_QUEUE_DEPTH: usize = 8;

/// Errors that end a recording source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

/// Settings of the TCP command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChannelConfig {
    pub host: String,
    pub port: u16,
    /// Base directory recordings are written into.
    pub base_dir: PathBuf,
    /// Delay between connect attempts.
    pub retry_delay: Duration,
    /// How long the consumer waits for a record before checking again.
    pub poll_interval: Duration,
}

impl CommandChannelConfig {
    pub fn new(host: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port: 32500,
            base_dir: base_dir.into(),
            retry_delay: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Creates the base recording directory if it does not exist yet.
///
/// On Unix, directories created here are restricted to their owner (`0700`,
/// subject to the umask).  An existing directory is left untouched.
pub async fn prepare_base_dir(path: &Path) -> io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(path).await
}

/// Decodes one recording payload and submits the command it maps to.
///
/// Malformed payloads and requests that match no command are logged and
/// yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`CoordinatorError::Closed`] if the coordinator is gone.
pub async fn submit_payload(
    bytes: &[u8],
    base_dir: &Path,
    handle: &RecordingHandle,
) -> Result<Option<Outcome>, CoordinatorError> {
    let request = match decode_recording_payload(bytes) {
        Ok(request) => request,
        Err(e) => {
            warn!("discarding malformed recording request: {e}");
            return Ok(None);
        }
    };

    let filename = request.filename.clone();
    let Some(command) = request.into_command(base_dir) else {
        debug!("recording request '{filename}' matches no command");
        return Ok(None);
    };

    let outcome = handle.submit(command).await?;
    debug!("recording request '{filename}': {outcome:?}");
    Ok(Some(outcome))
}

/// Consumes the recording queue and submits every decodable request.
///
/// A lost broker session is re-established with `retry`.
///
/// # Errors
///
/// Returns when the retry budget is exhausted or the coordinator is gone.
pub async fn run_broker_listener<C: BrokerConnector>(
    connector: C,
    queue: String,
    retry: RetryPolicy,
    base_dir: PathBuf,
    handle: RecordingHandle,
) -> Result<(), SourceError> {
    loop {
        let mut session = connect_with_retry(&connector, &queue, &retry).await?;
        info!("listening for recording requests on '{queue}'");

        loop {
            match session.next_envelope().await {
                Ok(envelope) => dispatch_envelope(&envelope, &base_dir, &handle).await?,
                Err(e) => {
                    warn!("recording queue session lost: {e}; reconnecting");
                    break;
                }
            }
        }
    }
}

async fn dispatch_envelope(
    envelope: &Envelope,
    base_dir: &Path,
    handle: &RecordingHandle,
) -> Result<(), CoordinatorError> {
    if !envelope.has_content_type {
        debug!("ignoring recording message without content type");
        return Ok(());
    }
    submit_payload(&envelope.body, base_dir, handle).await?;
    Ok(())
}

/// Runs the TCP command channel forever, redialing whenever it closes.
///
/// # Errors
///
/// Returns [`CoordinatorError::Closed`] if the coordinator is gone.
pub async fn run_tcp_commands(
    config: CommandChannelConfig,
    handle: RecordingHandle,
) -> Result<(), CoordinatorError> {
    loop {
        let stream = match open_socket(&config.host, config.port, SocketOptions::Plain).await {
            Ok(stream) => stream,
            Err(e) => {
                debug!("recording command channel: {e}");
                time::sleep(config.retry_delay).await;
                continue;
            }
        };
        info!(
            "recording command channel connected to {}:{}",
            config.host, config.port
        );

        let (tx, rx) = mpsc::channel(RECORD_QUEUE_DEPTH);
        let reader = tokio::spawn(read_records(stream, tx));
        let consumed = consume_records(rx, &config, &handle).await;
        reader.abort();
        consumed?;

        info!("recording command channel closed; reconnecting");
        time::sleep(config.retry_delay).await;
    }
}

/// Reads records sized by what is currently available on the socket.
async fn read_records(mut stream: TcpStream, tx: mpsc::Sender<Vec<u8>>) {
    let mut peek_buf = [0u8; MAX_RECORD_LEN];

    loop {
        let available = match stream.peek(&mut peek_buf).await {
            Ok(0) => {
                debug!("recording command channel: end of stream");
                return;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("recording command channel: peek failed: {e}");
                return;
            }
        };

        let mut record = vec![0u8; available];
        if let Err(e) = stream.read_exact(&mut record).await {
            warn!("recording command channel: read failed: {e}");
            return;
        }
        if tx.send(record).await.is_err() {
            return;
        }
    }
}

/// Waits for records on a fixed cadence and submits each one.
///
/// Returns `Ok(())` once the reader has finished.
async fn consume_records(
    mut rx: mpsc::Receiver<Vec<u8>>,
    config: &CommandChannelConfig,
    handle: &RecordingHandle,
) -> Result<(), CoordinatorError> {
    loop {
        match time::timeout(config.poll_interval, rx.recv()).await {
            Ok(Some(record)) => {
                submit_payload(&record, &config.base_dir, handle).await?;
            }
            Ok(None) => return Ok(()),
            Err(_) => continue,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
