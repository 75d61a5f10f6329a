//! Recording coordinator: the single owner of the recording lifecycle.
//!
//! Two independent sources (the broker listener and the TCP command channel)
//! ask for recordings to start and stop.  Instead of sharing a flag and a lock
//! between them, every request goes through one channel to one actor task
//! that owns the state:
//!
//! ```text
//!            Start                       Stop
//!   Idle ─────────────▶ Recording ─────────────▶ Idle
//!    │  Stop: ignored      │  Start: ignored
//!    └─ Snapshot ──────────┴─ Snapshot (state untouched)
//! ```
//!
//! Because the actor handles one command at a time, at most one recording
//! task can ever exist, whatever the interleaving of the sources.
//!
//! # Stopping a recording (for beginners)
//!
//! The recording task receives a [`StopSignal`].  The recorder checks
//! [`StopSignal::is_stopped`] between frames (or awaits
//! [`StopSignal::stopped`]) and returns when it flips.  The coordinator flips
//! it and then awaits the task's `JoinHandle`, so `Stop` only completes once
//! the recording has actually finished.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use aic_core::RecordingCommand;

#[cfg(test)]
use mockall::automock;

const COMMAND_QUEUE_DEPTH: usize = 16;

/// Errors reported by a [`Recorder`] implementation.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("recorder I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("recorder failed: {0}")]
    Failed(String),
}

/// Errors returned to the submitter of a command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("recording coordinator has shut down")]
    Closed,
}

/// What the coordinator did with a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Started,
    Stopped,
    SnapshotTaken,
    /// Start while recording, or Stop while idle.
    Ignored,
    /// The snapshot could not be taken.
    Failed(String),
}

/// Read side of the stop request handed to a recording task.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Returns `true` once stop has been requested.  Never blocks.
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until stop is requested.  Also returns if the coordinator is gone.
    pub async fn stopped(&mut self) {
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Produces recordings and snapshots.  Encoding lives behind this seam.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Records into `destination` until `stop` is raised, then finalises the
    /// file and returns.
    async fn record(&self, destination: PathBuf, stop: StopSignal) -> Result<(), RecorderError>;

    /// Captures a single frame into `destination`.
    async fn snapshot(&self, destination: &Path) -> Result<(), RecorderError>;
}

struct Request {
    command: RecordingCommand,
    reply: oneshot::Sender<Outcome>,
}

/// Cloneable handle used by the command sources to reach the coordinator.
#[derive(Debug, Clone)]
pub struct RecordingHandle {
    tx: mpsc::Sender<Request>,
}

impl RecordingHandle {
    /// Sends `command` to the coordinator and waits for the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Closed`] if the coordinator task has ended.
    pub async fn submit(&self, command: RecordingCommand) -> Result<Outcome, CoordinatorError> {
        let (reply, outcome) = oneshot::channel();
        self.tx
            .send(Request { command, reply })
            .await
            .map_err(|_| CoordinatorError::Closed)?;
        outcome.await.map_err(|_| CoordinatorError::Closed)
    }
}

enum RecordingState {
    Idle,
    Recording {
        destination: PathBuf,
        stop: watch::Sender<bool>,
        task: JoinHandle<Result<(), RecorderError>>,
    },
}

/// The actor owning the recording state.
pub struct RecordingCoordinator {
    recorder: Arc<dyn Recorder>,
    state: RecordingState,
    rx: mpsc::Receiver<Request>,
}

impl RecordingCoordinator {
    /// Spawns the coordinator task and returns a handle to it.
    ///
    /// The task runs until every handle is dropped; a recording still running
    /// at that point is stopped and joined.
    pub fn spawn(recorder: Arc<dyn Recorder>) -> RecordingHandle {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let coordinator = Self {
            recorder,
            state: RecordingState::Idle,
            rx,
        };
        tokio::spawn(coordinator.run());
        RecordingHandle { tx }
    }

    async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            self.reap_finished().await;
            let outcome = self.handle(request.command).await;
            // Submitter may have stopped waiting.
            let _ = request.reply.send(outcome);
        }

        if matches!(self.state, RecordingState::Recording { .. }) {
            self.stop_recording().await;
        }
        debug!("recording coordinator stopped");
    }

    async fn handle(&mut self, command: RecordingCommand) -> Outcome {
        match command {
            RecordingCommand::Start { destination } => match self.state {
                RecordingState::Idle => {
                    self.start_recording(destination);
                    Outcome::Started
                }
                RecordingState::Recording { .. } => {
                    debug!("recording already running; ignoring start");
                    Outcome::Ignored
                }
            },
            RecordingCommand::Stop => match self.state {
                RecordingState::Idle => {
                    debug!("no recording running; ignoring stop");
                    Outcome::Ignored
                }
                RecordingState::Recording { .. } => {
                    self.stop_recording().await;
                    Outcome::Stopped
                }
            },
            RecordingCommand::Snapshot { destination } => {
                match self.recorder.snapshot(&destination).await {
                    Ok(()) => {
                        info!("snapshot saved to {}", destination.display());
                        Outcome::SnapshotTaken
                    }
                    Err(e) => {
                        warn!("snapshot to {} failed: {e}", destination.display());
                        Outcome::Failed(e.to_string())
                    }
                }
            }
        }
    }

    fn start_recording(&mut self, destination: PathBuf) {
        let (stop, rx) = watch::channel(false);
        let recorder = Arc::clone(&self.recorder);
        let path = destination.clone();
        let task = tokio::spawn(async move { recorder.record(path, StopSignal { rx }).await });

        info!("recording started: {}", destination.display());
        self.state = RecordingState::Recording {
            destination,
            stop,
            task,
        };
    }

    async fn stop_recording(&mut self) {
        let state = std::mem::replace(&mut self.state, RecordingState::Idle);
        if let RecordingState::Recording {
            destination,
            stop,
            task,
        } = state
        {
            // Send fails only if the task already dropped its signal.
            let _ = stop.send(true);
            log_recording_end(&destination, task.await);
        }
    }

    /// Moves to `Idle` if the recording task ended on its own.
    async fn reap_finished(&mut self) {
        let finished = matches!(
            &self.state,
            RecordingState::Recording { task, .. } if task.is_finished()
        );
        if finished {
            let state = std::mem::replace(&mut self.state, RecordingState::Idle);
            if let RecordingState::Recording {
                destination, task, ..
            } = state
            {
                log_recording_end(&destination, task.await);
            }
        }
    }
}

fn log_recording_end(
    destination: &Path,
    result: Result<Result<(), RecorderError>, tokio::task::JoinError>,
) {
    match result {
        Ok(Ok(())) => info!("recording finished: {}", destination.display()),
        Ok(Err(e)) => warn!("recording {} ended with error: {e}", destination.display()),
        Err(e) => error!("recording task for {} panicked: {e}", destination.display()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
