//! [`Recorder`] backed by external capture programs.
//!
//! The player does not encode video itself.  A recording runs
//! `<record-command> <destination>` as a child process until stop is
//! requested; a snapshot runs `<snapshot-command> <destination>` to
//! completion.  Commands are split on whitespace, so a command such as
//! `ffmpeg -f x11grab -i :0` receives the destination as its last argument.
//! When no command is configured a recording is only logged and a snapshot
//! fails.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::application::recording::{Recorder, RecorderError, StopSignal};

/// Runs configured programs for recordings and snapshots.
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    record_command: Option<CommandLine>,
    snapshot_command: Option<CommandLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// `None` for a blank command line.
    fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_owned);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    fn command(&self, destination: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(destination);
        command
    }
}

impl CommandRecorder {
    pub fn new(record_command: Option<&str>, snapshot_command: Option<&str>) -> Self {
        Self {
            record_command: record_command.and_then(CommandLine::parse),
            snapshot_command: snapshot_command.and_then(CommandLine::parse),
        }
    }
}

fn check_status(program: &str, status: ExitStatus) -> Result<(), RecorderError> {
    if status.success() {
        Ok(())
    } else {
        Err(RecorderError::Failed(format!("{program} exited with {status}")))
    }
}

#[async_trait]
impl Recorder for CommandRecorder {
    async fn record(
        &self,
        destination: PathBuf,
        mut stop: StopSignal,
    ) -> Result<(), RecorderError> {
        let Some(line) = &self.record_command else {
            warn!(
                "no record command configured; {} will not be written",
                destination.display()
            );
            stop.stopped().await;
            return Ok(());
        };

        let program = &line.program;
        let mut child = line.command(&destination).kill_on_drop(true).spawn()?;
        info!("{program} recording into {}", destination.display());

        let exited = tokio::select! {
            status = child.wait() => Some(status?),
            () = stop.stopped() => None,
        };

        match exited {
            Some(status) => check_status(program, status),
            None => {
                child.start_kill()?;
                child.wait().await?;
                Ok(())
            }
        }
    }

    async fn snapshot(&self, destination: &Path) -> Result<(), RecorderError> {
        let Some(line) = &self.snapshot_command else {
            return Err(RecorderError::Failed(
                "no snapshot command configured".to_string(),
            ));
        };
        let status = line.command(destination).status().await?;
        check_status(&line.program, status)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use aic_core::RecordingCommand;

    use super::*;
    use crate::application::recording::{Outcome, RecordingCoordinator};

    #[test]
    fn test_command_line_is_split_on_whitespace() {
        let line = CommandLine::parse("  ffmpeg -f x11grab  -i :0 ").unwrap();

        assert_eq!(line.program, "ffmpeg");
        assert_eq!(line.args, vec!["-f", "x11grab", "-i", ":0"]);
        assert_eq!(CommandLine::parse("   "), None);
    }

    #[tokio::test]
    async fn test_snapshot_without_program_fails() {
        let recorder = CommandRecorder::default();

        let result = recorder.snapshot(Path::new("/tmp/snap.png")).await;

        assert!(matches!(result, Err(RecorderError::Failed(_))));
    }

    #[tokio::test]
    async fn test_snapshot_runs_program_with_destination() {
        let recorder = CommandRecorder::new(None, Some("true"));

        let result = recorder.snapshot(Path::new("/tmp/snap.png")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_failing_snapshot_program_is_reported() {
        let recorder = CommandRecorder::new(None, Some("false"));

        let result = recorder.snapshot(Path::new("/tmp/snap.png")).await;

        assert!(
            matches!(result, Err(RecorderError::Failed(reason)) if reason.contains("false"))
        );
    }

    #[tokio::test]
    async fn test_stop_kills_long_running_program() {
        // Arrange: `tail -f <destination>` runs until killed
        let destination =
            std::env::temp_dir().join(format!("aic-rec-{}.log", std::process::id()));
        std::fs::write(&destination, b"").unwrap();
        let recorder = CommandRecorder::new(Some("tail -f"), None);
        let handle = RecordingCoordinator::spawn(Arc::new(recorder));

        // Act
        let started = handle
            .submit(RecordingCommand::Start {
                destination: destination.clone(),
            })
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            handle.submit(RecordingCommand::Stop),
        )
        .await;

        // Assert
        assert_eq!(started, Ok(Outcome::Started));
        assert_eq!(stopped.unwrap(), Ok(Outcome::Stopped));
        std::fs::remove_file(&destination).unwrap();
    }
}
