//! Integration tests for the recording coordinator.
//!
//! Two handles stand in for the broker listener and the TCP command channel.
//! A counting recorder tracks how many recording tasks are alive at once, so
//! the tests can check that interleaved commands never produce a second one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use aic_core::{RecordingCommand, RecordingRequest};
use aic_player::application::{Outcome, Recorder, RecorderError, RecordingCoordinator, StopSignal};
use aic_player::infrastructure::recording_sources::submit_payload;

#[derive(Default)]
struct CountingRecorder {
    active: AtomicUsize,
    max_active: AtomicUsize,
    started: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl Recorder for CountingRecorder {
    async fn record(
        &self,
        destination: PathBuf,
        mut stop: StopSignal,
    ) -> Result<(), RecorderError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.started.lock().unwrap().push(destination);

        stop.stopped().await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn snapshot(&self, _destination: &Path) -> Result<(), RecorderError> {
        Ok(())
    }
}

fn start(name: &str) -> RecordingCommand {
    RecordingCommand::Start {
        destination: PathBuf::from("/rec").join(name),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_second_start_is_ignored_and_stop_joins_the_task() {
    // Arrange
    let recorder = Arc::new(CountingRecorder::default());
    let handle = RecordingCoordinator::spawn(recorder.clone());

    // Act
    let first = handle.submit(start("clip.mp4")).await;
    let second = handle.submit(start("clip.mp4")).await;
    let stopped = handle.submit(RecordingCommand::Stop).await;

    // Assert: Stop only completes once the task has returned
    assert_eq!(first, Ok(Outcome::Started));
    assert_eq!(second, Ok(Outcome::Ignored));
    assert_eq!(stopped, Ok(Outcome::Stopped));
    assert_eq!(recorder.active.load(Ordering::SeqCst), 0);
    assert_eq!(
        *recorder.started.lock().unwrap(),
        vec![PathBuf::from("/rec/clip.mp4")]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_sources_never_run_two_recordings() {
    // Arrange
    let recorder = Arc::new(CountingRecorder::default());
    let broker_source = RecordingCoordinator::spawn(recorder.clone());
    let tcp_source = broker_source.clone();

    // Act: both sources fire start/stop sequences concurrently
    let a = tokio::spawn(async move {
        for i in 0..25 {
            let command = start(&format!("video_a{i}.mp4"));
            broker_source.submit(command).await.unwrap();
            broker_source.submit(RecordingCommand::Stop).await.unwrap();
        }
    });
    let b = tokio::spawn(async move {
        for i in 0..25 {
            let command = start(&format!("video_b{i}.mp4"));
            tcp_source.submit(command).await.unwrap();
            tcp_source.submit(RecordingCommand::Stop).await.unwrap();
        }
    });
    a.await.unwrap();
    b.await.unwrap();

    // Assert
    assert_eq!(recorder.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.active.load(Ordering::SeqCst), 0);
    assert!(!recorder.started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_payload_start_and_stop_through_the_coordinator() {
    // Arrange: field 1 = "video_demo.mp4", field 2 = startstop
    let recorder = Arc::new(CountingRecorder::default());
    let handle = RecordingCoordinator::spawn(recorder.clone());
    let payload = |start_stop: u8| {
        let name = b"video_demo.mp4";
        let mut bytes = vec![0x0A, name.len() as u8];
        bytes.extend_from_slice(name);
        bytes.extend_from_slice(&[0x10, start_stop]);
        bytes
    };

    // Act
    let started = submit_payload(&payload(1), Path::new("/rec"), &handle).await;
    let stopped = submit_payload(&payload(0), Path::new("/rec"), &handle).await;

    // Assert
    assert_eq!(started, Ok(Some(Outcome::Started)));
    assert_eq!(stopped, Ok(Some(Outcome::Stopped)));
    assert_eq!(
        *recorder.started.lock().unwrap(),
        vec![PathBuf::from("/rec/video_demo.mp4")]
    );
}

#[test]
fn test_request_classification_matches_coordinator_commands() {
    let base = Path::new("/rec");

    let snapshot = RecordingRequest::new("snap_3.png", 2).into_command(base);
    let neither = RecordingRequest::new("notes.txt", 1).into_command(base);

    assert_eq!(
        snapshot,
        Some(RecordingCommand::Snapshot {
            destination: PathBuf::from("/rec/snap_3.png")
        })
    );
    assert_eq!(neither, None);
}

#[tokio::test]
async fn test_coordinator_stops_recording_when_all_handles_drop() {
    // Arrange
    let recorder = Arc::new(CountingRecorder::default());
    let handle = RecordingCoordinator::spawn(recorder.clone());
    assert_eq!(handle.submit(start("video_x.mp4")).await, Ok(Outcome::Started));

    // Act
    drop(handle);
    for _ in 0..100 {
        let ran = !recorder.started.lock().unwrap().is_empty();
        if ran && recorder.active.load(Ordering::SeqCst) == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    // Assert
    assert_eq!(recorder.started.lock().unwrap().len(), 1);
    assert_eq!(recorder.active.load(Ordering::SeqCst), 0);
}
