//! Recording requests and their classification into commands.
//!
//! A request names a file and carries a `start_stop` integer.  The filename
//! prefix decides what kind of request it is:
//!
//! - `video…` with `start_stop != 0` starts a recording, `== 0` stops it;
//! - `snap…` with `start_stop == 2` takes a snapshot;
//! - anything else is ignored.
//!
//! Filenames must name a single file inside the base directory.  Names with
//! path separators or `.`/`..` components are ignored.

use std::path::{Component, Path, PathBuf};

const VIDEO_PREFIX: &str = "video";
const SNAPSHOT_PREFIX: &str = "snap";
const SNAPSHOT_FLAG: i32 = 2;

/// A decoded recording request, as received from either command source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordingRequest {
    pub filename: String,
    pub start_stop: i32,
}

/// What the recording coordinator is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingCommand {
    /// Start a recording into `destination` (ignored if one is running).
    Start { destination: PathBuf },
    /// Stop the running recording (ignored if none is running).
    Stop,
    /// Capture a single frame into `destination`.
    Snapshot { destination: PathBuf },
}

impl RecordingRequest {
    pub fn new(filename: impl Into<String>, start_stop: i32) -> Self {
        Self {
            filename: filename.into(),
            start_stop,
        }
    }

    /// Maps the request to a command, resolving the filename against `base_dir`.
    ///
    /// Returns `None` for requests that match neither the video nor the
    /// snapshot pattern, and for filenames that are not a single plain file
    /// name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::path::Path;
    /// use aic_core::{RecordingCommand, RecordingRequest};
    ///
    /// let command = RecordingRequest::new("video1.mp4", 0).into_command(Path::new("/rec"));
    /// assert_eq!(command, Some(RecordingCommand::Stop));
    /// ```
    pub fn into_command(self, base_dir: &Path) -> Option<RecordingCommand> {
        if !is_plain_file_name(&self.filename) {
            return None;
        }

        if self.filename.starts_with(VIDEO_PREFIX) {
            if self.start_stop != 0 {
                Some(RecordingCommand::Start {
                    destination: base_dir.join(&self.filename),
                })
            } else {
                Some(RecordingCommand::Stop)
            }
        } else if self.filename.starts_with(SNAPSHOT_PREFIX) && self.start_stop == SNAPSHOT_FLAG {
            Some(RecordingCommand::Snapshot {
                destination: base_dir.join(&self.filename),
            })
        } else {
            None
        }
    }
}

/// `true` when `name` resolves to exactly one entry inside its parent.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
