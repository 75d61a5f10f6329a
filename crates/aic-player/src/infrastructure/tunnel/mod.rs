//! Socket tunnel manager for the VM's OpenGL command stream.
//!
//! The rendering host and the local renderer cannot talk to each other
//! directly, so the player bridges them:
//!
//! ```text
//! rendering host :25000  ⇄  control role      (START, PING/PONG, "new connection")
//! rendering host :22468  ⇄  copy session  ⇄  127.0.0.1:22468 local renderer
//! rendering host :22468  ⇄  copy session  ⇄  127.0.0.1:22468 local renderer
//! …
//! ```
//!
//! - The **control role** ([`control`]) keeps one control connection open and
//!   answers liveness checks.  When the host asks for a new data connection it
//!   raises a single coalescing signal.
//! - The **data role** ([`data`]) opens one host/local socket pair, spawns a
//!   copy session for it, then waits for that signal before opening the next
//!   pair.
//! - Each **copy session** ([`copy`]) shuttles bytes both ways until either
//!   side closes; it shares nothing with other sessions.
//!
//! # Why `Notify`? (for beginners)
//!
//! `tokio::sync::Notify::notify_one` stores at most one permit when nobody is
//! waiting.  Several "new connection" commands that arrive while the data role
//! is busy therefore collapse into a single wake-up, which is exactly the
//! behaviour of a shared boolean flag, without a lock or a polling loop.

pub mod control;
pub mod copy;
pub mod data;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::time;
use tracing::{info, warn};

use crate::infrastructure::transport::{open_socket, SocketOptions};

pub use copy::{copy_session, SessionStats};

/// Default size of each copy buffer (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Addresses and timings of the tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    /// Rendering host.
    pub host: String,
    pub control_port: u16,
    pub data_port: u16,
    pub local_host: String,
    pub local_port: u16,
    /// Delay between connect attempts.
    pub retry_delay: Duration,
    /// Maximum bytes moved per read in a copy session.
    pub chunk_size: usize,
}

impl TunnelConfig {
    /// Default ports and timings for the rendering host `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            control_port: 25000,
            data_port: 22468,
            local_host: "127.0.0.1".to_string(),
            local_port: 22468,
            retry_delay: Duration::from_secs(5),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Runs the control and data roles of the tunnel.
pub struct TunnelManager {
    config: Arc<TunnelConfig>,
}

impl TunnelManager {
    pub fn new(config: TunnelConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Spawns the control role and runs the data role on the current task.
    /// Never returns.
    pub async fn run(self) {
        let requests = Arc::new(Notify::new());

        info!(
            "GL tunnel: host {} (control :{}, data :{}), local renderer {}:{}",
            self.config.host,
            self.config.control_port,
            self.config.data_port,
            self.config.local_host,
            self.config.local_port
        );

        tokio::spawn(control::run_control(
            Arc::clone(&self.config),
            Arc::clone(&requests),
        ));
        data::run_data(self.config, requests).await;
    }
}

/// Dials `host:port` until it succeeds, waiting `delay` between attempts.
async fn dial_until_connected(
    host: &str,
    port: u16,
    options: SocketOptions,
    delay: Duration,
) -> TcpStream {
    loop {
        match open_socket(host, port, options).await {
            Ok(stream) => return stream,
            Err(e) => {
                warn!("GL tunnel: {e}; retrying in {delay:?}");
                time::sleep(delay).await;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
