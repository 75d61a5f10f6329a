//! Control role of the GL tunnel.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;
use tokio::time;
use tracing::{debug, info, warn};

use aic_core::protocol::tunnel::COMMAND_LEN;
use aic_core::TunnelCommand;

use super::{dial_until_connected, TunnelConfig};
use crate::infrastructure::transport::SocketOptions;

/// Keeps a control connection to the rendering host open forever.
///
/// The connection is dialed with address reuse.  When the host closes it or
/// an I/O error occurs, the role waits `retry_delay` and dials again.
pub async fn run_control(config: Arc<TunnelConfig>, requests: Arc<Notify>) {
    loop {
        let stream = dial_until_connected(
            &config.host,
            config.control_port,
            SocketOptions::ReuseAddress,
            config.retry_delay,
        )
        .await;
        info!("GL tunnel: control connection established");

        match serve_control(stream, &requests).await {
            Ok(()) => info!("GL tunnel: control connection closed by host"),
            Err(e) => warn!("GL tunnel: control connection failed: {e}"),
        }
        time::sleep(config.retry_delay).await;
    }
}

/// Speaks the control protocol on an established connection.
///
/// Sends `START`, then handles commands until the peer closes the stream:
/// `PING` is answered with `PONG` before the next command is read, and a
/// new-connection request raises `requests`.
///
/// Returns `Ok(())` on a clean end of stream.
pub async fn serve_control<S>(mut stream: S, requests: &Notify) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&TunnelCommand::Start.to_wire()).await?;

    let mut buf = [0u8; COMMAND_LEN];
    loop {
        match stream.read_exact(&mut buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        }

        match TunnelCommand::from_wire(buf) {
            TunnelCommand::Ping => {
                stream.write_all(&TunnelCommand::Pong.to_wire()).await?;
            }
            TunnelCommand::NewConnection => {
                debug!("GL tunnel: host requested a new data connection");
                requests.notify_one();
            }
            other => debug!("GL tunnel: ignoring control command {}", other.code()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
