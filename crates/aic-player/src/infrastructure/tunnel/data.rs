//! Data role of the GL tunnel.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::time;
use tracing::{debug, info, warn};

use super::copy::copy_session;
use super::{dial_until_connected, TunnelConfig};
use crate::infrastructure::transport::{open_socket, SocketOptions};

/// Opens host/local socket pairs and hands each to its own copy session.
///
/// After spawning a session the role waits for the control role to request
/// the next connection.  If the local renderer cannot be reached, the host
/// socket is closed and the whole iteration is retried after `retry_delay`.
/// Never returns.
pub async fn run_data(config: Arc<TunnelConfig>, requests: Arc<Notify>) {
    let mut session_id: u64 = 0;

    loop {
        let host_stream = dial_until_connected(
            &config.host,
            config.data_port,
            SocketOptions::NoDelay,
            config.retry_delay,
        )
        .await;

        let local_stream = match open_socket(
            &config.local_host,
            config.local_port,
            SocketOptions::NoDelay,
        )
        .await
        {
            Ok(stream) => stream,
            Err(e) => {
                warn!("GL tunnel: local renderer unavailable: {e}");
                drop(host_stream);
                time::sleep(config.retry_delay).await;
                continue;
            }
        };

        session_id += 1;
        info!("GL tunnel: data session {session_id} opened");
        let chunk_size = config.chunk_size;
        tokio::spawn(async move {
            match copy_session(host_stream, local_stream, chunk_size).await {
                Ok(stats) => debug!(
                    "GL tunnel: data session {session_id} ended (host→local {} B, local→host {} B)",
                    stats.a_to_b, stats.b_to_a
                ),
                Err(e) => warn!("GL tunnel: data session {session_id} failed: {e}"),
            }
        });

        requests.notified().await;
    }
}
