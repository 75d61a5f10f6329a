//! TCP connect helper shared by every outbound connection of the player.
//!
//! Each duty dials with slightly different socket options:
//!
//! | Option         | Used by                                      |
//! |----------------|----------------------------------------------|
//! | `Plain`        | connect-send-close sensors, recording commands |
//! | `NoDelay`      | GL tunnel data sockets (host and local)      |
//! | `ReuseAddress` | persistent sensor socket, GL tunnel control  |
//!
//! # Why `TcpSocket` instead of `TcpStream::connect`? (for beginners)
//!
//! `SO_REUSEADDR` must be set *before* the socket connects, which the one-shot
//! `TcpStream::connect` does not allow.  `tokio::net::TcpSocket` exposes the
//! unconnected socket so options can be applied first.  `TCP_NODELAY` can be
//! set either way, so it is applied to the connected stream.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tracing::debug;

/// Socket option applied when dialing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketOptions {
    Plain,
    /// Disable Nagle's algorithm on the connected stream.
    NoDelay,
    /// Allow reuse of a local address still in `TIME_WAIT`.
    ReuseAddress,
}

/// Errors raised while opening an outbound connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("{host}:{port} resolved to no addresses")]
    NoAddress { host: String, port: u16 },

    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Resolves `host:port` and connects to the first address that accepts.
///
/// # Errors
///
/// Returns the failure of the last address tried, or a resolve error.
pub async fn open_socket(
    host: &str,
    port: u16,
    options: SocketOptions,
) -> Result<TcpStream, TransportError> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;

    let mut last_error = None;
    for addr in addrs {
        match connect_addr(addr, options).await {
            Ok(stream) => {
                debug!("connected to {addr} ({options:?})");
                return Ok(stream);
            }
            Err(source) => last_error = Some(TransportError::Connect { addr, source }),
        }
    }

    Err(last_error.unwrap_or_else(|| TransportError::NoAddress {
        host: host.to_owned(),
        port,
    }))
}

async fn connect_addr(addr: SocketAddr, options: SocketOptions) -> io::Result<TcpStream> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    if options == SocketOptions::ReuseAddress {
        socket.set_reuseaddr(true)?;
    }

    let stream = socket.connect(addr).await?;
    if options == SocketOptions::NoDelay {
        stream.set_nodelay(true)?;
    }
    Ok(stream)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn local_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_plain_connect_reaches_listener() {
        // Arrange
        let (listener, port) = local_listener().await;

        // Act
        let stream = open_socket("127.0.0.1", port, SocketOptions::Plain).await;
        let accepted = listener.accept().await;

        // Assert
        assert!(stream.is_ok());
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn test_nodelay_is_applied() {
        let (_listener, port) = local_listener().await;

        let stream = open_socket("127.0.0.1", port, SocketOptions::NoDelay)
            .await
            .unwrap();

        assert!(stream.nodelay().unwrap());
    }

    #[tokio::test]
    async fn test_reuse_address_connects() {
        let (_listener, port) = local_listener().await;

        let stream = open_socket("localhost", port, SocketOptions::ReuseAddress).await;

        assert!(stream.is_ok());
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        // Arrange: bind then drop so the port is very likely closed
        let (listener, port) = local_listener().await;
        drop(listener);

        // Act
        let result = open_socket("127.0.0.1", port, SocketOptions::Plain).await;

        // Assert
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
