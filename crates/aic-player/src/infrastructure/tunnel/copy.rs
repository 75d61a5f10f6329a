//! Bidirectional byte copy between the two sockets of a tunnel session.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bytes moved in each direction during one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub a_to_b: u64,
    pub b_to_a: u64,
}

/// Copies bytes between `a` and `b` until one side closes or fails.
///
/// Whichever socket becomes readable first is read (up to `chunk_size`
/// bytes) and everything read is written to the other socket before the next
/// read.  Each direction has its own buffer.  Both streams are dropped, and
/// therefore closed, when the function returns.
///
/// # Errors
///
/// Returns the first read or write error.  A zero-byte read is a normal end
/// of session and yields `Ok`.
pub async fn copy_session<A, B>(a: A, b: B, chunk_size: usize) -> io::Result<SessionStats>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut a_read, mut a_write) = tokio::io::split(a);
    let (mut b_read, mut b_write) = tokio::io::split(b);
    let mut a_buf = vec![0u8; chunk_size];
    let mut b_buf = vec![0u8; chunk_size];
    let mut stats = SessionStats::default();

    loop {
        tokio::select! {
            read = a_read.read(&mut a_buf) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                b_write.write_all(&a_buf[..n]).await?;
                stats.a_to_b += n as u64;
            }
            read = b_read.read(&mut b_buf) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                a_write.write_all(&b_buf[..n]).await?;
                stats.b_to_a += n as u64;
            }
        }
    }

    Ok(stats)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
