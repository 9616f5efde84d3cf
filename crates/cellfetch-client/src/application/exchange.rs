//! Request/response exchange over an open session.
//!
//! # Send phase
//!
//! A socket may accept fewer bytes than offered.  The send loop keeps an
//! offset into the request and reissues the write for the unsent tail until
//! every byte is accepted.  Any failed write aborts the exchange.  A write
//! that accepts zero bytes of a non-empty tail is treated as a failure too,
//! otherwise the loop could spin forever.
//!
//! # Receive phase
//!
//! Reads land in a fixed-capacity [`ResponseBuffer`].  The loop ends when a
//! read returns `0` (peer closed), fails on the first read error, and stops
//! with [`ResponseError::Truncated`] if the buffer fills before the peer
//! closes.
//!
//! Every individual send and receive call is bounded by `io_timeout`.

use std::fmt;
use std::time::Duration;

use cellfetch_core::{Errno, HttpRequest, ResponseBuffer, ResponseError, DEFAULT_RECEIVE_CAPACITY};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::session::{ModemSocket, Session};

/// Phase of the exchange a timeout happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Send,
    Receive,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Send => f.write_str("send"),
            Phase::Receive => f.write_str("receive"),
        }
    }
}

/// Settings for one exchange.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Upper bound on each individual send or receive call.
    pub io_timeout: Duration,
    /// Size of the receive buffer.
    pub receive_capacity: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            io_timeout: Duration::from_secs(30),
            receive_capacity: DEFAULT_RECEIVE_CAPACITY,
        }
    }
}

/// Errors produced during an exchange.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("send failed after {sent} of {total} bytes: {errno}")]
    Send { sent: usize, total: usize, errno: Errno },

    #[error("receive failed after {received} bytes: {errno}")]
    Receive { received: usize, errno: Errno },

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: Phase, after: Duration },
}

/// Writes all of `bytes` to `socket`, reissuing the write for the unsent tail.
pub async fn send_all(
    socket: &mut dyn ModemSocket,
    bytes: &[u8],
    io_timeout: Duration,
) -> Result<usize, ExchangeError> {
    let total = bytes.len();
    let mut offset = 0;
    while offset < total {
        let sent = tokio::time::timeout(io_timeout, socket.send(&bytes[offset..]))
            .await
            .map_err(|_| ExchangeError::Timeout {
                phase: Phase::Send,
                after: io_timeout,
            })?
            .map_err(|errno| ExchangeError::Send {
                sent: offset,
                total,
                errno,
            })?;
        if sent == 0 {
            return Err(ExchangeError::Send {
                sent: offset,
                total,
                errno: Errno::EIO,
            });
        }
        offset += sent;
        debug!(sent, offset, total, "partial send");
    }
    Ok(offset)
}

/// Reads from `socket` until the peer closes, into a buffer of `capacity`.
pub async fn receive_all(
    socket: &mut dyn ModemSocket,
    capacity: usize,
    io_timeout: Duration,
) -> Result<Vec<u8>, ExchangeError> {
    let mut buffer = ResponseBuffer::with_capacity(capacity);
    loop {
        buffer.ensure_room()?;
        let received = buffer.len();
        let n = tokio::time::timeout(io_timeout, socket.recv(buffer.unfilled_mut()))
            .await
            .map_err(|_| ExchangeError::Timeout {
                phase: Phase::Receive,
                after: io_timeout,
            })?
            .map_err(|errno| ExchangeError::Receive { received, errno })?;
        if n == 0 {
            break;
        }
        buffer.advance(n)?;
    }
    Ok(buffer.into_bytes())
}

/// Sends `request` on `session` and returns the full response text.
pub async fn exchange(
    session: &mut Session,
    request: &HttpRequest,
    config: &ExchangeConfig,
) -> Result<Vec<u8>, ExchangeError> {
    let sent = send_all(session.socket_mut(), request.as_bytes(), config.io_timeout).await?;
    info!(bytes = sent, "request sent");

    let response = receive_all(session.socket_mut(), config.receive_capacity, config.io_timeout)
        .await?;
    info!(bytes = response.len(), "response received");
    debug!("response:\n{}", String::from_utf8_lossy(&response));
    Ok(response)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::PeerVerify;
    use async_trait::async_trait;
    use cellfetch_core::SecurityTag;
    use std::collections::VecDeque;
    use std::net::SocketAddrV4;

    /// Accepts writes in scripted chunk sizes and serves a scripted response.
    #[derive(Default)]
    struct ScriptedSocket {
        write_limits: VecDeque<usize>,
        write_error: Option<Errno>,
        written: Vec<u8>,
        write_calls: usize,
        reads: VecDeque<Result<Vec<u8>, Errno>>,
        hang_on_read: bool,
    }

    #[async_trait]
    impl ModemSocket for ScriptedSocket {
        fn set_peer_verify(&mut self, _mode: PeerVerify) -> Result<(), Errno> {
            Ok(())
        }
        fn set_sec_tag_list(&mut self, _tags: &[SecurityTag]) -> Result<(), Errno> {
            Ok(())
        }
        async fn connect(&mut self, _addr: SocketAddrV4) -> Result<(), Errno> {
            Ok(())
        }
        async fn send(&mut self, buf: &[u8]) -> Result<usize, Errno> {
            self.write_calls += 1;
            if let Some(errno) = self.write_error {
                return Err(errno);
            }
            let n = self.write_limits.pop_front().unwrap_or(buf.len()).min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }
        async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
            match self.reads.pop_front() {
                Some(Ok(chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    Ok(n)
                }
                Some(Err(errno)) => Err(errno),
                None if self.hang_on_read => {
                    std::future::pending::<()>().await;
                    Ok(0)
                }
                None => Ok(0),
            }
        }
        fn close(&mut self) {}
    }

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_short_writes_deliver_every_byte_in_order() {
        // Arrange
        let request = HttpRequest::get("139.162.251.115:42512");
        let mut socket = ScriptedSocket {
            write_limits: VecDeque::from(vec![1, 7, 3, 20]),
            ..ScriptedSocket::default()
        };

        // Act
        let sent = send_all(&mut socket, request.as_bytes(), TIMEOUT).await.unwrap();

        // Assert
        assert_eq!(sent, request.len());
        assert_eq!(socket.written, request.as_bytes());
        assert_eq!(socket.write_calls, 5, "four short writes then the tail");
    }

    #[tokio::test]
    async fn test_write_error_aborts_with_progress() {
        // Arrange
        let mut socket = ScriptedSocket {
            write_error: Some(Errno::ECONNRESET),
            ..ScriptedSocket::default()
        };

        // Act
        let err = send_all(&mut socket, b"abcdef", TIMEOUT).await.unwrap_err();

        // Assert
        assert_eq!(
            err,
            ExchangeError::Send {
                sent: 0,
                total: 6,
                errno: Errno::ECONNRESET
            }
        );
    }

    #[tokio::test]
    async fn test_zero_byte_write_is_a_stall_error() {
        let mut socket = ScriptedSocket {
            write_limits: VecDeque::from(vec![2, 0]),
            ..ScriptedSocket::default()
        };

        let err = send_all(&mut socket, b"abcdef", TIMEOUT).await.unwrap_err();

        assert_eq!(
            err,
            ExchangeError::Send {
                sent: 2,
                total: 6,
                errno: Errno::EIO
            }
        );
    }

    #[tokio::test]
    async fn test_receive_accumulates_until_peer_close() {
        // Arrange
        let mut socket = ScriptedSocket {
            reads: VecDeque::from(vec![Ok(b"HTTP/1.1 200".to_vec()), Ok(b" OK\r\n\r\n{}".to_vec())]),
            ..ScriptedSocket::default()
        };

        // Act
        let response = receive_all(&mut socket, 64, TIMEOUT).await.unwrap();

        // Assert
        assert_eq!(response, b"HTTP/1.1 200 OK\r\n\r\n{}");
    }

    #[tokio::test]
    async fn test_immediate_close_is_empty_success() {
        let mut socket = ScriptedSocket::default();

        let response = receive_all(&mut socket, 64, TIMEOUT).await.unwrap();

        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_receive_error_is_returned_immediately() {
        let mut socket = ScriptedSocket {
            reads: VecDeque::from(vec![Ok(b"partial".to_vec()), Err(Errno::ECONNRESET)]),
            ..ScriptedSocket::default()
        };

        let err = receive_all(&mut socket, 64, TIMEOUT).await.unwrap_err();

        assert_eq!(
            err,
            ExchangeError::Receive {
                received: 7,
                errno: Errno::ECONNRESET
            }
        );
    }

    #[tokio::test]
    async fn test_response_filling_buffer_is_truncated() {
        // Arrange – exactly capacity bytes, then close
        let mut socket = ScriptedSocket {
            reads: VecDeque::from(vec![Ok(vec![b'x'; 10]), Ok(vec![b'y'; 6])]),
            ..ScriptedSocket::default()
        };

        // Act
        let err = receive_all(&mut socket, 16, TIMEOUT).await.unwrap_err();

        // Assert
        assert_eq!(
            err,
            ExchangeError::Response(ResponseError::Truncated { capacity: 16 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_times_out() {
        let mut socket = ScriptedSocket {
            reads: VecDeque::from(vec![Ok(b"HTTP".to_vec())]),
            hang_on_read: true,
            ..ScriptedSocket::default()
        };

        let err = receive_all(&mut socket, 64, Duration::from_secs(2))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExchangeError::Timeout {
                phase: Phase::Receive,
                after: Duration::from_secs(2)
            }
        );
    }
}
