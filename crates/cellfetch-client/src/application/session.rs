//! Transport session: one socket, created → configured → connected → closed.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//!  create_socket(mode)
//!        │
//!        ▼
//!  [TLS only] set peer verify = Required
//!  [TLS only] set sec_tag list = [tag]
//!        │
//!        ▼
//!  connect(server)  ── bounded by connect_timeout
//!        │
//!        ▼
//!  Session (used by the exchange)
//!        │
//!        ▼
//!  close()
//! ```
//!
//! Any failure after the socket exists closes the socket before the error is
//! returned, so a failed `open` never leaks a handle.  A [`Session`] that is
//! dropped without calling [`Session::close`] closes its socket on drop.

use std::fmt;
use std::net::SocketAddrV4;
use std::time::Duration;

use async_trait::async_trait;
use cellfetch_core::{Errno, SecurityTag, ServerAddress};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Transport used by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Plain TCP.
    Plain,
    /// TCP with TLS handled by the modem.
    Tls,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Plain => f.write_str("plain"),
            SessionMode::Tls => f.write_str("TLS"),
        }
    }
}

/// TLS peer verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerVerify {
    None,
    Optional,
    Required,
}

/// TLS socket option that failed to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsOption {
    PeerVerify,
    SecTagList,
}

impl fmt::Display for TlsOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsOption::PeerVerify => f.write_str("peer verify"),
            TlsOption::SecTagList => f.write_str("sec_tag list"),
        }
    }
}

/// A socket handle owned by the modem.
#[async_trait]
pub trait ModemSocket: Send {
    /// Sets the TLS peer verification policy.
    fn set_peer_verify(&mut self, mode: PeerVerify) -> Result<(), Errno>;

    /// Binds the security tags whose credentials form the trust anchors.
    fn set_sec_tag_list(&mut self, tags: &[SecurityTag]) -> Result<(), Errno>;

    /// Connects to `addr`.  No retry.
    async fn connect(&mut self, addr: SocketAddrV4) -> Result<(), Errno>;

    /// Writes some prefix of `buf`; returns how many bytes were accepted.
    async fn send(&mut self, buf: &[u8]) -> Result<usize, Errno>;

    /// Reads into `buf`; `Ok(0)` means the peer closed.
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Errno>;

    /// Releases the socket.  Safe to call more than once.
    fn close(&mut self);
}

/// Creates modem sockets.
pub trait SocketProvider: Send + Sync {
    /// Creates a stream socket for `mode`.
    fn create_socket(&self, mode: SessionMode) -> Result<Box<dyn ModemSocket>, Errno>;
}

/// Errors produced while opening a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("failed to create {mode} socket: {errno}")]
    SocketCreate { mode: SessionMode, errno: Errno },

    #[error("failed to set TLS {option}: {errno}")]
    TlsSetup { option: TlsOption, errno: Errno },

    #[error("connect to {addr} failed: {errno}")]
    Connect { addr: ServerAddress, errno: Errno },

    #[error("connect to {addr} timed out after {after:?}")]
    ConnectTimeout { addr: ServerAddress, after: Duration },
}

impl SessionError {
    /// The negated platform error number, as connect-style calls report it.
    pub fn code(&self) -> i32 {
        match self {
            SessionError::SocketCreate { errno, .. }
            | SessionError::TlsSetup { errno, .. }
            | SessionError::Connect { errno, .. } => errno.negated(),
            SessionError::ConnectTimeout { .. } => Errno::ETIMEDOUT.negated(),
        }
    }
}

/// Settings for opening a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Use a TLS socket instead of plain TCP.
    pub secure: bool,
    /// Trust anchor tag bound to TLS sockets.
    pub security_tag: SecurityTag,
    /// Upper bound on a single connect attempt.
    pub connect_timeout: Duration,
}

impl SessionConfig {
    pub fn mode(&self) -> SessionMode {
        if self.secure {
            SessionMode::Tls
        } else {
            SessionMode::Plain
        }
    }
}

/// One connected socket.
pub struct Session {
    socket: Box<dyn ModemSocket>,
    mode: SessionMode,
    server: ServerAddress,
    closed: bool,
}

impl Session {
    /// Creates, configures and connects a socket to `server`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] for the step that failed.  The socket is
    /// closed before returning whenever it was created.
    pub async fn open(
        provider: &dyn SocketProvider,
        server: ServerAddress,
        config: &SessionConfig,
    ) -> Result<Session, SessionError> {
        let mode = config.mode();
        let mut socket = provider
            .create_socket(mode)
            .map_err(|errno| SessionError::SocketCreate { mode, errno })?;
        debug!(%mode, "socket created");

        if mode == SessionMode::Tls {
            if let Err(e) = configure_tls(socket.as_mut(), config.security_tag) {
                socket.close();
                return Err(e);
            }
        }

        let connect = tokio::time::timeout(
            config.connect_timeout,
            socket.connect(server.socket_addr()),
        )
        .await;
        match connect {
            Ok(Ok(())) => {}
            Ok(Err(errno)) => {
                socket.close();
                return Err(SessionError::Connect {
                    addr: server,
                    errno,
                });
            }
            Err(_) => {
                socket.close();
                return Err(SessionError::ConnectTimeout {
                    addr: server,
                    after: config.connect_timeout,
                });
            }
        }

        info!(%server, %mode, "connected");
        Ok(Session {
            socket,
            mode,
            server,
            closed: false,
        })
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn server(&self) -> ServerAddress {
        self.server
    }

    /// The underlying socket, for the exchange.
    pub fn socket_mut(&mut self) -> &mut dyn ModemSocket {
        self.socket.as_mut()
    }

    /// Closes the socket.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.closed {
            self.socket.close();
            self.closed = true;
            debug!(server = %self.server, "socket closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            warn!(server = %self.server, "session dropped without close");
            self.shutdown();
        }
    }
}

/// Fail-closed verification bound to the single provisioned tag.
fn configure_tls(socket: &mut dyn ModemSocket, tag: SecurityTag) -> Result<(), SessionError> {
    socket
        .set_peer_verify(PeerVerify::Required)
        .map_err(|errno| SessionError::TlsSetup {
            option: TlsOption::PeerVerify,
            errno,
        })?;
    socket
        .set_sec_tag_list(&[tag])
        .map_err(|errno| SessionError::TlsSetup {
            option: TlsOption::SecTagList,
            errno,
        })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
