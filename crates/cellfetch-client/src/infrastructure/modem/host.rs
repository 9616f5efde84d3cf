//! Host OS modem adapter.
//!
//! Lets the client run on a development machine without a cellular modem:
//!
//! | Modem concept        | Host mapping                                  |
//! |----------------------|-----------------------------------------------|
//! | AT init, LTE attach  | logged no-ops                                 |
//! | secure key store     | in-memory map keyed by (tag, credential type) |
//! | DNS                  | `tokio::net::lookup_host`, IPv4 results only  |
//! | plain socket         | `tokio::net::TcpStream`                       |
//! | TLS socket           | not supported: `EPROTONOSUPPORT`              |
//!
//! The key store does not survive a restart.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cellfetch_core::{CredentialType, Errno, SecurityTag};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::application::attach::LinkControl;
use crate::application::provision::CredentialStore;
use crate::application::resolve::HostResolver;
use crate::application::session::{ModemSocket, PeerVerify, SessionMode, SocketProvider};

type CredentialKey = (SecurityTag, CredentialType);

/// Modem adapter backed by the host OS.
#[derive(Debug, Default)]
pub struct HostModem {
    credentials: Mutex<HashMap<CredentialKey, Vec<u8>>>,
}

impl HostModem {
    pub fn new() -> Self {
        Self::default()
    }

    fn credentials(&self) -> MutexGuard<'_, HashMap<CredentialKey, Vec<u8>>> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LinkControl for HostModem {
    async fn init_at_commands(&self) -> Result<(), Errno> {
        debug!("host modem: AT command channel ready");
        Ok(())
    }

    async fn init_at_notifications(&self) -> Result<(), Errno> {
        debug!("host modem: AT notification channel ready");
        Ok(())
    }

    async fn init_and_connect(&self) -> Result<(), Errno> {
        info!("host modem: using host network, no LTE attach");
        Ok(())
    }

    async fn request_psm(&self, enable: bool) -> Result<(), Errno> {
        debug!(enable, "host modem: PSM request ignored");
        Ok(())
    }

    async fn request_edrx(&self, enable: bool) -> Result<(), Errno> {
        debug!(enable, "host modem: eDRX request ignored");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for HostModem {
    async fn exists(&self, tag: SecurityTag, kind: CredentialType) -> Result<bool, Errno> {
        Ok(self.credentials().contains_key(&(tag, kind)))
    }

    async fn delete(&self, tag: SecurityTag, kind: CredentialType) -> Result<(), Errno> {
        self.credentials()
            .remove(&(tag, kind))
            .map(|_| ())
            .ok_or(Errno::ENOENT)
    }

    async fn write(
        &self,
        tag: SecurityTag,
        kind: CredentialType,
        content: &[u8],
    ) -> Result<(), Errno> {
        self.credentials().insert((tag, kind), content.to_vec());
        Ok(())
    }
}

#[async_trait]
impl HostResolver for HostModem {
    async fn lookup_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(vec![ip]);
        }
        let addresses = tokio::net::lookup_host((host, 0))
            .await?
            .filter_map(|addr| match addr.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect();
        Ok(addresses)
    }
}

impl SocketProvider for HostModem {
    fn create_socket(&self, mode: SessionMode) -> Result<Box<dyn ModemSocket>, Errno> {
        match mode {
            SessionMode::Plain => Ok(Box::new(HostSocket::new())),
            SessionMode::Tls => Err(Errno::EPROTONOSUPPORT),
        }
    }
}

/// Any bidirectional byte stream a [`HostSocket`] can sit on.
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

/// A plain socket on the host network.
#[derive(Default)]
pub struct HostSocket {
    stream: Option<Box<dyn ByteStream>>,
}

impl HostSocket {
    /// An unconnected socket.
    pub fn new() -> Self {
        Self::default()
    }

    /// A socket already connected over `stream`.
    pub fn from_stream(stream: impl ByteStream + 'static) -> Self {
        Self {
            stream: Some(Box::new(stream)),
        }
    }

    fn stream(&mut self) -> Result<&mut Box<dyn ByteStream>, Errno> {
        self.stream.as_mut().ok_or(Errno::ENOTCONN)
    }
}

#[async_trait]
impl ModemSocket for HostSocket {
    fn set_peer_verify(&mut self, _mode: PeerVerify) -> Result<(), Errno> {
        Err(Errno::EPROTONOSUPPORT)
    }

    fn set_sec_tag_list(&mut self, _tags: &[SecurityTag]) -> Result<(), Errno> {
        Err(Errno::EPROTONOSUPPORT)
    }

    async fn connect(&mut self, addr: SocketAddrV4) -> Result<(), Errno> {
        if self.stream.is_some() {
            return Err(Errno::EINVAL);
        }
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Errno::from(&e))?;
        self.stream = Some(Box::new(stream));
        Ok(())
    }

    async fn send(&mut self, buf: &[u8]) -> Result<usize, Errno> {
        self.stream()?.write(buf).await.map_err(|e| Errno::from(&e))
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
        self.stream()?.read(buf).await.map_err(|e| Errno::from(&e))
    }

    fn close(&mut self) {
        // Dropping the stream closes the descriptor.
        self.stream.take();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
