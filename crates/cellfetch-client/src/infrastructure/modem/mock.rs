//! Scriptable in-process modem for tests.
//!
//! # Why a simulated modem?
//!
//! The real modem needs a SIM, network coverage and a reachable server.  None
//! of that is available to `cargo test`, and none of it can be made to fail on
//! demand.  `SimulatedModem` implements every modem-facing trait in memory:
//!
//! - A [`ModemScript`] decides what goes wrong: which link step fails, which
//!   key store operation fails, what DNS returns, and how the peer behaves.
//! - A shared [`ModemLog`] records every call so tests can assert on order,
//!   bytes sent, sockets closed and when each connect happened.
//!
//! # Peer behaviour
//!
//! Every socket talks to the same scripted peer ([`PeerScript`]):
//!
//! - `send_limits[i]` caps how many bytes the i-th send on a socket accepts.
//!   Once the list is exhausted sends accept everything offered.
//! - The peer answers with `response`, at most `recv_limit` bytes per read,
//!   then closes (or fails with `recv_error`, or hangs if `recv_hangs`).
//! - A TLS socket with peer verification `Required` only connects if the
//!   CA chain provisioned under one of its bound tags equals `peer_root`.
//!   Otherwise connect fails with `ECONNABORTED`, the way a failed handshake
//!   is reported.
//!
//! # Usage in tests
//!
//! ```ignore
//! let modem = Arc::new(SimulatedModem::new(ModemScript {
//!     addresses: vec![Ipv4Addr::new(192, 0, 2, 1)],
//!     peer: PeerScript { response: b"HTTP/1.1 200 OK\r\n\r\n".to_vec(), ..Default::default() },
//!     ..Default::default()
//! }));
//!
//! // ... run the client against `modem` ...
//!
//! let log = modem.log();
//! assert_eq!(log.sockets.len(), 1);
//! assert_eq!(log.sockets[0].close_count, 1);
//! ```

use std::collections::BTreeMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cellfetch_core::{CredentialType, Errno, SecurityTag};
use tokio::time::Instant;

use crate::application::attach::LinkControl;
use crate::application::provision::CredentialStore;
use crate::application::resolve::HostResolver;
use crate::application::session::{ModemSocket, PeerVerify, SessionMode, SocketProvider};

/// A step of AT initialisation or LTE attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStep {
    AtCommands,
    AtNotifications,
    Connect,
    Psm,
    Edrx,
}

/// A key store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Exists,
    Delete,
    Write,
}

/// How the simulated modem misbehaves.
#[derive(Debug, Clone, Default)]
pub struct ModemScript {
    /// Link step that fails, and with which errno.
    pub link_failure: Option<(LinkStep, Errno)>,
    /// Key store operation that fails, and with which errno.
    pub store_failure: Option<(StoreOp, Errno)>,
    /// Addresses DNS returns, in order.
    pub addresses: Vec<Ipv4Addr>,
    /// When set, DNS fails with this kind instead of returning `addresses`.
    pub resolve_error: Option<io::ErrorKind>,
    pub peer: PeerScript,
}

/// How sockets and the remote peer behave.
#[derive(Debug, Clone, Default)]
pub struct PeerScript {
    pub create_error: Option<Errno>,
    pub peer_verify_error: Option<Errno>,
    pub sec_tag_error: Option<Errno>,
    pub connect_error: Option<Errno>,
    /// Connect never completes.
    pub connect_hangs: bool,
    /// Root the peer's certificate chain anchors on.  `None` means the peer
    /// presents a chain nothing provisioned can verify.
    pub peer_root: Option<Vec<u8>>,
    /// Per-call caps on bytes accepted by `send`.
    pub send_limits: Vec<usize>,
    /// Every send fails with this errno.
    pub send_error: Option<Errno>,
    /// Bytes the peer sends back before closing.
    pub response: Vec<u8>,
    /// Cap on bytes returned by a single `recv`.
    pub recv_limit: Option<usize>,
    /// After the response, fail with this errno instead of closing.
    pub recv_error: Option<Errno>,
    /// After the response, never close.
    pub recv_hangs: bool,
}

/// Everything that happened to one socket.
#[derive(Debug, Clone)]
pub struct SocketRecord {
    pub mode: SessionMode,
    pub peer_verify: Option<PeerVerify>,
    pub sec_tags: Vec<SecurityTag>,
    /// Address and time of every connect attempt.
    pub connects: Vec<(SocketAddrV4, Instant)>,
    pub connected: bool,
    /// Bytes accepted by each send call.
    pub send_calls: Vec<usize>,
    pub sent: Vec<u8>,
    pub received: usize,
    pub close_count: usize,
}

impl SocketRecord {
    fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            peer_verify: None,
            sec_tags: Vec::new(),
            connects: Vec::new(),
            connected: false,
            send_calls: Vec::new(),
            sent: Vec::new(),
            received: 0,
            close_count: 0,
        }
    }
}

/// Every call made to the simulated modem.
#[derive(Debug, Clone, Default)]
pub struct ModemLog {
    pub link_calls: Vec<LinkStep>,
    pub psm_requests: Vec<bool>,
    pub edrx_requests: Vec<bool>,
    pub store_calls: Vec<(StoreOp, SecurityTag, CredentialType)>,
    pub lookups: Vec<String>,
    pub create_attempts: usize,
    pub sockets: Vec<SocketRecord>,
}

impl ModemLog {
    /// Every connect attempt across all sockets, in order.
    pub fn connect_times(&self) -> Vec<Instant> {
        let mut times: Vec<Instant> = self
            .sockets
            .iter()
            .flat_map(|s| s.connects.iter().map(|(_, at)| *at))
            .collect();
        times.sort();
        times
    }
}

#[derive(Debug, Default)]
struct SimState {
    credentials: BTreeMap<(SecurityTag, CredentialType), Vec<u8>>,
    log: ModemLog,
}

/// In-memory modem driven by a [`ModemScript`].
#[derive(Debug, Clone)]
pub struct SimulatedModem {
    script: Arc<ModemScript>,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedModem {
    pub fn new(script: ModemScript) -> Self {
        Self {
            script: Arc::new(script),
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Preloads a credential, as if left over from an earlier boot.
    pub fn with_credential(self, tag: SecurityTag, kind: CredentialType, content: &[u8]) -> Self {
        self.state().credentials.insert((tag, kind), content.to_vec());
        self
    }

    /// Snapshot of the call log.
    pub fn log(&self) -> ModemLog {
        self.state().log.clone()
    }

    /// Snapshot of the key store.
    pub fn credentials(&self) -> BTreeMap<(SecurityTag, CredentialType), Vec<u8>> {
        self.state().credentials.clone()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn link_step(&self, step: LinkStep) -> Result<(), Errno> {
        self.state().log.link_calls.push(step);
        match self.script.link_failure {
            Some((failing, errno)) if failing == step => Err(errno),
            _ => Ok(()),
        }
    }

    fn store_op(&self, op: StoreOp, tag: SecurityTag, kind: CredentialType) -> Result<(), Errno> {
        self.state().log.store_calls.push((op, tag, kind));
        match self.script.store_failure {
            Some((failing, errno)) if failing == op => Err(errno),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl LinkControl for SimulatedModem {
    async fn init_at_commands(&self) -> Result<(), Errno> {
        self.link_step(LinkStep::AtCommands)
    }

    async fn init_at_notifications(&self) -> Result<(), Errno> {
        self.link_step(LinkStep::AtNotifications)
    }

    async fn init_and_connect(&self) -> Result<(), Errno> {
        self.link_step(LinkStep::Connect)
    }

    async fn request_psm(&self, enable: bool) -> Result<(), Errno> {
        self.state().log.psm_requests.push(enable);
        self.link_step(LinkStep::Psm)
    }

    async fn request_edrx(&self, enable: bool) -> Result<(), Errno> {
        self.state().log.edrx_requests.push(enable);
        self.link_step(LinkStep::Edrx)
    }
}

#[async_trait]
impl CredentialStore for SimulatedModem {
    async fn exists(&self, tag: SecurityTag, kind: CredentialType) -> Result<bool, Errno> {
        self.store_op(StoreOp::Exists, tag, kind)?;
        Ok(self.state().credentials.contains_key(&(tag, kind)))
    }

    async fn delete(&self, tag: SecurityTag, kind: CredentialType) -> Result<(), Errno> {
        self.store_op(StoreOp::Delete, tag, kind)?;
        self.state()
            .credentials
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
        self.store_op(StoreOp::Write, tag, kind)?;
        let mut state = self.state();
        // The key store refuses to overwrite in place.
        if state.credentials.contains_key(&(tag, kind)) {
            return Err(Errno::EINVAL);
        }
        state.credentials.insert((tag, kind), content.to_vec());
        Ok(())
    }
}

#[async_trait]
impl HostResolver for SimulatedModem {
    async fn lookup_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>> {
        self.state().log.lookups.push(host.to_string());
        if let Some(kind) = self.script.resolve_error {
            return Err(io::Error::new(kind, "simulated resolver failure"));
        }
        Ok(self.script.addresses.clone())
    }
}

impl SocketProvider for SimulatedModem {
    fn create_socket(&self, mode: SessionMode) -> Result<Box<dyn ModemSocket>, Errno> {
        let mut state = self.state();
        state.log.create_attempts += 1;
        if let Some(errno) = self.script.peer.create_error {
            return Err(errno);
        }
        let id = state.log.sockets.len();
        state.log.sockets.push(SocketRecord::new(mode));
        Ok(Box::new(SimSocket {
            id,
            mode,
            script: Arc::clone(&self.script),
            state: Arc::clone(&self.state),
            sends: 0,
            served: 0,
        }))
    }
}

/// One socket of the simulated modem.
struct SimSocket {
    id: usize,
    mode: SessionMode,
    script: Arc<ModemScript>,
    state: Arc<Mutex<SimState>>,
    sends: usize,
    served: usize,
}

impl SimSocket {
    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn peer(&self) -> &PeerScript {
        &self.script.peer
    }

    /// Whether a TLS handshake with the scripted peer would verify.
    fn peer_trusted(&self) -> bool {
        let state = self.state();
        let record = &state.log.sockets[self.id];
        if record.peer_verify != Some(PeerVerify::Required) {
            return true;
        }
        let Some(peer_root) = self.peer().peer_root.as_ref() else {
            return false;
        };
        record.sec_tags.iter().any(|tag| {
            state
                .credentials
                .get(&(*tag, CredentialType::CaChain))
                .is_some_and(|ca| ca == peer_root)
        })
    }
}

#[async_trait]
impl ModemSocket for SimSocket {
    fn set_peer_verify(&mut self, mode: PeerVerify) -> Result<(), Errno> {
        if let Some(errno) = self.peer().peer_verify_error {
            return Err(errno);
        }
        let id = self.id;
        self.state().log.sockets[id].peer_verify = Some(mode);
        Ok(())
    }

    fn set_sec_tag_list(&mut self, tags: &[SecurityTag]) -> Result<(), Errno> {
        if let Some(errno) = self.peer().sec_tag_error {
            return Err(errno);
        }
        let id = self.id;
        self.state().log.sockets[id].sec_tags = tags.to_vec();
        Ok(())
    }

    async fn connect(&mut self, addr: SocketAddrV4) -> Result<(), Errno> {
        let id = self.id;
        self.state().log.sockets[id].connects.push((addr, Instant::now()));
        if self.peer().connect_hangs {
            std::future::pending::<()>().await;
        }
        if let Some(errno) = self.peer().connect_error {
            return Err(errno);
        }
        if self.mode == SessionMode::Tls && !self.peer_trusted() {
            return Err(Errno::ECONNABORTED);
        }
        self.state().log.sockets[id].connected = true;
        Ok(())
    }

    async fn send(&mut self, buf: &[u8]) -> Result<usize, Errno> {
        if let Some(errno) = self.peer().send_error {
            return Err(errno);
        }
        let limit = self
            .peer()
            .send_limits
            .get(self.sends)
            .copied()
            .unwrap_or(buf.len());
        self.sends += 1;
        let accepted = limit.min(buf.len());
        let id = self.id;
        let mut state = self.state();
        let record = &mut state.log.sockets[id];
        record.send_calls.push(accepted);
        record.sent.extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
        let remaining = &self.script.peer.response[self.served..];
        if remaining.is_empty() {
            if let Some(errno) = self.peer().recv_error {
                return Err(errno);
            }
            if self.peer().recv_hangs {
                std::future::pending::<()>().await;
            }
            return Ok(0);
        }
        let cap = self.peer().recv_limit.unwrap_or(usize::MAX);
        let n = remaining.len().min(buf.len()).min(cap);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.served += n;
        let id = self.id;
        self.state().log.sockets[id].received += n;
        Ok(n)
    }

    fn close(&mut self) {
        let id = self.id;
        let mut state = self.state();
        let record = &mut state.log.sockets[id];
        record.close_count += 1;
        record.connected = false;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
