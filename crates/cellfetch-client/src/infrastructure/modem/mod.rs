//! Modem adapters.
//!
//! Each adapter implements the four modem-facing traits the application
//! layer consumes: `LinkControl`, `CredentialStore`, `HostResolver` and
//! `SocketProvider`.
//!
//! - **`host`** – `HostModem`, a development adapter that maps the modem
//!   onto the host OS: tokio TCP sockets and DNS, an in-memory key store, and
//!   no-op link control.  It has no TLS offload.
//! - **`mock`** – `SimulatedModem`, a scriptable in-process modem used by
//!   tests to inject failures, short writes, hung peers and untrusted TLS
//!   peers, and to record every call.

pub mod host;
pub mod mock;
