//! # cellfetch-core
//!
//! Shared library for cellfetch containing the domain types, the fixed HTTP
//! request, the bounded response buffer and the device command decoder.
//!
//! This crate has zero dependencies on modem drivers, sockets, GPIO or the
//! async runtime.  Everything here can be compiled and tested on any host.
//!
//! # Architecture overview (for beginners)
//!
//! cellfetch is a small embedded client.  On power-up it provisions a TLS
//! root certificate into the cellular modem, attaches to the LTE network,
//! resolves a fixed server once and then polls that server forever: open a
//! socket, send one HTTP GET, read until the server closes, close, sleep.
//!
//! This crate (`cellfetch-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The values the client passes around: the cached
//!   [`ServerAddress`], the [`SecurityTag`] that binds the provisioned
//!   certificate to TLS sockets, the four indicator lines, platform error
//!   codes, and the supervisory loop's state table.
//!
//! - **`protocol`** – What goes over the wire.  The request is a fixed
//!   HTTP/1.1 GET; the response is accumulated into a fixed-capacity buffer
//!   that refuses to overflow; an optional JSON body can be decoded into a
//!   [`DeviceCommand`].

pub mod domain;
pub mod protocol;

pub use domain::address::{AddressFamily, ServerAddress};
pub use domain::credential::{CredentialType, SecurityTag, DEFAULT_SECURITY_TAG};
pub use domain::errno::Errno;
pub use domain::indicator::{IndicatorLine, IndicatorState};
pub use domain::lifecycle::{InvalidTransition, LoopState, LoopTrace};
pub use protocol::command::{decode_command, DeviceCommand};
pub use protocol::request::HttpRequest;
pub use protocol::response::{ResponseBuffer, ResponseError, DEFAULT_RECEIVE_CAPACITY};
