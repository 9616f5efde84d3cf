//! cellfetch-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does cellfetch-client do? (for beginners)
//!
//! The client runs on a cellular IoT board.  After power-up it:
//!
//! 1. Lights the power indicator.
//! 2. Initialises the modem's AT interface.
//! 3. Writes the embedded root certificate into the modem's secure key store.
//! 4. Attaches to the LTE network with power saving disabled.
//! 5. Resolves the server hostname once.
//! 6. Loops forever: open a socket (plain or TLS), send a fixed HTTP GET,
//!    read until the server closes, close the socket, sleep one second.
//!
//! The connection indicator shows whether the current iteration got
//! connected.  Steps 2–5 are fatal on failure; errors inside the loop only
//! end the current iteration.

/// Application layer: use cases for the client.
pub mod application;

/// Infrastructure layer: modem adapters, indicator pins and configuration.
pub mod infrastructure;
