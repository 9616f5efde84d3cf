//! Application layer use cases for the client.
//!
//! # What use cases does the client have?
//!
//! - **`indicator`** – Drives the four status lines through an injected
//!   [`indicator::IndicatorPins`] implementation and applies decoded device
//!   commands to them.
//!
//! - **`provision`** – Replaces the root certificate stored in the modem's
//!   secure key store under the client's security tag.
//!
//! - **`attach`** – Initialises the AT command interface and brings the LTE
//!   link up with power saving disabled.
//!
//! - **`resolve`** – Resolves the server hostname to the first IPv4 address.
//!
//! - **`session`** – Creates, configures, connects and closes one socket.
//!
//! - **`exchange`** – Sends the fixed request and reads the response until
//!   the server closes.
//!
//! - **`startup`** – Runs the one-shot bring-up sequence and reports a typed
//!   [`startup::StartupError`] to the binary.
//!
//! - **`supervisor`** – The loop that repeats session → exchange → close →
//!   fixed delay forever.
//!
//! Every modem-facing operation goes through a trait defined next to the use
//! case that consumes it.  The infrastructure layer provides the
//! implementations; tests inject the simulated modem.

pub mod attach;
pub mod exchange;
pub mod indicator;
pub mod provision;
pub mod resolve;
pub mod session;
pub mod startup;
pub mod supervisor;
