//! Infrastructure layer for the client application.
//!
//! Contains the adapters behind the application layer's traits and the
//! configuration file loader.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `cellfetch_core`, but MUST NOT be imported by the `application` or domain
//! layers.
//!
//! # Sub-modules
//!
//! - **`config`** – `cellfetch.toml` schema, defaults equal to the compiled-in
//!   constants, validation, and conversion into the supervisor settings.
//!   Also holds the embedded root certificate.
//!
//! - **`indicator`** – `IndicatorPins` implementations: a logging adapter for
//!   hosted builds and a recording adapter for tests.
//!
//! - **`modem`** – Modem adapters: `HostModem` maps the modem onto the host
//!   OS; `SimulatedModem` is a scriptable stand-in for tests.

pub mod config;
pub mod indicator;
pub mod modem;
