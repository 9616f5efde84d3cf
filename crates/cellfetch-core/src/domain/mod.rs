//! Domain entities for cellfetch.
//!
//! This module contains pure values and rules with no infrastructure
//! dependencies.  Code in the client crate (modem adapters, the supervisory
//! loop, the binary) depends on these types, never the other way round.

/// The resolved server endpoint cached for the process lifetime.
pub mod address;

/// Security tags and credential kinds understood by the modem key store.
pub mod credential;

/// Platform error numbers reported by modem socket calls.
pub mod errno;

/// The four binary status lines.
pub mod indicator;

/// States and legal transitions of the supervisory loop.
pub mod lifecycle;
