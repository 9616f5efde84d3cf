//! Indicator pin adapters.
//!
//! - **`log`** – `LogIndicatorPins`, used on hosted builds where there is no
//!   GPIO: every configure and write becomes a `tracing` event.
//! - **`mock`** – `RecordingPins`, which records every call for tests.

pub mod log;
pub mod mock;
