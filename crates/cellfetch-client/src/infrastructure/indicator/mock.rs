//! Recording indicator pins for tests.
//!
//! # Usage in tests
//!
//! ```ignore
//! let pins = Arc::new(RecordingPins::new());
//! let mut indicator = StatusIndicator::new(pins.clone());
//!
//! indicator.init().unwrap();
//!
//! assert_eq!(pins.writes().last(), Some(&(IndicatorLine::Led1, true)));
//! ```
//!
//! Set `should_fail = true` to make every call return an error.

use std::sync::Mutex;

use cellfetch_core::IndicatorLine;

use crate::application::indicator::{IndicatorError, IndicatorPins};

/// Records every pin call without touching hardware.
#[derive(Debug, Default)]
pub struct RecordingPins {
    /// Lines passed to `configure_output`, in call order.
    pub configured: Mutex<Vec<IndicatorLine>>,
    /// `(line, on)` pairs passed to `write`, in call order.
    pub written: Mutex<Vec<(IndicatorLine, bool)>>,
    /// When `true`, every method returns `IndicatorError::Gpio`.
    pub should_fail: bool,
}

impl RecordingPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of every write so far.
    pub fn writes(&self) -> Vec<(IndicatorLine, bool)> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Snapshot of the writes made to `line`, as on/off values.
    pub fn writes_to(&self, line: IndicatorLine) -> Vec<bool> {
        self.writes()
            .into_iter()
            .filter(|(l, _)| *l == line)
            .map(|(_, on)| on)
            .collect()
    }

    fn fail(&self, line: IndicatorLine) -> Result<(), IndicatorError> {
        if self.should_fail {
            return Err(IndicatorError::Gpio {
                line,
                reason: "simulated failure".into(),
            });
        }
        Ok(())
    }
}

impl IndicatorPins for RecordingPins {
    fn configure_output(&self, line: IndicatorLine) -> Result<(), IndicatorError> {
        self.fail(line)?;
        if let Ok(mut configured) = self.configured.lock() {
            configured.push(line);
        }
        Ok(())
    }

    fn write(&self, line: IndicatorLine, on: bool) -> Result<(), IndicatorError> {
        self.fail(line)?;
        if let Ok(mut written) = self.written.lock() {
            written.push((line, on));
        }
        Ok(())
    }
}
