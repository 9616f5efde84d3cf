//! StatusIndicator: owns the four output lines and their last written state.
//!
//! The use case talks to hardware only through the [`IndicatorPins`] trait.
//! A failed pin write is logged and the remembered state is left unchanged,
//! so [`StatusIndicator::state`] always reflects what the lines were last
//! successfully driven to.

use std::sync::Arc;

use cellfetch_core::{DeviceCommand, IndicatorLine, IndicatorState};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error type for indicator pin operations.
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("GPIO error on {line:?}: {reason}")]
    Gpio { line: IndicatorLine, reason: String },
}

/// Output-line driver.
///
/// Infrastructure implementations drive GPIO (or log on hosted builds); test
/// implementations record calls.
#[cfg_attr(test, mockall::automock)]
pub trait IndicatorPins: Send + Sync {
    /// Configures `line` as an output.
    fn configure_output(&self, line: IndicatorLine) -> Result<(), IndicatorError>;

    /// Drives `line` on or off.
    fn write(&self, line: IndicatorLine, on: bool) -> Result<(), IndicatorError>;
}

/// The status indicator use case.
pub struct StatusIndicator {
    pins: Arc<dyn IndicatorPins>,
    state: IndicatorState,
}

impl StatusIndicator {
    /// Creates an indicator with every line assumed off.
    pub fn new(pins: Arc<dyn IndicatorPins>) -> Self {
        Self {
            pins,
            state: IndicatorState::default(),
        }
    }

    /// Power-on pattern: configure all four lines as outputs, clear them, then
    /// light the power line.
    ///
    /// # Errors
    ///
    /// Returns the first [`IndicatorError`] raised while configuring a line.
    /// Lines are not driven if configuration fails.
    pub fn init(&mut self) -> Result<(), IndicatorError> {
        for line in IndicatorLine::ALL {
            self.pins.configure_output(line)?;
        }
        for line in IndicatorLine::ALL {
            self.set(line, false);
        }
        self.set(IndicatorLine::POWER, true);
        info!("status indicator initialised");
        Ok(())
    }

    /// Drives `line` and records the new state on success.
    pub fn set(&mut self, line: IndicatorLine, on: bool) {
        match self.pins.write(line, on) {
            Ok(()) => self.state.set(line, on),
            Err(e) => warn!("indicator write failed: {e}"),
        }
    }

    pub fn state(&self) -> IndicatorState {
        self.state
    }

    /// Applies a decoded device command.  Returns `true` if any line changed
    /// as a result of the command.
    ///
    /// `BsdTest.led1` drives line 3 and `BsdTest.led2` drives line 4.
    pub fn apply_command(&mut self, command: DeviceCommand) -> bool {
        match command {
            DeviceCommand::BsdTest { led1, led2 } => {
                debug!(led1, led2, "applying BSD Test command");
                let before = self.state;
                self.set(IndicatorLine::Led3, led1);
                self.set(IndicatorLine::Led4, led2);
                before != self.state
            }
            DeviceCommand::Unknown => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
