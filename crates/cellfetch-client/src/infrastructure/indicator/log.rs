//! Indicator pins that log instead of driving GPIO.

use cellfetch_core::IndicatorLine;
use tracing::{debug, info};

use crate::application::indicator::{IndicatorError, IndicatorPins};

/// Reports every line change as an `info` event.
#[derive(Debug, Default)]
pub struct LogIndicatorPins;

impl LogIndicatorPins {
    pub fn new() -> Self {
        Self
    }
}

impl IndicatorPins for LogIndicatorPins {
    fn configure_output(&self, line: IndicatorLine) -> Result<(), IndicatorError> {
        debug!(?line, "indicator configured as output");
        Ok(())
    }

    fn write(&self, line: IndicatorLine, on: bool) -> Result<(), IndicatorError> {
        info!(?line, state = if on { "on" } else { "off" }, "indicator");
        Ok(())
    }
}
