//! The four binary status lines and their in-memory state.
//!
//! Line roles:
//!
//! | Line   | Meaning                                          |
//! |--------|--------------------------------------------------|
//! | `Led1` | Device is running (set once at power-up)         |
//! | `Led2` | A session to the server is connected             |
//! | `Led3` | Driven by the `LED1` field of a device command   |
//! | `Led4` | Driven by the `LED2` field of a device command   |

/// One of the four indicator output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorLine {
    Led1,
    Led2,
    Led3,
    Led4,
}

impl IndicatorLine {
    /// All lines in pin order.
    pub const ALL: [IndicatorLine; 4] = [
        IndicatorLine::Led1,
        IndicatorLine::Led2,
        IndicatorLine::Led3,
        IndicatorLine::Led4,
    ];

    /// The line that shows the device is powered and running.
    pub const POWER: IndicatorLine = IndicatorLine::Led1;

    /// The line that shows a live server connection.
    pub const CONNECTION: IndicatorLine = IndicatorLine::Led2;

    /// Zero-based position of this line.
    pub fn index(self) -> usize {
        match self {
            IndicatorLine::Led1 => 0,
            IndicatorLine::Led2 => 1,
            IndicatorLine::Led3 => 2,
            IndicatorLine::Led4 => 3,
        }
    }
}

/// Snapshot of the four lines.  `true` means the line is driven on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorState {
    lines: [bool; 4],
}

impl IndicatorState {
    pub fn is_on(&self, line: IndicatorLine) -> bool {
        self.lines[line.index()]
    }

    pub fn set(&mut self, line: IndicatorLine, on: bool) {
        self.lines[line.index()] = on;
    }
}
