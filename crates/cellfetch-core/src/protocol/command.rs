//! Device commands carried in the JSON body of a response.
//!
//! The server may answer with a JSON object such as:
//!
//! ```json
//! { "ActionName": "BSD Test", "LED1": true, "LED2": 0 }
//! ```
//!
//! `LED1` and `LED2` accept either booleans or integers (non-zero means on).
//! Anything that is not a well-formed `"BSD Test"` command decodes to
//! [`DeviceCommand::Unknown`]; decoding never fails loudly, because a
//! response the device does not understand simply means "do nothing".
//!
//! The body is located after the first blank line (`\r\n\r\n`).  Chunked
//! transfer encoding is not understood; such bodies decode to `Unknown`.

use serde::Deserialize;
use tracing::debug;

/// `ActionName` value of the indicator test command.
pub const BSD_TEST_ACTION: &str = "BSD Test";

/// A decoded instruction from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Drive indicator lines 3 and 4.
    BsdTest { led1: bool, led2: bool },
    /// Anything else, including bodies that are not JSON at all.
    Unknown,
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    #[serde(rename = "ActionName")]
    action_name: Option<String>,
    #[serde(rename = "LED1")]
    led1: Option<Flag>,
    #[serde(rename = "LED2")]
    led2: Option<Flag>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_on(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

/// Returns the message body: everything after the first `\r\n\r\n`, or the
/// whole input when there is no header block.
fn body_of(response: &[u8]) -> &[u8] {
    response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| &response[pos + 4..])
        .unwrap_or(response)
}

/// Decodes a [`DeviceCommand`] from raw response bytes.
///
/// Accepts either a full HTTP response (status line and headers are skipped)
/// or a bare JSON body.
pub fn decode_command(response: &[u8]) -> DeviceCommand {
    let body = body_of(response);
    let raw: RawCommand = match serde_json::from_slice(body) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("response body is not a device command: {e}");
            return DeviceCommand::Unknown;
        }
    };

    match (raw.action_name.as_deref(), raw.led1, raw.led2) {
        (Some(BSD_TEST_ACTION), Some(led1), Some(led2)) => DeviceCommand::BsdTest {
            led1: led1.is_on(),
            led2: led2.is_on(),
        },
        (Some(name), _, _) => {
            debug!("ignoring device command {name:?}");
            DeviceCommand::Unknown
        }
        (None, _, _) => DeviceCommand::Unknown,
    }
}
