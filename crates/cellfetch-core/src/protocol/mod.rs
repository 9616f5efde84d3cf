//! Wire-level pieces of the request/response exchange.

pub mod command;
pub mod request;
pub mod response;

pub use command::{decode_command, DeviceCommand};
pub use request::HttpRequest;
pub use response::{ResponseBuffer, ResponseError};
