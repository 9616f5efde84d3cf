//! Platform error numbers.
//!
//! Modem socket calls report failures as positive `errno` values, the same
//! way BSD sockets do.  Callers that surface a failure as a return code use
//! the negated value ([`Errno::negated`]).

use std::fmt;
use std::io;

/// A positive platform error number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub i32);

impl Errno {
    pub const ENOENT: Errno = Errno(2);
    pub const EIO: Errno = Errno(5);
    pub const EINVAL: Errno = Errno(22);
    pub const EPROTONOSUPPORT: Errno = Errno(93);
    /// The TLS handshake failed because the peer certificate was not trusted.
    pub const ECONNABORTED: Errno = Errno(103);
    pub const ECONNRESET: Errno = Errno(104);
    pub const ENOTCONN: Errno = Errno(107);
    pub const ETIMEDOUT: Errno = Errno(110);
    pub const ECONNREFUSED: Errno = Errno(111);
    pub const EHOSTUNREACH: Errno = Errno(113);

    pub fn value(self) -> i32 {
        self.0
    }

    /// Returns the negated error number, as reported by connect-style calls.
    pub fn negated(self) -> i32 {
        -self.0
    }
}

impl From<&io::Error> for Errno {
    fn from(err: &io::Error) -> Self {
        if let Some(code) = err.raw_os_error() {
            return Errno(code);
        }
        match err.kind() {
            io::ErrorKind::NotFound => Errno::ENOENT,
            io::ErrorKind::ConnectionRefused => Errno::ECONNREFUSED,
            io::ErrorKind::ConnectionReset => Errno::ECONNRESET,
            io::ErrorKind::ConnectionAborted => Errno::ECONNABORTED,
            io::ErrorKind::NotConnected => Errno::ENOTCONN,
            io::ErrorKind::TimedOut => Errno::ETIMEDOUT,
            io::ErrorKind::InvalidInput => Errno::EINVAL,
            _ => Errno::EIO,
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errno {}", self.0)
    }
}
