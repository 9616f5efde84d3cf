//! ServerAddress: the resolved endpoint every connection attempt reuses.
//!
//! The address is resolved once at startup and never refreshed.  If the
//! remote host moves to a different address, every later connection fails
//! until the device restarts.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Address family of a [`ServerAddress`].  Only IPv4 is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
}

/// An IPv4 address plus the configured server port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerAddress {
    ip: Ipv4Addr,
    port: u16,
}

impl ServerAddress {
    /// Creates a new address record.
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::Ipv4
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the address as a socket address suitable for `connect`.
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip, self.port)
    }
}

impl From<SocketAddrV4> for ServerAddress {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

impl From<ServerAddress> for SocketAddr {
    fn from(addr: ServerAddress) -> Self {
        SocketAddr::V4(addr.socket_addr())
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}
