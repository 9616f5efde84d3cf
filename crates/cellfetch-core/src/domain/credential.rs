//! Security tags and credential types for the modem's secure key store.
//!
//! # What is a security tag? (for beginners)
//!
//! Cellular modems with an offloaded TLS stack keep certificates in their own
//! secure storage instead of in application memory.  Each stored credential
//! is filed under a small integer called a *security tag*.  When a TLS socket
//! is created, the application tells the modem which tags to trust by passing
//! a list of tags as a socket option.  The application never hands the
//! certificate bytes to the socket directly.
//!
//! cellfetch uses exactly one tag and keeps exactly one CA-chain credential
//! under it.

use std::fmt;

/// The security tag the root certificate is provisioned under.
pub const DEFAULT_SECURITY_TAG: SecurityTag = SecurityTag(42);

/// Identifier grouping a TLS credential set in modem storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecurityTag(pub u32);

impl SecurityTag {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SecurityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sec_tag {}", self.0)
    }
}

/// Kind of credential stored under a [`SecurityTag`].
///
/// Only [`CredentialType::CaChain`] is written by cellfetch; the other kinds
/// exist so that store implementations can key their entries faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialType {
    /// Trusted root or intermediate certificates used to verify the peer.
    CaChain,
    /// Client certificate presented to the peer.
    PublicCert,
    /// Private key matching the client certificate.
    PrivateCert,
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialType::CaChain => "CA chain",
            CredentialType::PublicCert => "public certificate",
            CredentialType::PrivateCert => "private key",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_security_tag_is_42() {
        assert_eq!(DEFAULT_SECURITY_TAG.value(), 42);
    }

    #[test]
    fn test_security_tag_display_includes_value() {
        assert_eq!(SecurityTag(7).to_string(), "sec_tag 7");
    }
}
