//! Address resolution: hostname → first IPv4 address, resolved once.

use std::io;
use std::net::Ipv4Addr;

use async_trait::async_trait;
use cellfetch_core::{Errno, ServerAddress};
use thiserror::Error;
use tracing::info;

/// Name resolution service.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Returns the IPv4 addresses `host` resolves to, in resolver order.
    async fn lookup_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>>;
}

/// Errors produced while resolving the server hostname.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{host} resolved to no IPv4 address")]
    NotFound { host: String },

    #[error("lookup of {host} failed: {source}")]
    Io {
        host: String,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Platform error number describing the failure.
    pub fn errno(&self) -> Errno {
        match self {
            ResolveError::NotFound { .. } => Errno::ENOENT,
            ResolveError::Io { source, .. } => Errno::from(source),
        }
    }
}

/// Resolves `host` and pairs the first IPv4 result with `port`.
///
/// Any further addresses are ignored.
pub async fn resolve_server(
    resolver: &dyn HostResolver,
    host: &str,
    port: u16,
) -> Result<ServerAddress, ResolveError> {
    let addresses = resolver
        .lookup_ipv4(host)
        .await
        .map_err(|source| ResolveError::Io {
            host: host.to_string(),
            source,
        })?;

    let first = addresses.first().copied().ok_or_else(|| ResolveError::NotFound {
        host: host.to_string(),
    })?;

    let server = ServerAddress::new(first, port);
    info!(%host, %server, candidates = addresses.len(), "server address resolved");
    Ok(server)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
