//! One-shot bring-up: AT init → provisioning → LTE attach → resolve.
//!
//! Any failure here is startup-fatal.  The caller (the binary) logs the
//! [`StartupError`] and halts; there is no degraded mode.
//!
//! The credential is written before the radio comes up: the modem only
//! accepts key store writes while the link is offline.

use cellfetch_core::{SecurityTag, ServerAddress};
use thiserror::Error;
use tracing::info;

use crate::application::attach::{attach_network, init_at_interface, AttachError, LinkControl};
use crate::application::provision::{provision_root_certificate, CredentialStore, ProvisionError};
use crate::application::resolve::{resolve_server, HostResolver, ResolveError};

/// A startup step failed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("network attach failed: {0}")]
    Attach(#[from] AttachError),

    #[error("certificate provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("address resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

/// What to bring up.
#[derive(Debug, Clone)]
pub struct StartupPlan {
    pub server_host: String,
    pub server_port: u16,
    pub security_tag: SecurityTag,
    /// PEM root certificate provisioned under `security_tag`.
    pub root_certificate: Vec<u8>,
}

/// Runs the startup sequence and returns the server address to poll.
pub async fn bring_up(
    link: &dyn LinkControl,
    store: &dyn CredentialStore,
    resolver: &dyn HostResolver,
    plan: &StartupPlan,
) -> Result<ServerAddress, StartupError> {
    init_at_interface(link).await?;

    provision_root_certificate(store, plan.security_tag, &plan.root_certificate).await?;

    attach_network(link).await?;

    let server = resolve_server(resolver, &plan.server_host, plan.server_port).await?;
    info!(%server, "startup complete");
    Ok(server)
}
