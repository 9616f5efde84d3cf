//! Credential provisioning: replace the root certificate under the security tag.
//!
//! # Why delete before writing? (for beginners)
//!
//! The modem's key store refuses to overwrite a credential in place, and a
//! stale CA chain left next to a new one would make peer verification depend
//! on whichever entry the modem happens to pick.  Provisioning therefore
//! always removes what is already filed under the tag before writing, so
//! exactly one CA-chain credential exists under the tag afterwards.
//!
//! A failed delete aborts provisioning; nothing is written on top of an entry
//! that could not be removed.

use async_trait::async_trait;
use cellfetch_core::{CredentialType, Errno, SecurityTag};
use thiserror::Error;
use tracing::{debug, info};

/// Modem-resident secure credential storage.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `true` if a credential of `kind` exists under `tag`.
    async fn exists(&self, tag: SecurityTag, kind: CredentialType) -> Result<bool, Errno>;

    /// Deletes the credential of `kind` under `tag`.
    async fn delete(&self, tag: SecurityTag, kind: CredentialType) -> Result<(), Errno>;

    /// Writes `content` as the credential of `kind` under `tag`.
    async fn write(&self, tag: SecurityTag, kind: CredentialType, content: &[u8])
        -> Result<(), Errno>;
}

/// Errors produced while provisioning the root certificate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("root certificate is empty")]
    EmptyCertificate,

    #[error("failed to query credential under {tag}: {errno}")]
    Query { tag: SecurityTag, errno: Errno },

    #[error("failed to delete existing credential under {tag}: {errno}")]
    Delete { tag: SecurityTag, errno: Errno },

    #[error("failed to write root certificate under {tag}: {errno}")]
    Write { tag: SecurityTag, errno: Errno },
}

/// Stores `certificate` as the only CA-chain credential under `tag`.
///
/// # Errors
///
/// Returns [`ProvisionError`] describing the step that failed.  Provisioning
/// is not retried.
pub async fn provision_root_certificate(
    store: &dyn CredentialStore,
    tag: SecurityTag,
    certificate: &[u8],
) -> Result<(), ProvisionError> {
    if certificate.is_empty() {
        return Err(ProvisionError::EmptyCertificate);
    }

    let kind = CredentialType::CaChain;
    let exists = store
        .exists(tag, kind)
        .await
        .map_err(|errno| ProvisionError::Query { tag, errno })?;

    if exists {
        debug!(%tag, "removing existing {kind}");
        store
            .delete(tag, kind)
            .await
            .map_err(|errno| ProvisionError::Delete { tag, errno })?;
    }

    store
        .write(tag, kind, certificate)
        .await
        .map_err(|errno| ProvisionError::Write { tag, errno })?;

    info!(%tag, bytes = certificate.len(), "root certificate provisioned");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
