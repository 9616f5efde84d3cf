//! AT interface initialisation and LTE attach.
//!
//! Both run exactly once at startup.  Every step must succeed: the rest of
//! the client assumes an attached link, so any failure here is fatal.
//!
//! # Why disable PSM and eDRX? (for beginners)
//!
//! Power Saving Mode and extended Discontinuous Reception let the modem
//! sleep between network pages.  That saves battery but delays every socket
//! operation by up to the sleep period.  The client polls once per second, so
//! both features are switched off right after the link comes up.

use async_trait::async_trait;
use cellfetch_core::Errno;
use thiserror::Error;
use tracing::info;

/// Control surface of the modem's link layer.
#[async_trait]
pub trait LinkControl: Send + Sync {
    /// Initialises the AT command channel.
    async fn init_at_commands(&self) -> Result<(), Errno>;

    /// Initialises the AT notification channel.
    async fn init_at_notifications(&self) -> Result<(), Errno>;

    /// Brings the LTE link up, blocking until attached or failed.
    async fn init_and_connect(&self) -> Result<(), Errno>;

    /// Requests Power Saving Mode on or off.
    async fn request_psm(&self, enable: bool) -> Result<(), Errno>;

    /// Requests extended DRX on or off.
    async fn request_edrx(&self, enable: bool) -> Result<(), Errno>;
}

/// Errors produced by AT initialisation and LTE attach.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    #[error("AT command interface init failed: {0}")]
    AtCommands(Errno),

    #[error("AT notification interface init failed: {0}")]
    AtNotifications(Errno),

    #[error("LTE link connect failed: {0}")]
    Connect(Errno),

    #[error("failed to disable PSM: {0}")]
    Psm(Errno),

    #[error("failed to disable eDRX: {0}")]
    Edrx(Errno),
}

/// Initialises the AT command and notification channels, in that order.
pub async fn init_at_interface(link: &dyn LinkControl) -> Result<(), AttachError> {
    link.init_at_commands().await.map_err(AttachError::AtCommands)?;
    link.init_at_notifications()
        .await
        .map_err(AttachError::AtNotifications)?;
    info!("AT interface initialised");
    Ok(())
}

/// Attaches to the LTE network, then disables PSM and eDRX.
pub async fn attach_network(link: &dyn LinkControl) -> Result<(), AttachError> {
    info!("waiting for LTE link");
    link.init_and_connect().await.map_err(AttachError::Connect)?;
    link.request_psm(false).await.map_err(AttachError::Psm)?;
    link.request_edrx(false).await.map_err(AttachError::Edrx)?;
    info!("LTE link connected");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
