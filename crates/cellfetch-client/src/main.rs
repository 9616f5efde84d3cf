//! cellfetch client entry point.
//!
//! Loads the configuration, brings the modem up and hands control to the
//! supervisory loop, which only returns on Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config("cellfetch.toml")   -- defaults if the file is absent
//!  └─ StatusIndicator::init()         -- power line on; failure is logged
//!  └─ bring_up()                      -- AT init, provision, attach, resolve
//!  │    └─ Err(StartupError)          -- logged, process exits non-zero
//!  └─ Supervisor::run()               -- connect → exchange → close → sleep
//! ```
//!
//! # Single-threaded runtime (for beginners)
//!
//! Only one request is ever in flight, so the binary runs on Tokio's
//! `current_thread` runtime.  Every step is awaited in sequence; the only
//! other task is the Ctrl-C handler that clears the `running` flag.

use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cellfetch_client::application::indicator::StatusIndicator;
use cellfetch_client::application::startup::bring_up;
use cellfetch_client::application::supervisor::{Supervisor, SupervisorConfig};
use cellfetch_client::infrastructure::config::{load_config, CONFIG_FILE_NAME, EMBEDDED_ROOT_CA};
use cellfetch_client::infrastructure::indicator::log::LogIndicatorPins;
use cellfetch_client::infrastructure::modem::host::HostModem;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = load_config(Path::new(CONFIG_FILE_NAME))
        .with_context(|| format!("loading {CONFIG_FILE_NAME}"))?;

    // Initialise structured logging.  RUST_LOG wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    info!(
        host = %config.server.host,
        port = config.server.port,
        tls = config.server.tls_enabled,
        "cellfetch client starting"
    );

    // ── Status indicator ──────────────────────────────────────────────────────
    let mut indicator = StatusIndicator::new(Arc::new(LogIndicatorPins::new()));
    if let Err(e) = indicator.init() {
        warn!("status indicator unavailable: {e}");
    }

    // ── Startup sequence ──────────────────────────────────────────────────────
    let modem = Arc::new(HostModem::new());
    let plan = config.startup_plan(EMBEDDED_ROOT_CA);
    let server = match bring_up(modem.as_ref(), modem.as_ref(), modem.as_ref(), &plan).await {
        Ok(server) => server,
        Err(e) => {
            error!("startup failed: {e}");
            return Err(e).context("startup failed");
        }
    };

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── Supervisory loop ──────────────────────────────────────────────────────
    let mut supervisor = Supervisor::new(SupervisorConfig::from(&config), server, modem, indicator);
    supervisor.run(running).await;

    info!("cellfetch client stopped");
    Ok(())
}
