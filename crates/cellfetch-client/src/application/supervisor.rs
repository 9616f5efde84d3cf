//! Supervisor: the forever loop of connect → exchange → close → sleep.
//!
//! # One iteration (for beginners)
//!
//! ```text
//!   Idle ──► Connecting ──► Connected ──► Exchanging ──► Closing ──► Idle
//!                │                                          ▲
//!                └───────────── connect failed ─────────────┘
//! ```
//!
//! - At the top of every iteration the connection line (line 2) is cleared.
//! - Entering `Connected` lights the connection line.
//! - The session is closed on every path before the iteration ends.
//! - After every iteration, whatever the outcome, the loop sleeps for the
//!   fixed `retry_delay`.  There is no backoff, jitter or retry cap.
//!
//! The supervisor owns the cached [`ServerAddress`] and the session; nothing
//! is shared with other tasks apart from the `running` flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cellfetch_core::{
    decode_command, DeviceCommand, HttpRequest, IndicatorLine, LoopState, LoopTrace,
    ServerAddress,
};
use tracing::{debug, error, info, warn};

use crate::application::exchange::{exchange, ExchangeConfig, ExchangeError};
use crate::application::indicator::StatusIndicator;
use crate::application::session::{Session, SessionConfig, SessionError, SocketProvider};

/// Settings for the supervisory loop.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub session: SessionConfig,
    pub exchange: ExchangeConfig,
    /// Fixed sleep after every iteration.
    pub retry_delay: Duration,
    /// `Host` header value of the request.
    pub host_header: String,
    /// Decode the response body and apply it to the indicator.
    pub dispatch_commands: bool,
}

/// How one iteration ended.
#[derive(Debug)]
pub enum IterationResult {
    /// The full response was received.  `command` is set only when command
    /// dispatch is enabled.
    Completed {
        received: usize,
        command: Option<DeviceCommand>,
    },
    /// The session could not be opened.
    ConnectFailed(SessionError),
    /// The session opened but the exchange failed.
    ExchangeFailed(ExchangeError),
}

/// Result of one iteration plus the loop states it passed through.
#[derive(Debug)]
pub struct IterationOutcome {
    pub result: IterationResult,
    pub trace: LoopTrace,
}

/// The supervisory loop.
pub struct Supervisor {
    config: SupervisorConfig,
    server: ServerAddress,
    sockets: Arc<dyn SocketProvider>,
    indicator: StatusIndicator,
    request: HttpRequest,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        server: ServerAddress,
        sockets: Arc<dyn SocketProvider>,
        indicator: StatusIndicator,
    ) -> Self {
        let request = HttpRequest::get(&config.host_header);
        Self {
            config,
            server,
            sockets,
            indicator,
            request,
        }
    }

    pub fn indicator(&self) -> &StatusIndicator {
        &self.indicator
    }

    pub fn server(&self) -> ServerAddress {
        self.server
    }

    /// Runs one connect → exchange → close pass, without the trailing delay.
    pub async fn run_iteration(&mut self) -> IterationOutcome {
        let mut trace = LoopTrace::new();
        self.indicator.set(IndicatorLine::CONNECTION, false);

        enter(&mut trace, LoopState::Connecting);
        info!(server = %self.server, "connecting");
        let opened = Session::open(self.sockets.as_ref(), self.server, &self.config.session).await;
        let mut session = match opened {
            Ok(session) => session,
            Err(e) => {
                warn!(code = e.code(), "{e}");
                enter(&mut trace, LoopState::Closing);
                enter(&mut trace, LoopState::Idle);
                return IterationOutcome {
                    result: IterationResult::ConnectFailed(e),
                    trace,
                };
            }
        };

        enter(&mut trace, LoopState::Connected);
        self.indicator.set(IndicatorLine::CONNECTION, true);

        enter(&mut trace, LoopState::Exchanging);
        let exchanged = exchange(&mut session, &self.request, &self.config.exchange).await;

        enter(&mut trace, LoopState::Closing);
        session.close();

        let result = match exchanged {
            Ok(response) => {
                let command = if self.config.dispatch_commands {
                    let command = decode_command(&response);
                    self.indicator.apply_command(command);
                    Some(command)
                } else {
                    None
                };
                IterationResult::Completed {
                    received: response.len(),
                    command,
                }
            }
            Err(e) => {
                warn!("exchange failed: {e}");
                IterationResult::ExchangeFailed(e)
            }
        };

        enter(&mut trace, LoopState::Idle);
        IterationOutcome { result, trace }
    }

    /// One iteration followed by the fixed delay.
    pub async fn cycle(&mut self) -> IterationOutcome {
        let outcome = self.run_iteration().await;
        debug!(delay = ?self.config.retry_delay, "sleeping before next attempt");
        tokio::time::sleep(self.config.retry_delay).await;
        outcome
    }

    /// Repeats [`cycle`](Self::cycle) until `running` is cleared.
    pub async fn run(&mut self, running: Arc<AtomicBool>) {
        info!(server = %self.server, "supervisor started");
        while running.load(Ordering::Relaxed) {
            self.cycle().await;
        }
        info!("supervisor stopped");
    }
}

/// Records a loop transition.  The iteration only takes legal edges, so a
/// rejected transition is logged rather than propagated.
fn enter(trace: &mut LoopTrace, next: LoopState) {
    if let Err(e) = trace.advance(next) {
        error!("{e}");
    }
}
