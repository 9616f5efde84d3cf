//! States of the supervisory loop and the legal moves between them.
//!
//! ```text
//!            ┌──────────── connect failed ────────────┐
//!            │                                        ▼
//! Idle ─▶ Connecting ─▶ Connected ─▶ Exchanging ─▶ Closing ─▶ (delay) ─▶ Idle
//! ```
//!
//! There is no terminal state.  Every iteration starts and ends in `Idle`,
//! and `Closing` is always visited, so the socket is released on every path.

use thiserror::Error;

/// One state of the supervisory loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next iteration; no socket exists.
    Idle,
    /// Creating the socket, applying TLS options and connecting.
    Connecting,
    /// The socket is connected; the connection line is on.
    Connected,
    /// Sending the request and reading the response.
    Exchanging,
    /// Closing the socket, whatever the outcome.
    Closing,
}

impl LoopState {
    /// Returns `true` if the loop may move from `self` to `next`.
    pub fn can_transition_to(self, next: LoopState) -> bool {
        use LoopState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Connected)
                | (Connecting, Closing)
                | (Connected, Exchanging)
                | (Exchanging, Closing)
                | (Closing, Idle)
        )
    }
}

/// Rejected state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal loop transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: LoopState,
    pub to: LoopState,
}

/// The path one iteration took through the state table.
///
/// A trace always starts in [`LoopState::Idle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopTrace {
    states: Vec<LoopState>,
}

impl LoopTrace {
    pub fn new() -> Self {
        Self {
            states: vec![LoopState::Idle],
        }
    }

    /// The state the iteration is currently in.
    pub fn current(&self) -> LoopState {
        // A trace is never empty.
        self.states[self.states.len() - 1]
    }

    /// Moves to `next`, rejecting moves the state table does not allow.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] and leaves the trace unchanged if the
    /// move is illegal.
    pub fn advance(&mut self, next: LoopState) -> Result<(), InvalidTransition> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(InvalidTransition { from, to: next });
        }
        tracing::trace!(?from, to = ?next, "loop transition");
        self.states.push(next);
        Ok(())
    }

    pub fn states(&self) -> &[LoopState] {
        &self.states
    }

    /// Returns `true` if the iteration passed through `state`.
    pub fn visited(&self, state: LoopState) -> bool {
        self.states.contains(&state)
    }
}

impl Default for LoopTrace {
    fn default() -> Self {
        Self::new()
    }
}
