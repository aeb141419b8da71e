//! Connection/login state machine
//!
//! ```text
//!                 ┌──────────────┐
//!      ┌─────────►│ NotConnected │◄─────────────── (any state: teardown)
//!      │          └──────┬───────┘
//!      │  connect failed │
//!      │          ┌──────▼───────┐
//!      └──────────┤  Connecting  │
//!                 └──────┬───────┘
//!                 ┌──────▼───────┐  "LOGIN:"   ┌────────────────┐
//!                 │  Connected   ├────────────►│ LoginRequested │
//!                 │              │◄────────────┤                │
//!                 └──┬───────┬───┘ creds sent  └───┬────────────┘
//!       "successful" │       │ "incorrect"         │
//!                 ┌──▼─────┐ └──►┌──────────────┐  │
//!                 │LoggedIn│     │ InvalidLogin │◄─┘
//!                 └──┬─────┘     └──────────────┘
//!                    │ "closing connection"
//!                 ┌──▼─────┐
//!                 │Closing │
//!                 └────────┘
//! ```
//!
//! Protocols without a login step stop at `Connected`.

use std::fmt;

use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    NotConnected,
    Connecting,
    /// Socket open, not (yet) logged in
    Connected,
    /// The peer prompted for credentials again
    LoginRequested,
    LoggedIn,
    /// Credentials were rejected on this connection
    InvalidLogin,
    /// The peer announced that it is closing the connection
    Closing,
}

impl SessionState {
    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            // teardown is always allowed
            (from, NotConnected) => from != NotConnected,
            (NotConnected, Connecting) => true,
            (Connecting, Connected) => true,
            (Connected, LoginRequested | LoggedIn | InvalidLogin | Closing) => true,
            (LoginRequested, Connected | LoggedIn | InvalidLogin | Closing) => true,
            (LoggedIn, LoginRequested | InvalidLogin | Closing) => true,
            (InvalidLogin, Closing) => true,
            _ => false,
        }
    }

    pub fn is_connected(self) -> bool {
        !matches!(self, SessionState::NotConnected | SessionState::Connecting)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::NotConnected => "not connected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::LoginRequested => "login requested",
            SessionState::LoggedIn => "logged in",
            SessionState::InvalidLogin => "invalid login",
            SessionState::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Current session state plus change notification
///
/// All transitions go through one watch channel, so checking and applying a
/// transition is atomic and the writer can await state changes.
#[derive(Debug)]
pub struct Session {
    state: watch::Sender<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::NotConnected);
        Self { state }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Move to `next`, returning the previous state
    pub fn transition(&self, next: SessionState) -> Result<SessionState, SessionError> {
        let mut result = Err(SessionError::IllegalTransition {
            from: SessionState::NotConnected,
            to: next,
        });
        self.state.send_if_modified(|current| {
            let from = *current;
            if from.can_transition_to(next) {
                *current = next;
                result = Ok(from);
                true
            } else {
                result = Err(SessionError::IllegalTransition { from, to: next });
                false
            }
        });
        if let Ok(from) = result {
            debug!(%from, to = %next, "Session transition");
        }
        result
    }

    /// Move to `next` only if the current state is `expected`
    ///
    /// Returns `false` without error when the state has moved on.
    pub fn transition_from(
        &self,
        expected: SessionState,
        next: SessionState,
    ) -> Result<bool, SessionError> {
        if !expected.can_transition_to(next) {
            return Err(SessionError::IllegalTransition {
                from: expected,
                to: next,
            });
        }
        let changed = self.state.send_if_modified(|current| {
            if *current == expected {
                *current = next;
                true
            } else {
                false
            }
        });
        if changed {
            debug!(from = %expected, to = %next, "Session transition");
        }
        Ok(changed)
    }

    /// Force `NotConnected`
    pub fn reset(&self) {
        let previous = self.state.send_replace(SessionState::NotConnected);
        if previous != SessionState::NotConnected {
            debug!(from = %previous, "Session reset");
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Session errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Illegal session transition: {from} -> {to}")]
    IllegalTransition {
        from: SessionState,
        to: SessionState,
    },
}
