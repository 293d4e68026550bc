//! Shared turn-taking state.
//!
//! The receiver and sender loops coordinate only through a [`TurnSignal`]:
//! one `watch` channel over a small [`TurnState`] value. The sender waits on it
//! instead of polling, and both loops observe the same storage through clones.
//!
//! # Writers
//!
//! - `send_permitted` is raised only by the receiver ([`TurnSignal::grant`])
//!   and lowered only by the sender ([`TurnSignal::finish_transmit`]).
//! - `stopped` is set once and never cleared.
//!
//! # Replies During A Transmission
//!
//! A fast device can answer before the sender has lowered the signal. A grant
//! that lands between [`TurnSignal::begin_transmit`] and
//! [`TurnSignal::finish_transmit`] is therefore remembered and applied when
//! the transmission finishes, so the reply is never lost. The window opens at
//! the first write of a turn, so lines that arrive while the operator is still
//! typing never count as a reply.

use std::sync::Arc;

use tokio::{sync::watch, time::Instant};

/// Snapshot of the shared turn state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    /// The operator may transmit.
    pub send_permitted: bool,
    /// The session is ending.
    pub stopped: bool,
    /// The sender is between `begin_transmit` and `finish_transmit`.
    pub transmitting: bool,
    /// A non-empty line arrived while `transmitting`.
    pub reply_pending: bool,
    /// When the last non-empty line was received. Observability only.
    pub last_activity: Option<Instant>,
}

impl TurnState {
    fn initial() -> Self {
        Self {
            send_permitted: true,
            stopped: false,
            transmitting: false,
            reply_pending: false,
            last_activity: None,
        }
    }
}

/// Outcome of waiting for the operator's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The operator may transmit.
    Permitted,
    /// The session is ending.
    Stopped,
}

/// Handle to the turn state shared by both loops.
#[derive(Debug, Clone)]
pub struct TurnSignal {
    state: Arc<watch::Sender<TurnState>>,
}

impl Default for TurnSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSignal {
    /// Create a signal. The operator speaks first.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TurnState::initial());
        Self { state: Arc::new(tx) }
    }

    /// Current state.
    pub fn snapshot(&self) -> TurnState {
        *self.state.borrow()
    }

    /// Whether the operator may transmit.
    pub fn is_permitted(&self) -> bool {
        self.state.borrow().send_permitted
    }

    /// Whether the session is ending.
    pub fn is_stopped(&self) -> bool {
        self.state.borrow().stopped
    }

    /// When the last non-empty line was received.
    pub fn last_activity(&self) -> Option<Instant> {
        self.state.borrow().last_activity
    }

    /// Record receive activity.
    pub fn touch(&self, now: Instant) {
        self.state.send_if_modified(|state| {
            state.last_activity = Some(now);
            false
        });
    }

    /// Hand the turn to the operator.
    ///
    /// Returns `true` if the signal was raised by this call. A grant during a
    /// transmission is deferred and returns `false`.
    pub fn grant(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.transmitting {
                state.reply_pending = true;
                false
            } else if state.send_permitted {
                false
            } else {
                state.send_permitted = true;
                true
            }
        })
    }

    /// Mark the start of a transmission, right before its first write.
    ///
    /// Further calls before [`TurnSignal::finish_transmit`] belong to the same
    /// transmission and keep any reply already seen.
    pub fn begin_transmit(&self) {
        self.state.send_if_modified(|state| {
            if !state.transmitting {
                state.transmitting = true;
                state.reply_pending = false;
            }
            false
        });
    }

    /// Mark the end of a transmission and give up the turn.
    ///
    /// Returns `true` if a reply already arrived during the transmission, in
    /// which case the operator keeps the turn.
    pub fn finish_transmit(&self) -> bool {
        let mut replied = false;
        self.state.send_if_modified(|state| {
            replied = state.reply_pending;
            state.send_permitted = state.reply_pending;
            state.transmitting = false;
            state.reply_pending = false;
            false
        });
        replied
    }

    /// End the session. Returns `true` on the first call only.
    pub fn stop(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.stopped {
                false
            } else {
                state.stopped = true;
                true
            }
        })
    }

    /// Wait until the operator may transmit or the session ends.
    pub async fn wait_for_turn(&self) -> Turn {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| state.send_permitted || state.stopped).await {
            Ok(state) if !state.stopped => Turn::Permitted,
            _ => Turn::Stopped,
        }
    }

    /// Wait until the session ends.
    pub async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        // The sender half lives as long as `self`, so this only returns once
        // `stopped` is set.
        let _ = rx.wait_for(|state| state.stopped).await;
    }
}
