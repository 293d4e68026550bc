//! Scripted operator for simulation.
//!
//! [`ScriptedOperator`] feeds lines to the sender loop as if typed at a
//! console; [`RecordingOutput`] captures every [`SessionEvent`] so tests can
//! assert on what the operator would have seen.

use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{Notify, mpsc};
use turnlink_app::{OperatorInput, OperatorOutput, SessionEvent};

/// Operator input driven by the test.
///
/// Input ends once every [`OperatorHandle`] has been dropped and all queued
/// lines are consumed.
pub struct ScriptedOperator {
    lines: mpsc::UnboundedReceiver<io::Result<String>>,
}

/// Test-side handle for typing into a [`ScriptedOperator`].
#[derive(Clone)]
pub struct OperatorHandle {
    tx: mpsc::UnboundedSender<io::Result<String>>,
}

impl ScriptedOperator {
    /// Create an operator with an open input.
    pub fn new() -> (Self, OperatorHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { lines: rx }, OperatorHandle { tx })
    }

    /// Create an operator that types `lines` and then closes its input.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (operator, handle) = Self::new();
        for line in lines {
            handle.type_line(line);
        }
        operator
    }
}

impl OperatorHandle {
    /// Queue one line.
    pub fn type_line(&self, line: impl Into<String>) {
        let _ = self.tx.send(Ok(line.into()));
    }

    /// Make the next read of operator input fail.
    pub fn fail(&self, kind: io::ErrorKind) {
        let _ = self.tx.send(Err(io::Error::new(kind, "injected input fault")));
    }
}

impl OperatorInput for ScriptedOperator {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.recv().await.transpose()
    }
}

/// Operator output that records every event.
#[derive(Clone, Default)]
pub struct RecordingOutput {
    events: Arc<Mutex<Vec<SessionEvent>>>,
    changed: Arc<Notify>,
}

impl RecordingOutput {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SessionEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every event so far, oldest first.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.lock().clone()
    }

    /// Lines shown as received from the device.
    pub fn received(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Received(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether any recorded event satisfies `predicate`.
    pub fn contains(&self, predicate: impl Fn(&SessionEvent) -> bool) -> bool {
        self.lock().iter().any(predicate)
    }

    /// Wait until a recorded event satisfies `predicate`.
    pub async fn wait_for(&self, predicate: impl Fn(&SessionEvent) -> bool) {
        loop {
            let changed = self.changed.notified();
            if self.contains(&predicate) {
                return;
            }
            changed.await;
        }
    }
}

impl OperatorOutput for RecordingOutput {
    fn notify(&self, event: SessionEvent) {
        tracing::trace!(?event, "operator event");
        self.lock().push(event);
        self.changed.notify_waiters();
    }
}
