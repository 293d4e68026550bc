//! Receiver loop.
//!
//! Drains the transport one bounded read at a time. Every non-empty line is
//! shown to the operator, stamps the activity time and hands the turn back to
//! the operator. Read failures are reported and reading continues.

use std::time::Duration;

use tokio::time::Instant;

use crate::{
    LineReader, OperatorOutput, ReadOutcome, SessionEvent, TransportError, TurnSignal,
};

/// Pause after a failed read so a dead link does not spin the loop.
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Transport-to-operator half of a session.
pub struct Receiver<R: LineReader, O: OperatorOutput> {
    reader: R,
    signal: TurnSignal,
    output: O,
}

impl<R: LineReader, O: OperatorOutput> Receiver<R, O> {
    /// Create a receiver over a transport read half.
    pub fn new(reader: R, signal: TurnSignal, output: O) -> Self {
        Self { reader, signal, output }
    }

    /// Run until the session ends. Returns the read half for closing.
    ///
    /// The stop flag is checked between reads, so the loop ends within one
    /// read timeout of the session stopping.
    pub async fn run(mut self) -> R {
        tracing::debug!("receiver loop started");
        while !self.signal.is_stopped() {
            if let Err(e) = self.receive().await {
                self.report(&e);
                tokio::time::sleep(READ_ERROR_BACKOFF).await;
            }
        }
        tracing::debug!("receiver loop finished");
        self.reader
    }

    /// Perform one bounded read.
    ///
    /// Returns the received text, or an empty string on a timeout or a blank
    /// line. Only non-empty lines affect shared state.
    pub async fn receive(&mut self) -> Result<String, TransportError> {
        let line = match self.reader.read_line().await? {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Timeout => return Ok(String::new()),
        };

        if !line.is_empty() {
            tracing::debug!(len = line.len(), "line received");
            self.output.notify(SessionEvent::Received(line.clone()));
            self.signal.touch(Instant::now());
            if self.signal.grant() {
                tracing::debug!("turn handed to operator");
            }
        }
        Ok(line)
    }

    /// Perform `count` reads and collect the non-empty lines.
    ///
    /// Failed reads are reported and count towards `count`.
    pub async fn receive_batch(&mut self, count: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for _ in 0..count {
            match self.receive().await {
                Ok(line) if !line.is_empty() => lines.push(line),
                Ok(_) => {},
                Err(e) => self.report(&e),
            }
        }
        lines
    }

    fn report(&self, err: &TransportError) {
        tracing::warn!("error receiving message: {err}");
        self.output.notify(SessionEvent::ReceiveFailed { reason: err.to_string() });
    }
}
