//! Session lifecycle.
//!
//! A [`Session`] owns an opened transport for one run. [`Session::run`] splits
//! it, spawns the receiver and sender loops as tasks, waits for the session to
//! end (operator `exit`, end of input or an external shutdown), joins both
//! loops and only then closes the transport.

use std::{future::Future, path::PathBuf};

use thiserror::Error;
use tokio::task::JoinError;
use turnlink_core::DEFAULT_CONFIG_PATH;

use crate::{
    ConfigBridge, OperatorInput, OperatorOutput, Receiver, Sender, SessionEvent, Transport,
    TransportError, TurnSignal,
};

/// Session errors. None of these can occur while the loops are healthy.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A loop task panicked or was cancelled.
    #[error("session task failed: {0}")]
    Task(#[from] JoinError),

    /// The transport failed to close cleanly.
    #[error("failed to close transport: {0}")]
    Close(#[source] TransportError),
}

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Where `save` writes the configuration record.
    pub config_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { config_path: PathBuf::from(DEFAULT_CONFIG_PATH) }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The operator typed `exit` or closed input.
    Exited,
    /// The shutdown future resolved first.
    Interrupted,
}

/// One run of the messaging loop, from transport open to transport close.
pub struct Session<T: Transport, O: OperatorOutput> {
    transport: T,
    output: O,
    signal: TurnSignal,
    config: SessionConfig,
}

impl<T: Transport, O: OperatorOutput> Session<T, O> {
    /// Create a session over an opened transport.
    pub fn new(transport: T, output: O, config: SessionConfig) -> Self {
        Self { transport, output, signal: TurnSignal::new(), config }
    }

    /// Handle to the turn state shared by both loops.
    pub fn signal(&self) -> TurnSignal {
        self.signal.clone()
    }

    /// Run both loops to completion and close the transport.
    ///
    /// `shutdown` is raced against the session; when it resolves first, the
    /// session is stopped as if the operator had typed `exit`.
    pub async fn run<I, S>(self, input: I, shutdown: S) -> Result<SessionEnd, SessionError>
    where
        I: OperatorInput,
        S: Future<Output = ()>,
    {
        let Self { transport, output, signal, config } = self;
        let (reader, writer) = transport.split();

        let receiver = Receiver::new(reader, signal.clone(), output.clone());
        let bridge = ConfigBridge::new(config.config_path, output.clone());
        let sender = Sender::new(input, writer, bridge, signal.clone(), output.clone());

        tracing::info!("session started");
        let receiver_task = tokio::spawn(receiver.run());
        let sender_task = tokio::spawn(sender.run());

        let end = tokio::select! {
            () = signal.stopped() => SessionEnd::Exited,
            () = shutdown => {
                tracing::info!("session interrupted");
                output.notify(SessionEvent::Interrupted);
                signal.stop();
                SessionEnd::Interrupted
            },
        };

        let (reader, writer) = match tokio::try_join!(receiver_task, sender_task) {
            Ok(halves) => halves,
            Err(e) => {
                tracing::error!("session task failed: {e}");
                signal.stop();
                return Err(SessionError::Task(e));
            },
        };

        output.notify(SessionEvent::Closing);
        T::close(reader, writer).map_err(SessionError::Close)?;
        tracing::info!(?end, "session closed");
        Ok(end)
    }
}
