//! Sender loop.
//!
//! Waits for the operator's turn, reads one operator line, runs any
//! configuration command it names, transmits the line and gives up the turn.
//!
//! # Ordering
//!
//! For `load`, two messages reach the transport for one operator line: the
//! JSON payload first, then the literal command line. `exit` is never
//! transmitted.

use std::path::Path;

use turnlink_core::Command;

use crate::{
    ConfigBridge, LineWriter, OperatorInput, OperatorOutput, SessionEvent, Turn, TurnSignal,
};

/// Write path shared by the sender loop and the configuration bridge.
///
/// Every write opens the transmission on the turn signal first. Write
/// failures are reported to the operator here and never propagate.
#[derive(Debug)]
pub struct Transmitter<W: LineWriter, O: OperatorOutput> {
    writer: W,
    signal: TurnSignal,
    output: O,
}

impl<W: LineWriter, O: OperatorOutput> Transmitter<W, O> {
    /// Wrap a transport write half.
    pub fn new(writer: W, signal: TurnSignal, output: O) -> Self {
        Self { writer, signal, output }
    }

    /// Transmit one line. Returns `false` if the write failed.
    pub async fn transmit(&mut self, line: &str) -> bool {
        self.signal.begin_transmit();
        match self.writer.write_line(line).await {
            Ok(()) => {
                tracing::debug!(len = line.len(), "line sent");
                true
            },
            Err(e) => {
                tracing::warn!("error sending message: {e}");
                self.output.notify(SessionEvent::SendFailed { reason: e.to_string() });
                false
            },
        }
    }

    /// Release the write half.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Whether the sender loop continues after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Wait for the next turn.
    Continue,
    /// The session is ending.
    Exit,
}

/// Operator-to-transport half of a session.
pub struct Sender<I, W, O>
where
    I: OperatorInput,
    W: LineWriter,
    O: OperatorOutput,
{
    input: I,
    transmitter: Transmitter<W, O>,
    bridge: ConfigBridge<O>,
    signal: TurnSignal,
    output: O,
}

impl<I, W, O> Sender<I, W, O>
where
    I: OperatorInput,
    W: LineWriter,
    O: OperatorOutput,
{
    /// Create a sender over a transport write half.
    pub fn new(input: I, writer: W, bridge: ConfigBridge<O>, signal: TurnSignal, output: O) -> Self {
        let transmitter = Transmitter::new(writer, signal.clone(), output.clone());
        Self { input, transmitter, bridge, signal, output }
    }

    /// Run until the session ends. Returns the write half for closing.
    pub async fn run(mut self) -> W {
        tracing::debug!("sender loop started");
        while self.step().await == Step::Continue {}
        tracing::debug!("sender loop finished");
        self.transmitter.into_writer()
    }

    /// Wait for the operator's turn and handle one input line.
    pub async fn step(&mut self) -> Step {
        if self.signal.wait_for_turn().await == Turn::Stopped {
            return Step::Exit;
        }

        match self.next_operator_line().await {
            Some(line) => self.handle_line(&line).await,
            None => {
                self.signal.stop();
                Step::Exit
            },
        }
    }

    /// Handle one operator line. The caller must hold the turn.
    pub async fn handle_line(&mut self, line: &str) -> Step {
        let command = Command::classify(line);
        if command == Command::Exit {
            tracing::info!("operator requested exit");
            self.output.notify(SessionEvent::Exiting);
            self.signal.stop();
            return Step::Exit;
        }

        let step = self.dispatch(command, line).await;
        if self.signal.finish_transmit() {
            tracing::debug!("reply arrived during transmission, turn kept");
        }
        step
    }

    async fn dispatch(&mut self, command: Command, line: &str) -> Step {
        match command {
            Command::Save => {
                if let Err(e) = self.bridge.save(line) {
                    self.bridge.report_save(&e);
                }
            },
            Command::Load => {
                self.output.notify(SessionEvent::PathPrompt);
                let Some(path) = self.next_operator_line().await else {
                    self.signal.stop();
                    return Step::Exit;
                };
                if let Err(e) = self.bridge.load(Path::new(&path), &mut self.transmitter).await {
                    self.bridge.report_load(&e);
                }
            },
            Command::Exit | Command::Text => {},
        }

        self.transmitter.transmit(line).await;
        Step::Continue
    }

    /// Next operator line, or `None` if input ended or the session stopped.
    ///
    /// A line that cannot be read is reported and skipped.
    async fn next_operator_line(&mut self) -> Option<String> {
        loop {
            tokio::select! {
                biased;

                () = self.signal.stopped() => return None,

                line = self.input.next_line() => match line {
                    Ok(Some(line)) => return Some(line),
                    Ok(None) => {
                        tracing::info!("operator input closed");
                        return None;
                    },
                    Err(e) => {
                        tracing::warn!("failed to read operator input: {e}");
                        self.output.notify(SessionEvent::InputFailed { reason: e.to_string() });
                    },
                },
            }
        }
    }
}
