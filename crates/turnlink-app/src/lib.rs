//! Session runtime for turnlink
//!
//! Drives a half-duplex conversation between one operator and one remote
//! device over a line transport. A receiver loop drains the transport and a
//! sender loop forwards operator lines, taking turns through a shared
//! [`TurnSignal`].
//!
//! # Components
//!
//! - [`Session`]: Owns the transport, spawns both loops and closes the
//!   transport once they have finished
//! - [`Receiver`]: Reads lines and hands the turn back to the operator
//! - [`Sender`]: Classifies operator lines, transmits them and yields the turn
//! - [`ConfigBridge`]: Save/load of the game configuration record
//! - [`Transport`], [`OperatorInput`], [`OperatorOutput`]: I/O seams
//!   implemented by the binary and by the simulation harness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bridge;
mod operator;
mod receiver;
mod sender;
mod session;
mod signal;
mod transport;

#[cfg(feature = "serial")]
pub mod serial;

pub use bridge::ConfigBridge;
pub use operator::{OperatorInput, OperatorOutput, SessionEvent};
pub use receiver::Receiver;
pub use sender::{Sender, Step, Transmitter};
pub use session::{Session, SessionConfig, SessionEnd, SessionError};
pub use signal::{Turn, TurnSignal, TurnState};
pub use transport::{LineReader, LineWriter, ReadOutcome, Transport, TransportError};
