//! Simulation harness for turnlink session testing.
//!
//! In-memory implementations of the transport and operator seams so the same
//! [`turnlink_app::Session`] code that drives a serial port runs against a
//! scripted remote device and a scripted operator.
//!
//! # Components
//!
//! - [`sim_link`]: A [`SimTransport`] paired with a [`RemoteDevice`] handle
//!   that plays the far end of the wire, with fault injection
//! - [`operator`]: [`ScriptedOperator`] input and [`RecordingOutput`] sink

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod operator;
pub mod sim_link;

pub use operator::{OperatorHandle, RecordingOutput, ScriptedOperator};
pub use sim_link::{RemoteDevice, SimReader, SimTransport, SimWriter, WireRecord, link};
