//! Transport traits for abstracting the byte-stream link.
//!
//! A [`Transport`] is opened by the caller and handed to the
//! [`Session`](crate::Session), which splits it into a read half for the
//! receiver loop and a write half for the sender loop. Each half is used from
//! exactly one loop, so the two directions never contend.
//!
//! # Implementations
//!
//! - **Serial**: `serialport`-backed link (`serial` feature)
//! - **Simulation**: in-memory link with a scripted remote device

use std::{future::Future, io};

use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The link could not be opened. Fatal before a session starts.
    #[error("failed to open {address}: {reason}")]
    Open {
        /// Device path or address that was requested
        address: String,
        /// Failure description from the platform
        reason: String,
    },

    /// A read failed. Non-fatal, the receiver keeps reading.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// A write failed. Non-fatal, the sender keeps going.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// The half was already released.
    #[error("transport closed")]
    Closed,
}

/// Result of one bounded line read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line, decoded and stripped of trailing whitespace. May be
    /// empty if the device sent a bare newline.
    Line(String),
    /// No complete line arrived within the read window.
    Timeout,
}

/// Read half of a transport.
pub trait LineReader: Send + 'static {
    /// Wait up to the configured read timeout for one line.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport-level read failure. The reader stays
    /// usable afterwards.
    fn read_line(&mut self) -> impl Future<Output = Result<ReadOutcome, TransportError>> + Send;
}

/// Write half of a transport.
pub trait LineWriter: Send + 'static {
    /// Write `line` followed by a single `\n`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes could not be written. The writer stays
    /// usable afterwards.
    fn write_line(&mut self, line: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// An opened bidirectional line transport.
pub trait Transport: Send + 'static {
    /// Read half, owned by the receiver loop.
    type Reader: LineReader;

    /// Write half, owned by the sender loop.
    type Writer: LineWriter;

    /// Split into independently owned halves.
    fn split(self) -> (Self::Reader, Self::Writer);

    /// Close the transport. Called exactly once, after both loops have
    /// returned their halves.
    ///
    /// # Errors
    ///
    /// Returns an error if pending output could not be flushed.
    fn close(reader: Self::Reader, writer: Self::Writer) -> Result<(), TransportError>;
}
