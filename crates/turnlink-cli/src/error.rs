//! Binary error types.

use std::io;

use thiserror::Error;
use turnlink_app::{SessionError, TransportError};

/// Failures that end the program before or after a session.
#[derive(Debug, Error)]
pub enum CliError {
    /// No serial port was given on the command line or at the prompt.
    #[error("no serial port given")]
    NoPort,

    /// The serial port could not be opened or enumerated.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session ended abnormally.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The console could not be read or written.
    #[error("console I/O failed: {0}")]
    Console(#[from] io::Error),
}
