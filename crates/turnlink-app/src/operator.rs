//! Operator I/O seams.
//!
//! Input is a stream of lines owned by the sender loop. Output is a cloneable
//! sink shared by both loops; everything the operator should see is expressed
//! as a [`SessionEvent`] and rendered by the implementation.

use std::{future::Future, io, path::PathBuf};

use turnlink_core::GameConfig;

/// Source of operator input lines.
pub trait OperatorInput: Send + 'static {
    /// Wait for the next line, without its line terminator.
    ///
    /// Returns `None` once input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if one line could not be read. Input stays usable
    /// afterwards; an unrecoverable console ends with `None` instead.
    fn next_line(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send;
}

/// Sink for everything shown to the operator.
pub trait OperatorOutput: Clone + Send + Sync + 'static {
    /// Surface one event.
    fn notify(&self, event: SessionEvent);
}

/// Events surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Non-empty line received from the remote device.
    Received(String),

    /// Waiting for the operator to type a configuration file path.
    PathPrompt,

    /// Configuration written.
    ConfigSaved {
        /// Destination file.
        path: PathBuf,
    },

    /// Saving failed; nothing was written.
    SaveFailed {
        /// Failure description.
        reason: String,
    },

    /// Configuration read and about to be transmitted.
    ConfigLoaded {
        /// Decoded record.
        config: GameConfig,
        /// Wire form that will be transmitted.
        json: String,
    },

    /// The path given to `load` does not exist.
    ConfigNotFound {
        /// Path the operator supplied.
        path: PathBuf,
    },

    /// Loading failed after the file was found; nothing was transmitted.
    LoadFailed {
        /// Failure description.
        reason: String,
    },

    /// A transport read failed.
    ReceiveFailed {
        /// Failure description.
        reason: String,
    },

    /// A transport write failed.
    SendFailed {
        /// Failure description.
        reason: String,
    },

    /// Operator input could not be read.
    InputFailed {
        /// Failure description.
        reason: String,
    },

    /// The operator asked to leave.
    Exiting,

    /// The session was interrupted from outside.
    Interrupted,

    /// The transport is about to be closed.
    Closing,
}
