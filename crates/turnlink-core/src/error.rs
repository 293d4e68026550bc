//! Error types for the configuration sub-protocol.
//!
//! Every variant is non-fatal to a session: the caller reports it to the
//! operator and the owning loop carries on with its next iteration.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while saving or loading a [`crate::GameConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The requested configuration file does not exist.
    ///
    /// Nothing is read and nothing is transmitted.
    #[error("configuration file not found: {}", .path.display())]
    NotFound {
        /// Path the operator supplied
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// The configuration file could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Path that was written
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// The file content is not a valid configuration record.
    #[error("malformed configuration: {0}")]
    Parse(#[source] serde_json::Error),

    /// The record could not be encoded as JSON.
    #[error("failed to encode configuration: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ConfigError {
    /// Returns true if the error means the file simply was not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
