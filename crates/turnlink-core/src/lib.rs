//! Core types for turnlink
//!
//! Sans-IO building blocks shared by the session runtime and its test
//! harness. Nothing in this crate touches a file descriptor or a clock.
//!
//! # Components
//!
//! - [`GameConfig`]: Persisted configuration record and its JSON wire form
//! - [`Command`]: Classification of operator input lines
//! - [`LineFramer`]: Newline framing for the byte-stream transport
//! - [`ConfigError`]: Failures of the configuration sub-protocol

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod config;
pub mod error;
pub mod wire;

pub use command::Command;
pub use config::{DEFAULT_CONFIG_PATH, GameConfig, GameMode};
pub use error::ConfigError;
pub use wire::{LineFramer, decode_line, encode_line};
