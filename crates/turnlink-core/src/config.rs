//! Game configuration record.
//!
//! The record is tiny and has no identity beyond its single file slot: it is
//! materialized from a `save` command or a file, used once and discarded.
//!
//! # Wire Form
//!
//! The remote device expects the JSON layout it has always received: `": "`
//! between key and value, `", "` between members and non-ASCII characters
//! escaped as `\uXXXX`. [`GameConfig::to_json`] produces exactly that text for
//! both the file and the transport.

use std::{fmt, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ConfigError;

/// Fixed location of the saved configuration.
pub const DEFAULT_CONFIG_PATH: &str = "config/game_config.json";

/// Game mode selector. Only `0`, `1` and `2` are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GameMode(u8);

/// Rejected game mode value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("game mode must be between 0 and {max}, got {0}", max = GameMode::MAX)]
pub struct InvalidGameMode(pub u8);

impl GameMode {
    /// Highest valid mode.
    pub const MAX: u8 = 2;

    /// Create a mode, or `None` if `value` is out of range.
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    /// Parse a `save` command argument. Only the exact tokens `0`, `1` and
    /// `2` are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "0" => Some(Self(0)),
            "1" => Some(Self(1)),
            "2" => Some(Self(2)),
            _ => None,
        }
    }

    /// Numeric value.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for GameMode {
    type Error = InvalidGameMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidGameMode(value))
    }
}

impl From<GameMode> for u8 {
    fn from(mode: GameMode) -> Self {
        mode.0
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted game configuration exchanged with the remote device.
///
/// Missing fields fall back to [`GameConfig::default`] when decoding; unknown
/// fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Selected game mode.
    pub game_mode: GameMode,
    /// Symbol drawn for player one.
    pub player1_symbol: char,
    /// Symbol drawn for player two.
    pub player2_symbol: char,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { game_mode: GameMode::default(), player1_symbol: 'X', player2_symbol: 'O' }
    }
}

impl GameConfig {
    /// Build a record from a `save` command line.
    ///
    /// `save <mode>` with exactly two whitespace-separated tokens and a valid
    /// mode token sets the mode. Anything else yields the default record.
    /// Player symbols are never taken from the command.
    pub fn from_save_command(line: &str) -> Self {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let game_mode = match tokens.as_slice() {
            [_, token] => GameMode::from_token(token).unwrap_or_default(),
            _ => GameMode::default(),
        };
        Self { game_mode, ..Self::default() }
    }

    /// Decode a record from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }

    /// Encode the record in its wire form.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let mut buf = Vec::with_capacity(64);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, WireFormatter);
        self.serialize(&mut serializer).map_err(ConfigError::Encode)?;
        String::from_utf8(buf)
            .map_err(|e| ConfigError::Encode(<serde_json::Error as serde::ser::Error>::custom(e)))
    }
}

/// JSON formatter for the device wire form.
struct WireFormatter;

impl serde_json::ser::Formatter for WireFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        let mut utf8 = [0u8; 4];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(c.encode_utf8(&mut utf8).as_bytes())?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}
