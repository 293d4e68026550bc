//! Configuration sub-protocol.
//!
//! The [`ConfigBridge`] turns a `save` command into a file on disk and a
//! `load` command into a JSON message on the transport. It runs inline in the
//! sender loop, before the command line itself is transmitted.

use std::{
    fs,
    path::{Path, PathBuf},
};

use turnlink_core::{ConfigError, GameConfig};

use crate::{LineWriter, OperatorOutput, SessionEvent, Transmitter};

/// Save/load of the game configuration record.
#[derive(Debug, Clone)]
pub struct ConfigBridge<O: OperatorOutput> {
    config_path: PathBuf,
    output: O,
}

impl<O: OperatorOutput> ConfigBridge<O> {
    /// Create a bridge that saves to `config_path`.
    pub fn new(config_path: impl Into<PathBuf>, output: O) -> Self {
        Self { config_path: config_path.into(), output }
    }

    /// File written by [`ConfigBridge::save`].
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Persist the record described by a `save` command line.
    ///
    /// Overwrites the configuration file. Missing parent directories are
    /// created.
    pub fn save(&self, command_line: &str) -> Result<GameConfig, ConfigError> {
        let config = GameConfig::from_save_command(command_line);
        let json = config.to_json()?;

        let write_err = |source| ConfigError::Write { path: self.config_path.clone(), source };
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.config_path, json).map_err(write_err)?;

        tracing::info!(
            path = %self.config_path.display(),
            game_mode = %config.game_mode,
            "configuration saved"
        );
        self.output.notify(SessionEvent::ConfigSaved { path: self.config_path.clone() });
        Ok(config)
    }

    /// Read a record from `path` and transmit its wire form.
    ///
    /// A missing file is reported without touching the file system further or
    /// the transport. A malformed file is never transmitted.
    pub async fn load<W: LineWriter>(
        &self,
        path: &Path,
        transmitter: &mut Transmitter<W, O>,
    ) -> Result<GameConfig, ConfigError> {
        match path.try_exists() {
            Ok(true) => {},
            Ok(false) => return Err(ConfigError::NotFound { path: path.to_path_buf() }),
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        }

        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = GameConfig::from_json(&text)?;
        let json = config.to_json()?;

        tracing::info!(path = %path.display(), game_mode = %config.game_mode, "configuration loaded");
        self.output.notify(SessionEvent::ConfigLoaded { config, json: json.clone() });

        transmitter.transmit(&json).await;
        Ok(config)
    }

    /// Report a failed save to the operator.
    pub fn report_save(&self, err: &ConfigError) {
        tracing::warn!("error saving configuration: {err}");
        self.output.notify(SessionEvent::SaveFailed { reason: err.to_string() });
    }

    /// Report a failed load to the operator.
    pub fn report_load(&self, err: &ConfigError) {
        tracing::warn!("error loading configuration: {err}");
        let event = match err {
            ConfigError::NotFound { path } => SessionEvent::ConfigNotFound { path: path.clone() },
            _ => SessionEvent::LoadFailed { reason: err.to_string() },
        };
        self.output.notify(event);
    }
}
