//! Persisted harness defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_NAME: &str = "exomech";
const CONFIG_NAME: &str = "settings";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to save settings")]
    Save(#[source] confy::ConfyError),
}

/// Defaults used when a `run` flag is omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub seed: u64,
    pub ticks: u64,
    /// Fight definition file; the bundled definition when unset.
    #[serde(default)]
    pub definition: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0,
            ticks: 3_600,
            definition: None,
        }
    }
}

impl Settings {
    /// Stored settings, or defaults if none exist or they fail to parse.
    pub fn load() -> Self {
        confy::load(APP_NAME, CONFIG_NAME).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to load settings, using defaults");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(SettingsError::Save)
    }

    pub fn path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).ok()
    }
}
