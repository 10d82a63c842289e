//! Error types for fight definition loading

use std::path::PathBuf;
use thiserror::Error;

use crate::fight::PhaseGraphError;

/// Errors during fight definition loading
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read fight definition {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fight definition TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read definition directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fight definition in {path}: {reason}")]
    InvalidDefinition { path: PathBuf, reason: String },

    #[error("invalid phase graph in {path}")]
    PhaseGraph {
        path: PathBuf,
        #[source]
        source: PhaseGraphError,
    },
}
