use thiserror::Error;

use crate::behavior::RegistryError;
use crate::config::DefinitionError;
use crate::fight::PhaseGraphError;

/// Errors while assembling an encounter
#[derive(Debug, Error)]
pub enum EncounterError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("failed to register behavior templates")]
    Registry(#[from] RegistryError),

    #[error("failed to build phase graph")]
    PhaseGraph(#[from] PhaseGraphError),
}
