//! Error types for behavior registration

use thiserror::Error;

use crate::actor::ActorType;

/// Startup configuration errors of the override registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a behavior template is already registered for {kind}")]
    DuplicateTemplate { kind: ActorType },
}
