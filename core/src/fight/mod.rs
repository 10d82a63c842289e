//! Fight state aggregation: snapshots, primary election, and the phase graph.

mod condition;
mod election;
mod error;
mod manager;
mod phase;
mod recorder;
mod snapshot;

#[cfg(test)]
mod manager_tests;

pub use condition::evaluate;
pub use election::{Election, elect_primary};
pub use error::PhaseGraphError;
pub use manager::{FightRoster, FightStateManager};
pub use phase::{PhaseCallback, PhaseDefinition, PhaseGraph, PhaseGraphBuilder, PhasePredicate};
pub use recorder::PhaseDurationRecorder;
pub use snapshot::{ActorSnapshot, DYING_THRESHOLD, FightState, FightView};
