//! Compilation of definition-file phase conditions into predicates.

use exomech_types::{FightDefinition, PhaseCondition};

use super::error::PhaseGraphError;
use super::phase::{PhaseDefinition, PhaseGraph};
use super::snapshot::FightState;

/// Evaluate a condition against one snapshot.
pub fn evaluate(condition: &PhaseCondition, state: &FightState) -> bool {
    match condition {
        PhaseCondition::Always => true,
        PhaseCondition::Never => false,
        PhaseCondition::PrimaryHealthBelow { fraction } => {
            state.primary.ever_existed && state.primary.health_fraction <= *fraction
        }
        PhaseCondition::AnyHealthBelow { fraction } => state
            .all()
            .any(|s| s.ever_existed && s.health_fraction <= *fraction),
        PhaseCondition::DefeatedAtLeast { count } => state.defeated_count() >= *count as usize,
        PhaseCondition::AllDefeated => state.all_defeated(),
        PhaseCondition::NarratorIn { states } => state
            .narrator_state
            .is_some_and(|current| states.contains(&current)),
        PhaseCondition::AllOf { conditions } => conditions.iter().all(|c| evaluate(c, state)),
        PhaseCondition::AnyOf { conditions } => conditions.iter().any(|c| evaluate(c, state)),
        PhaseCondition::Not { condition } => !evaluate(condition, state),
    }
}

impl PhaseGraph {
    /// Build a graph from the `[[phase]]` tables of a definition.
    pub fn from_definition(definition: &FightDefinition) -> Result<Self, PhaseGraphError> {
        definition
            .phases
            .iter()
            .fold(PhaseGraph::builder(), |builder, config| {
                let condition = config.condition.clone();
                builder.phase(PhaseDefinition::new(
                    config.ordering,
                    config.name.clone(),
                    move |state| evaluate(&condition, state),
                ))
            })
            .build()
    }
}
