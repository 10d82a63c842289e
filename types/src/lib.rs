//! Shared fight definition types
//!
//! This crate contains the serializable types shared between the encounter
//! core (exomech-core) and the scenario harness. Everything here is plain data;
//! the core compiles it into runtime structures.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Actor Types
// ─────────────────────────────────────────────────────────────────────────────

/// Type tag of a simulated actor, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorType(pub u32);

impl std::fmt::Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Narrator
// ─────────────────────────────────────────────────────────────────────────────

/// Behavior state of the narrator actor, visible to phase conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarratorState {
    #[default]
    MoveAround,
    TemporarilyLeave,
    FirstInterjection,
    SecondInterjection,
    Departing,
}

impl NarratorState {
    pub const ALL: [NarratorState; 5] = [
        NarratorState::MoveAround,
        NarratorState::TemporarilyLeave,
        NarratorState::FirstInterjection,
        NarratorState::SecondInterjection,
        NarratorState::Departing,
    ];

    /// Wire index used by replication.
    pub fn index(self) -> u8 {
        match self {
            NarratorState::MoveAround => 0,
            NarratorState::TemporarilyLeave => 1,
            NarratorState::FirstInterjection => 2,
            NarratorState::SecondInterjection => 3,
            NarratorState::Departing => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Returns true while the narrator is delivering a monologue.
    pub fn is_interjecting(self) -> bool {
        matches!(
            self,
            NarratorState::FirstInterjection | NarratorState::SecondInterjection
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Phase Conditions
// ═══════════════════════════════════════════════════════════════════════════

/// Transition predicate for a phase, evaluated against the fight snapshot.
///
/// Conditions compose: `all_of`, `any_of`, and `not` wrap other conditions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum PhaseCondition {
    /// Always satisfied. Used for the implicit start phase.
    Always,

    /// Never satisfied. Disables a phase without removing it.
    #[default]
    Never,

    /// Primary actor health fraction is at or below `fraction`.
    PrimaryHealthBelow { fraction: f32 },

    /// Any tracked actor that has existed is at or below `fraction`.
    AnyHealthBelow { fraction: f32 },

    /// At least `count` tracked actors (primary included) have existed and died.
    DefeatedAtLeast { count: u32 },

    /// Every tracked actor has existed and died.
    AllDefeated,

    /// Narrator is currently in one of `states`.
    NarratorIn { states: Vec<NarratorState> },

    AllOf { conditions: Vec<PhaseCondition> },

    AnyOf { conditions: Vec<PhaseCondition> },

    Not { condition: Box<PhaseCondition> },
}

// ─────────────────────────────────────────────────────────────────────────────
// Fight Definition
// ─────────────────────────────────────────────────────────────────────────────

/// One phase of the fight as written in a definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub ordering: u32,
    pub name: String,
    #[serde(default)]
    pub condition: PhaseCondition,
}

/// Static configuration of one encounter instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FightDefinition {
    pub name: String,

    /// Narrator actor type, tracked for presence only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<ActorType>,

    /// Types that jointly make up the encounter.
    #[serde(default)]
    pub role_group: Vec<ActorType>,

    /// Role-group types eligible for primary election, in priority order.
    #[serde(default)]
    pub managing: Vec<ActorType>,

    #[serde(default, rename = "phase")]
    pub phases: Vec<PhaseConfig>,
}

impl FightDefinition {
    pub fn is_role_member(&self, kind: ActorType) -> bool {
        self.role_group.contains(&kind)
    }

    pub fn is_managing(&self, kind: ActorType) -> bool {
        self.managing.contains(&kind)
    }

    pub fn is_narrator(&self, kind: ActorType) -> bool {
        self.narrator == Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrator_index_roundtrip() {
        for state in NarratorState::ALL {
            assert_eq!(NarratorState::from_index(state.index()), Some(state));
        }
        assert_eq!(NarratorState::from_index(9), None);
    }

    #[test]
    fn parses_nested_conditions() {
        let src = r#"
            name = "test"
            role_group = [1, 3]
            managing = [1, 3]

            [[phase]]
            ordering = 0
            name = "idle"
            condition = { type = "always" }

            [[phase]]
            ordering = 1
            name = "enraged"

            [phase.condition]
            type = "any_of"
            conditions = [
                { type = "primary_health_below", fraction = 0.5 },
                { type = "not", condition = { type = "narrator_in", states = ["departing"] } },
            ]
        "#;

        let def: FightDefinition = toml::from_str(src).unwrap();
        assert_eq!(def.phases.len(), 2);
        assert!(def.is_managing(ActorType(3)));
        assert!(def.narrator.is_none());
        let PhaseCondition::AnyOf { conditions } = &def.phases[1].condition else {
            panic!("expected any_of");
        };
        assert_eq!(
            conditions[0],
            PhaseCondition::PrimaryHealthBelow { fraction: 0.5 }
        );
    }

    #[test]
    fn missing_condition_defaults_to_never() {
        let src = r#"
            ordering = 2
            name = "later"
        "#;
        let phase: PhaseConfig = toml::from_str(src).unwrap();
        assert_eq!(phase.condition, PhaseCondition::Never);
    }
}
