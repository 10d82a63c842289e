//! Per-tick fight snapshots.
//!
//! Snapshots are rebuilt from scratch every tick and never mutated after
//! assembly. Behaviors read the previous tick's [`FightView`].

use exomech_types::NarratorState;

use crate::actor::{Actor, ActorId};

/// Health fraction at or below which a living actor counts as dying.
pub const DYING_THRESHOLD: f32 = 1e-3;

/// Health and presence of one tracked actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorSnapshot {
    pub health_fraction: f32,
    pub ever_existed: bool,
    pub is_dead: bool,
}

impl ActorSnapshot {
    /// Snapshot for a missing or inactive handle.
    pub const fn absent(was_summoned: bool) -> Self {
        Self {
            health_fraction: 0.0,
            ever_existed: was_summoned,
            is_dead: true,
        }
    }

    pub fn from_actor(actor: Option<&Actor>, was_summoned: bool) -> Self {
        match actor {
            Some(actor) if actor.active => Self {
                health_fraction: actor.health_fraction(),
                ever_existed: true,
                is_dead: false,
            },
            _ => Self::absent(was_summoned),
        }
    }

    /// Existed at some point and is now gone.
    pub fn defeated(&self) -> bool {
        self.ever_existed && self.is_dead
    }

    pub fn is_dying(&self) -> bool {
        !self.is_dead && self.health_fraction <= DYING_THRESHOLD
    }
}

impl Default for ActorSnapshot {
    fn default() -> Self {
        Self::absent(false)
    }
}

/// Aggregate of every tracked actor for one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FightState {
    pub narrator_state: Option<NarratorState>,
    pub primary: ActorSnapshot,
    pub others: Vec<ActorSnapshot>,
}

impl FightState {
    /// Zero value used when no fight is in progress.
    pub const UNDEFINED: FightState = FightState {
        narrator_state: None,
        primary: ActorSnapshot::absent(false),
        others: Vec::new(),
    };

    /// Primary first, then the others in roster order.
    pub fn all(&self) -> impl Iterator<Item = &ActorSnapshot> {
        std::iter::once(&self.primary).chain(self.others.iter())
    }

    pub fn defeated_count(&self) -> usize {
        self.all().filter(|s| s.defeated()).count()
    }

    pub fn all_defeated(&self) -> bool {
        self.all().all(ActorSnapshot::defeated)
    }

    pub fn any_dying(&self) -> bool {
        self.all().any(ActorSnapshot::is_dying)
    }

    pub fn narrator_is(&self, state: NarratorState) -> bool {
        self.narrator_state == Some(state)
    }
}

/// Read-only fight state handed to behaviors and collaborators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FightView {
    pub ongoing: bool,
    pub phase: u32,
    pub phase_name: String,
    pub last_phase: u32,
    pub state: FightState,
    pub primary: Option<ActorId>,
}

impl FightView {
    pub fn is_fight_ongoing(&self) -> bool {
        self.ongoing
    }

    pub fn current_phase_ordering(&self) -> u32 {
        self.phase
    }

    pub fn primary_health_fraction(&self) -> f32 {
        self.state.primary.health_fraction
    }

    pub fn other_actor_states(&self) -> &[ActorSnapshot] {
        &self.state.others
    }

    pub fn narrator_state(&self) -> Option<NarratorState> {
        self.state.narrator_state
    }

    pub fn is_final_phase(&self) -> bool {
        self.ongoing && self.phase == self.last_phase && self.last_phase > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorType;
    use glam::Vec2;

    #[test]
    fn inactive_actor_reads_as_absent() {
        let mut actor = Actor::new(ActorId(0), ActorType(1), Vec2::ZERO, 100);
        actor.life = 40;
        let live = ActorSnapshot::from_actor(Some(&actor), false);
        assert_eq!(live.health_fraction, 0.4);
        assert!(live.ever_existed && !live.is_dead);

        actor.active = false;
        let gone = ActorSnapshot::from_actor(Some(&actor), true);
        assert_eq!(gone, ActorSnapshot::absent(true));
        assert!(gone.defeated());
        assert!(!ActorSnapshot::from_actor(None, false).defeated());
    }

    #[test]
    fn undefined_state_has_nothing_defeated() {
        let state = FightState::UNDEFINED;
        assert_eq!(state.defeated_count(), 0);
        assert!(!state.all_defeated());
        assert!(!state.any_dying());
    }

    #[test]
    fn dying_requires_life() {
        let dying = ActorSnapshot {
            health_fraction: 0.0,
            ever_existed: true,
            is_dead: false,
        };
        assert!(dying.is_dying());
        assert!(!ActorSnapshot::absent(true).is_dying());
    }
}
