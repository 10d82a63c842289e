//! Aggregated fight state and phase progression.
//!
//! [`FightStateManager::update`] runs once per tick after every behavior has
//! ticked. It either resets everything (nothing tracked is alive) or rebuilds
//! the snapshot and evaluates the next phase.

use std::collections::BTreeSet;

use exomech_types::{FightDefinition, NarratorState};

use super::election::elect_primary;
use super::error::PhaseGraphError;
use super::phase::PhaseGraph;
use super::snapshot::{ActorSnapshot, FightState, FightView};
use crate::actor::{ActorId, ActorType, World};
use crate::signal::FightSignal;

/// Which actor types the aggregator tracks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FightRoster {
    pub narrator: Option<ActorType>,
    pub role_group: Vec<ActorType>,
    /// Primary-eligible subset of the role group.
    pub managing: Vec<ActorType>,
}

impl FightRoster {
    pub fn from_definition(definition: &FightDefinition) -> Self {
        Self {
            narrator: definition.narrator,
            role_group: definition.role_group.clone(),
            managing: definition.managing.clone(),
        }
    }

    pub fn is_role_member(&self, kind: ActorType) -> bool {
        self.role_group.contains(&kind) || self.managing.contains(&kind)
    }

    pub fn is_narrator(&self, kind: ActorType) -> bool {
        self.narrator == Some(kind)
    }
}

pub struct FightStateManager {
    roster: FightRoster,
    phases: PhaseGraph,

    /// Role-group types seen since the last reset
    previously_seen: BTreeSet<ActorType>,

    phase: u32,
    state: FightState,
    ongoing: bool,

    primary: Option<ActorId>,
    /// Type of the last elected primary, kept after it dies so it is not
    /// counted again among the others.
    primary_kind: Option<ActorType>,

    is_reset: bool,
}

impl FightStateManager {
    pub fn new(roster: FightRoster, phases: PhaseGraph) -> Self {
        Self {
            roster,
            phases,
            previously_seen: BTreeSet::new(),
            phase: 0,
            state: FightState::UNDEFINED,
            ongoing: false,
            primary: None,
            primary_kind: None,
            is_reset: true,
        }
    }

    pub fn from_definition(definition: &FightDefinition) -> Result<Self, PhaseGraphError> {
        let phases = PhaseGraph::from_definition(definition)?;
        Ok(Self::new(FightRoster::from_definition(definition), phases))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_fight_ongoing(&self) -> bool {
        self.ongoing
    }

    pub fn current_phase_ordering(&self) -> u32 {
        self.phase
    }

    pub fn current_phase_name(&self) -> &str {
        self.phases.name(self.phase)
    }

    pub fn primary_health_fraction(&self) -> f32 {
        self.state.primary.health_fraction
    }

    pub fn other_actor_states(&self) -> &[ActorSnapshot] {
        &self.state.others
    }

    pub fn state(&self) -> &FightState {
        &self.state
    }

    pub fn previously_seen(&self) -> &BTreeSet<ActorType> {
        &self.previously_seen
    }

    pub fn primary_actor(&self) -> Option<ActorId> {
        self.primary
    }

    pub fn roster(&self) -> &FightRoster {
        &self.roster
    }

    pub fn phases(&self) -> &PhaseGraph {
        &self.phases
    }

    /// Frozen copy for the next tick's behaviors.
    pub fn view(&self) -> FightView {
        FightView {
            ongoing: self.ongoing,
            phase: self.phase,
            phase_name: self.current_phase_name().to_string(),
            last_phase: self.phases.last_ordering(),
            state: self.state.clone(),
            primary: self.primary,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Update
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild the fight state from the world and take at most one phase step.
    ///
    /// `narrator_state` resolves the behavior state of the narrator actor.
    pub fn update<W: World>(
        &mut self,
        world: &mut W,
        narrator_state: impl Fn(ActorId) -> Option<NarratorState>,
    ) -> Vec<FightSignal> {
        let mut signals = Vec::new();

        let narrator = self.roster.narrator.and_then(|kind| world.first_of(kind)).map(|a| a.id);
        let present: Vec<ActorType> = world
            .active_actors()
            .filter(|a| self.roster.is_role_member(a.kind))
            .map(|a| a.kind)
            .collect();

        if present.is_empty() && narrator.is_none() {
            self.reset(&mut signals);
            return signals;
        }
        self.is_reset = false;

        let was_ongoing = self.ongoing;
        for kind in present {
            if self.previously_seen.insert(kind) {
                tracing::debug!(kind = %kind, "Role-group member first seen");
                signals.push(FightSignal::MemberFirstSeen { kind });
            }
        }

        let election = elect_primary(world, &self.roster.managing);
        self.primary = election.actor;
        if let (Some(actor), Some(kind)) = (election.actor, election.kind) {
            self.primary_kind = Some(kind);
            if election.newly_elected {
                signals.push(FightSignal::PrimaryElected { actor, kind });
            }
        }

        self.state = self.build_state(world, narrator.and_then(&narrator_state));
        self.ongoing = !self.previously_seen.is_empty();
        if self.ongoing && !was_ongoing {
            tracing::info!("Fight started");
            signals.insert(0, FightSignal::FightStarted);
        }

        if self.ongoing {
            self.evaluate_phase(&mut signals);
        }
        signals
    }

    fn build_state<W: World>(&self, world: &W, narrator_state: Option<NarratorState>) -> FightState {
        let primary = match self.primary {
            Some(id) => ActorSnapshot::from_actor(world.actor(id), true),
            None => ActorSnapshot::absent(self.primary_kind.is_some()),
        };

        let others = self
            .roster
            .role_group
            .iter()
            .filter(|kind| Some(**kind) != self.primary_kind)
            .map(|kind| {
                ActorSnapshot::from_actor(world.first_of(*kind), self.previously_seen.contains(kind))
            })
            .collect();

        FightState {
            narrator_state,
            primary,
            others,
        }
    }

    fn evaluate_phase(&mut self, signals: &mut Vec<FightSignal>) {
        let next = self.phase + 1;
        let Some(phase) = self.phases.get(next) else {
            return;
        };
        if !phase.holds(&self.state) {
            return;
        }

        let from = self.phase;
        self.phase = next;
        tracing::info!(from, to = next, name = %phase.name, "Phase changed");
        phase.fire_on_start(&self.state);
        signals.push(FightSignal::PhaseChanged {
            from,
            to: next,
            name: phase.name.clone(),
        });
    }

    /// Return to the zero state. Does nothing if already reset.
    fn reset(&mut self, signals: &mut Vec<FightSignal>) {
        if self.is_reset {
            return;
        }
        self.previously_seen.clear();
        self.phase = 0;
        self.state = FightState::UNDEFINED;
        self.ongoing = false;
        self.primary = None;
        self.primary_kind = None;
        self.is_reset = true;
        tracing::info!("Fight reset");
        signals.push(FightSignal::FightReset);
    }
}

impl std::fmt::Debug for FightStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FightStateManager")
            .field("phase", &self.phase)
            .field("ongoing", &self.ongoing)
            .field("primary", &self.primary)
            .field("previously_seen", &self.previously_seen)
            .finish_non_exhaustive()
    }
}
