//! Scripted scenarios for exercising an encounter without a game.
//!
//! A scenario is a TOML file listing target positions and timed host events
//! (spawn, damage, despawn). The runner plays them against an in-memory
//! [`ActorTable`], ticking the encounter the way a host would.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use exomech_core::fight::PhaseDurationRecorder;
use exomech_core::roster::actor_type_by_name;
use exomech_core::{
    ActorId, ActorTable, ActorType, Encounter, FightListener, FightSignal, KillReport, NetMode,
    Vec2, World,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown actor '{name}' in event at tick {tick}")]
    UnknownActor { name: String, tick: u64 },
}

fn default_life() -> i32 {
    100_000
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TargetConfig {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioEvent {
    Spawn {
        tick: u64,
        actor: String,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default = "default_life")]
        life: i32,
    },
    /// Hit the first live actor of the type; hit modifiers apply.
    Damage { tick: u64, actor: String, amount: i32 },
    /// Remove every live actor of the type without killing it.
    Despawn { tick: u64, actor: String },
}

impl ScenarioEvent {
    pub fn tick(&self) -> u64 {
        match self {
            ScenarioEvent::Spawn { tick, .. }
            | ScenarioEvent::Damage { tick, .. }
            | ScenarioEvent::Despawn { tick, .. } => *tick,
        }
    }

    fn actor_name(&self) -> &str {
        match self {
            ScenarioEvent::Spawn { actor, .. }
            | ScenarioEvent::Damage { actor, .. }
            | ScenarioEvent::Despawn { actor, .. } => actor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    /// Overrides the configured seed when present.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Overrides the configured tick count when present.
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetConfig>,
    #[serde(default, rename = "event")]
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path).map_err(|source| ScenarioError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, origin: &Path) -> Result<Self, ScenarioError> {
        let mut scenario: Scenario =
            toml::from_str(content).map_err(|source| ScenarioError::ParseToml {
                path: origin.to_path_buf(),
                source,
            })?;
        for event in &scenario.events {
            if actor_type_by_name(event.actor_name()).is_none() {
                return Err(ScenarioError::UnknownActor {
                    name: event.actor_name().to_string(),
                    tick: event.tick(),
                });
            }
        }
        // Stable: events sharing a tick keep file order
        scenario.events.sort_by_key(ScenarioEvent::tick);
        Ok(scenario)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runner
// ─────────────────────────────────────────────────────────────────────────────

/// Everything observed while playing a scenario.
#[derive(Debug, Default)]
pub struct Outcome {
    pub ticks_run: u64,
    pub signals: Vec<(u64, FightSignal)>,
    pub kills: Vec<(u64, KillReport)>,
    pub cues: usize,
    pub final_phase: u32,
    pub final_phase_name: String,
    pub ongoing: bool,
    pub phase_durations: BTreeMap<u32, u32>,
    pub sync_packets: usize,
    pub sync_bytes: usize,
    pub sync_errors: usize,
}

/// Plays a scenario against an encounter and an optional mirrored replica.
pub struct Runner {
    world: ActorTable,
    encounter: Encounter,
    replica: Option<Encounter>,
    recorder: PhaseDurationRecorder,
}

impl Runner {
    pub fn new(encounter: Encounter, scenario: &Scenario) -> Self {
        let mut world = ActorTable::new();
        if scenario.targets.is_empty() {
            world.add_target(Vec2::new(0.0, 600.0));
        }
        for target in &scenario.targets {
            world.add_target(Vec2::new(target.x, target.y));
        }
        Self {
            world,
            encounter,
            replica: None,
            recorder: PhaseDurationRecorder::new(),
        }
    }

    /// Mirror every sync packet into `replica`. The replica only receives
    /// state; it is never ticked against this runner's world.
    pub fn with_replica(mut self, replica: Encounter) -> Self {
        self.replica = Some(replica.with_mode(NetMode::Replica));
        self
    }

    pub fn world(&self) -> &ActorTable {
        &self.world
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn replica(&self) -> Option<&Encounter> {
        self.replica.as_ref()
    }

    pub fn run(&mut self, scenario: &Scenario, ticks: u64) -> Outcome {
        let mut outcome = Outcome::default();
        let mut events = scenario.events.iter().peekable();

        for tick in 0..ticks {
            while let Some(event) = events.next_if(|e| e.tick() <= tick) {
                self.apply(event, tick, &mut outcome);
            }

            let report = self.encounter.tick(&mut self.world);
            self.recorder
                .handle_signals(&report.signals, self.encounter.view());
            self.recorder.on_tick(self.encounter.view());

            outcome.cues += report.cues.len();
            outcome
                .signals
                .extend(report.signals.into_iter().map(|s| (tick, s)));
            outcome
                .kills
                .extend(report.kills.into_iter().map(|k| (tick, k)));

            self.sync(&mut outcome);
            self.world.step();
            for freed in self.world.cleanup() {
                if let Some(kill) = self.encounter.on_actor_destroyed(&self.world, freed) {
                    outcome.kills.push((tick, kill));
                }
            }
            outcome.ticks_run = tick + 1;
        }

        outcome.final_phase = self.encounter.view().current_phase_ordering();
        outcome.final_phase_name = self.encounter.view().phase_name.clone();
        outcome.ongoing = self.encounter.view().is_fight_ongoing();
        outcome.phase_durations = self.recorder.durations().clone();
        outcome
    }

    fn apply(&mut self, event: &ScenarioEvent, tick: u64, outcome: &mut Outcome) {
        // Names were validated when the scenario was parsed
        let Some(kind) = actor_type_by_name(event.actor_name()) else {
            return;
        };

        match event {
            ScenarioEvent::Spawn { x, y, life, .. } => {
                let Some(id) = self.world.insert(kind, Vec2::new(*x, *y), *life) else {
                    tracing::warn!(tick, kind = %kind, "Actor table full, spawn dropped");
                    return;
                };
                tracing::debug!(tick, actor = %id, kind = %kind, "Scenario spawn");
                self.encounter.on_actor_spawned(&mut self.world, id);
            }
            ScenarioEvent::Damage { amount, .. } => {
                let Some(id) = self.world.first_of(kind).map(|a| a.id) else {
                    tracing::debug!(tick, kind = %kind, "No live actor to damage");
                    return;
                };
                let hit = self.encounter.modify_hit(&self.world, id);
                if self.world.apply_damage(id, hit.apply(*amount)) {
                    tracing::debug!(tick, actor = %id, "Scenario kill");
                    if let Some(kill) = self.encounter.on_actor_destroyed(&self.world, id) {
                        outcome.kills.push((tick, kill));
                    }
                }
            }
            ScenarioEvent::Despawn { .. } => {
                for id in live_of(&self.world, kind) {
                    self.world.despawn(id);
                }
            }
        }
    }

    fn sync(&mut self, outcome: &mut Outcome) {
        let Some(replica) = &mut self.replica else {
            return;
        };
        for packet in self.encounter.collect_dirty() {
            outcome.sync_packets += 1;
            outcome.sync_bytes += packet.payload.len();
            if replica.receive_sync(&self.world, &packet).is_err() {
                outcome.sync_errors += 1;
            }
        }
    }
}

fn live_of(world: &ActorTable, kind: ActorType) -> Vec<ActorId> {
    world
        .active_actors()
        .filter(|a| a.kind == kind)
        .map(|a| a.id)
        .collect()
}
