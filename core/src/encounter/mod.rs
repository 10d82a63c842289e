//! Encounter driver.
//!
//! [`Encounter`] owns everything the core keeps between ticks: the override
//! registry, the fight aggregator, the command bus and the frozen view of the
//! previous tick. The host calls [`Encounter::tick`] once per simulation step
//! and forwards its lifecycle and rendering hooks through the other methods.

mod error;
mod sync;


pub use error::EncounterError;

use exomech_types::FightDefinition;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::actor::{ActorFlags, ActorId, World};
use crate::behavior::{
    BehaviorOverride, Color, Cue, HitModifiers, KillReport, LootTable, OverrideRegistry,
};
use crate::commands::CommandBus;
use crate::fight::{FightStateManager, FightView};
use crate::net::NetMode;
use crate::roster;
use crate::signal::{FightListener, FightSignal};

/// Builds a [`TickEnv`](crate::behavior::TickEnv) from disjoint encounter fields so the registry can be
/// borrowed alongside it.
macro_rules! tick_env {
    ($encounter:expr) => {
        $crate::behavior::TickEnv {
            fight: &$encounter.view,
            commands: &mut $encounter.commands,
            cues: &mut $encounter.cues,
            rng: &mut $encounter.rng,
            tick: $encounter.tick,
            mode: $encounter.mode,
        }
    };
}
pub(crate) use tick_env;

/// Everything one tick produced for the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub signals: Vec<FightSignal>,
    pub cues: Vec<Cue>,
    pub kills: Vec<KillReport>,
}

pub struct Encounter {
    registry: OverrideRegistry,
    manager: FightStateManager,
    commands: CommandBus,
    /// State as of the end of the previous tick; what behaviors read.
    view: FightView,
    rng: ChaCha8Rng,
    tick: u64,
    mode: NetMode,

    // Produced between ticks, delivered with the next report
    cues: Vec<Cue>,
    kills: Vec<KillReport>,

    listeners: Vec<Box<dyn FightListener + Send>>,
}

impl Encounter {
    pub fn new(registry: OverrideRegistry, manager: FightStateManager, seed: u64) -> Self {
        let view = manager.view();
        Self {
            registry,
            manager,
            commands: CommandBus::new(),
            view,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            mode: NetMode::Authority,
            cues: Vec::new(),
            kills: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn from_definition(
        definition: &FightDefinition,
        registry: OverrideRegistry,
        seed: u64,
    ) -> Result<Self, EncounterError> {
        let manager = FightStateManager::from_definition(definition)?;
        Ok(Self::new(registry, manager, seed))
    }

    /// The bundled exo-mech fight with every standard behavior registered.
    pub fn standard(seed: u64) -> Result<Self, EncounterError> {
        let definition = roster::standard_definition()?;
        let registry = roster::standard_registry()?;
        Self::from_definition(&definition, registry, seed)
    }

    pub fn with_mode(mut self, mode: NetMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn add_listener(&mut self, listener: impl FightListener + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn mode(&self) -> NetMode {
        self.mode
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn view(&self) -> &FightView {
        &self.view
    }

    pub fn manager(&self) -> &FightStateManager {
        &self.manager
    }

    pub fn registry(&self) -> &OverrideRegistry {
        &self.registry
    }

    pub fn commands(&self) -> &CommandBus {
        &self.commands
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tick
    // ─────────────────────────────────────────────────────────────────────────

    /// Advance one step.
    ///
    /// Stale bindings are released first, then every bound behavior runs
    /// against the previous tick's view, and only then is the fight state
    /// rebuilt. Nothing a behavior does this tick is visible to another
    /// behavior's fight queries until the next tick.
    pub fn tick<W: World>(&mut self, world: &mut W) -> TickReport {
        self.tick += 1;

        let mut env = tick_env!(self);
        let mut kills = std::mem::take(&mut self.kills);
        kills.extend(self.registry.release_invalid(world, &mut env));
        kills.extend(self.registry.bind_unbound(world, &mut env));
        kills.extend(self.registry.tick_all(world, &mut env));

        let registry = &self.registry;
        self.commands.retain(|id| registry.is_bound(id));

        let signals = self.manager.update(world, |id| registry.narrator_state(id));
        self.view = self.manager.view();

        if signals.contains(&FightSignal::FightReset) {
            self.commands.clear();
        }
        for listener in &mut self.listeners {
            listener.handle_signals(&signals, &self.view);
            listener.on_tick(&self.view);
        }

        TickReport {
            tick: self.tick,
            signals,
            cues: std::mem::take(&mut self.cues),
            kills,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Host Hooks
    // ─────────────────────────────────────────────────────────────────────────

    /// The host created `id`. Binds a behavior if its type is registered.
    pub fn on_actor_spawned<W: World>(&mut self, world: &mut W, id: ActorId) {
        let mut env = tick_env!(self);
        let released = self.registry.on_actor_spawned(world, &mut env, id);
        self.kills.extend(released);
    }

    /// The host destroyed `id`. Returns the kill report the first time only.
    pub fn on_actor_destroyed<W: World>(&mut self, world: &W, id: ActorId) -> Option<KillReport> {
        let mut env = tick_env!(self);
        self.registry.on_actor_destroyed(world, &mut env, id)
    }

    /// Modifiers for a hit about to land on `id`.
    pub fn modify_hit<W: World>(&self, world: &W, id: ActorId) -> HitModifiers {
        let mut hit = HitModifiers::default();
        if world
            .actor(id)
            .is_some_and(|a| a.flags.contains(ActorFlags::INVULNERABLE))
        {
            hit.immune = true;
        }
        if let Some(behavior) = self.registry.behavior(id) {
            behavior.on_damage(&mut hit);
        }
        hit
    }

    /// Render color of `id`; `base` unless its behavior overrides it.
    pub fn visual_alpha<W: World>(&self, world: &W, id: ActorId, base: Color) -> Color {
        let (Some(behavior), Some(actor)) = (self.registry.behavior(id), world.actor(id)) else {
            return base;
        };
        behavior.visual_alpha(world, actor, base).unwrap_or(base)
    }

    /// Apply `id`'s loot rules to a table the host rolled itself.
    pub fn modify_loot(&self, id: ActorId, loot: &mut LootTable) {
        if let Some(behavior) = self.registry.behavior(id) {
            behavior.modify_loot(loot);
        }
    }
}

impl std::fmt::Debug for Encounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encounter")
            .field("tick", &self.tick)
            .field("mode", &self.mode)
            .field("bound", &self.registry.bound_count())
            .field("manager", &self.manager)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
