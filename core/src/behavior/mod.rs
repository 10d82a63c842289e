//! Per-actor behavior overrides.
//!
//! Every managed actor owns one [`Behavior`], cloned from a registered
//! template when the actor first appears. Behaviors are state machines that
//! run once per tick against the previous tick's [`FightView`]. They may move
//! their own actor, spawn new actors through the host, queue commands for
//! their children, and emit presentation cues.

mod colossus;
mod error;
mod fsm;
mod hand;
pub mod motion;
mod overseer;
mod registry;
mod segment;
mod serpent;


pub use colossus::{ColossusBody, ColossusState};
pub use error::RegistryError;
pub use fsm::{FsmState, StateMachine};
pub use hand::{ColossusHand, HandState};
pub use overseer::Overseer;
pub use registry::OverrideRegistry;
pub use segment::{SegmentState, SerpentSegment};
pub use serpent::{SerpentHead, SerpentState};

use exomech_types::NarratorState;
use glam::Vec2;
use rand_chacha::ChaCha8Rng;

use crate::actor::{Actor, ActorId, ActorType, SpawnRequest, Target, World};
use crate::commands::{Command, CommandBus};
use crate::fight::FightView;
use crate::net::{NetError, NetMode, NetReader, NetWriter};

/// RGBA color handed to and returned from the alpha hook.
pub type Color = [u8; 4];

// ═══════════════════════════════════════════════════════════════════════════
// Hook Payloads
// ═══════════════════════════════════════════════════════════════════════════

/// Fire-and-forget presentation request for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    Dialogue { speaker: ActorId, line: &'static str },
    Sound { at: Vec2, key: &'static str },
    ScreenShake { strength: f32 },
}

/// Adjustments applied to an incoming hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitModifiers {
    pub immune: bool,
    pub damage_scale: f32,
}

impl Default for HitModifiers {
    fn default() -> Self {
        Self {
            immune: false,
            damage_scale: 1.0,
        }
    }
}

impl HitModifiers {
    pub fn apply(&self, raw: i32) -> i32 {
        if self.immune {
            return 0;
        }
        (raw as f32 * self.damage_scale).round().max(0.0) as i32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootEntry {
    pub item: String,
    pub count: u32,
}

/// Drops granted when an actor dies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LootTable {
    entries: Vec<LootEntry>,
}

impl LootTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: impl Into<String>, count: u32) {
        let item = item.into();
        match self.entries.iter_mut().find(|e| e.item == item) {
            Some(entry) => entry.count += count,
            None => self.entries.push(LootEntry { item, count }),
        }
    }

    pub fn remove(&mut self, item: &str) {
        self.entries.retain(|e| e.item != item);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LootEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, item: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.item == item)
            .map_or(0, |e| e.count)
    }
}

/// Produced exactly once when a bound actor is released.
#[derive(Debug, Clone, PartialEq)]
pub struct KillReport {
    pub actor: ActorId,
    pub kind: ActorType,
    pub loot: LootTable,
}

// ═══════════════════════════════════════════════════════════════════════════
// Tick Context
// ═══════════════════════════════════════════════════════════════════════════

/// Encounter-wide state shared by every behavior during one tick.
pub struct TickEnv<'a> {
    pub fight: &'a FightView,
    pub commands: &'a mut CommandBus,
    pub cues: &'a mut Vec<Cue>,
    pub rng: &'a mut ChaCha8Rng,
    pub tick: u64,
    pub mode: NetMode,
}

impl TickEnv<'_> {
    pub fn context<'s, W: World>(&'s mut self, world: &'s mut W, actor: ActorId) -> TickContext<'s, W> {
        TickContext {
            actor,
            world,
            fight: self.fight,
            commands: &mut *self.commands,
            cues: &mut *self.cues,
            rng: &mut *self.rng,
            tick: self.tick,
            mode: self.mode,
            spawned: Vec::new(),
        }
    }
}

/// Everything one behavior may touch while it runs.
pub struct TickContext<'a, W: World> {
    /// The actor being ticked.
    pub actor: ActorId,
    pub world: &'a mut W,
    /// Previous tick's fight state.
    pub fight: &'a FightView,
    pub commands: &'a mut CommandBus,
    pub cues: &'a mut Vec<Cue>,
    pub rng: &'a mut ChaCha8Rng,
    pub tick: u64,
    pub mode: NetMode,
    spawned: Vec<ActorId>,
}

impl<W: World> TickContext<'_, W> {
    pub fn me(&self) -> Option<&Actor> {
        self.world.live(self.actor)
    }

    pub fn me_mut(&mut self) -> Option<&mut Actor> {
        self.world.actor_mut(self.actor).filter(|a| a.active)
    }

    pub fn target(&self) -> Option<Target> {
        let me = self.me()?;
        self.world.nearest_target(me.position)
    }

    /// Ask the host for a new actor. Replicas never spawn.
    pub fn spawn(&mut self, request: SpawnRequest) -> Option<ActorId> {
        if self.mode == NetMode::Replica {
            return None;
        }
        let id = self.world.spawn(request)?;
        self.spawned.push(id);
        Some(id)
    }

    pub fn issue(&mut self, to: ActorId, command: Command) {
        self.commands.issue(to, command);
    }

    /// Commands queued for this actor since its last tick.
    pub fn inbox(&mut self) -> Vec<Command> {
        self.commands.drain(self.actor)
    }

    pub fn cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    /// Mark this actor inactive; the registry releases it on the next sweep.
    pub fn deactivate(&mut self) {
        if let Some(me) = self.world.actor_mut(self.actor) {
            me.active = false;
        }
    }

    pub(crate) fn take_spawned(&mut self) -> Vec<ActorId> {
        std::mem::take(&mut self.spawned)
    }
}

/// State passed to the kill hook.
pub struct KillContext<'a> {
    /// Last known host state; `None` if the slot was already freed.
    pub actor: Option<&'a Actor>,
    pub fight: &'a FightView,
    pub cues: &'a mut Vec<Cue>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Capability Contract
// ═══════════════════════════════════════════════════════════════════════════

/// Capabilities every behavior variant provides.
pub trait BehaviorOverride {
    /// One state machine step.
    fn tick<W: World>(&mut self, ctx: &mut TickContext<'_, W>);

    /// Write replicated fields in a fixed order.
    fn write_state(&self, writer: &mut impl NetWriter);

    /// Read fields written by [`BehaviorOverride::write_state`]. On error
    /// nothing is applied.
    fn read_state(&mut self, reader: &mut impl NetReader) -> Result<(), NetError>;

    fn on_spawn<W: World>(&mut self, _ctx: &mut TickContext<'_, W>) {}

    fn on_kill(&mut self, _ctx: &mut KillContext<'_>) {}

    fn on_damage(&self, _hit: &mut HitModifiers) {}

    /// Override the render color of the actor. `None` keeps `base`.
    fn visual_alpha<W: World>(&self, _world: &W, _actor: &Actor, _base: Color) -> Option<Color> {
        None
    }

    fn modify_loot(&self, _loot: &mut LootTable) {}

    fn narrator_state(&self) -> Option<NarratorState> {
        None
    }

    fn needs_sync(&self) -> bool;

    fn mark_synced(&mut self);
}

/// Closed set of behavior variants, one per boss role.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Colossus(ColossusBody),
    Hand(ColossusHand),
    Serpent(SerpentHead),
    Segment(SerpentSegment),
    Overseer(Overseer),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Behavior::Colossus($inner) => $body,
            Behavior::Hand($inner) => $body,
            Behavior::Serpent($inner) => $body,
            Behavior::Segment($inner) => $body,
            Behavior::Overseer($inner) => $body,
        }
    };
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Colossus(_) => "colossus",
            Behavior::Hand(_) => "colossus_hand",
            Behavior::Serpent(_) => "serpent",
            Behavior::Segment(_) => "serpent_segment",
            Behavior::Overseer(_) => "overseer",
        }
    }
}

impl BehaviorOverride for Behavior {
    fn tick<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        dispatch!(self, b => b.tick(ctx))
    }

    fn write_state(&self, writer: &mut impl NetWriter) {
        dispatch!(self, b => b.write_state(writer))
    }

    fn read_state(&mut self, reader: &mut impl NetReader) -> Result<(), NetError> {
        dispatch!(self, b => b.read_state(reader))
    }

    fn on_spawn<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        dispatch!(self, b => b.on_spawn(ctx))
    }

    fn on_kill(&mut self, ctx: &mut KillContext<'_>) {
        dispatch!(self, b => b.on_kill(ctx))
    }

    fn on_damage(&self, hit: &mut HitModifiers) {
        dispatch!(self, b => b.on_damage(hit))
    }

    fn visual_alpha<W: World>(&self, world: &W, actor: &Actor, base: Color) -> Option<Color> {
        dispatch!(self, b => b.visual_alpha(world, actor, base))
    }

    fn modify_loot(&self, loot: &mut LootTable) {
        dispatch!(self, b => b.modify_loot(loot))
    }

    fn narrator_state(&self) -> Option<NarratorState> {
        dispatch!(self, b => b.narrator_state())
    }

    fn needs_sync(&self) -> bool {
        dispatch!(self, b => b.needs_sync())
    }

    fn mark_synced(&mut self) {
        dispatch!(self, b => b.mark_synced())
    }
}

impl From<ColossusBody> for Behavior {
    fn from(value: ColossusBody) -> Self {
        Behavior::Colossus(value)
    }
}

impl From<ColossusHand> for Behavior {
    fn from(value: ColossusHand) -> Self {
        Behavior::Hand(value)
    }
}

impl From<SerpentHead> for Behavior {
    fn from(value: SerpentHead) -> Self {
        Behavior::Serpent(value)
    }
}

impl From<SerpentSegment> for Behavior {
    fn from(value: SerpentSegment) -> Self {
        Behavior::Segment(value)
    }
}

impl From<Overseer> for Behavior {
    fn from(value: Overseer) -> Self {
        Behavior::Overseer(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_modifiers_scale_and_immunity() {
        let mut hit = HitModifiers::default();
        assert_eq!(hit.apply(100), 100);
        hit.damage_scale = 0.25;
        assert_eq!(hit.apply(10), 3);
        hit.immune = true;
        assert_eq!(hit.apply(100), 0);
    }

    #[test]
    fn loot_merges_entries() {
        let mut loot = LootTable::new();
        loot.add("core", 1);
        loot.add("core", 2);
        loot.add("plating", 5);
        assert_eq!(loot.count_of("core"), 3);
        loot.remove("core");
        assert_eq!(loot.entries().len(), 1);
        assert_eq!(loot.count_of("core"), 0);
    }
}
