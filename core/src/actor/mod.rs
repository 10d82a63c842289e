//! Actor handles and the host world contract.
//!
//! Actors are owned by the host simulation. The core reads them through the
//! [`World`] trait, mutates only the motion and flag fields of actors it is
//! ticking, and asks the host to create new actors through [`World::spawn`].

mod table;

pub use table::ActorTable;

use bitflags::bitflags;
use glam::Vec2;

pub use exomech_types::ActorType;

/// Handle index of an actor. Lower indices were allocated earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Custom per-actor flags stored on the actor itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ActorFlags: u8 {
        /// Elected canonical actor of the encounter.
        const PRIMARY = 1 << 0;
        /// Incoming hits are ignored.
        const INVULNERABLE = 1 << 1;
        /// Host should replicate this actor's fields next network frame.
        const NET_UPDATE = 1 << 2;
    }
}

/// Host-side state of one simulated entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorType,
    pub active: bool,
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    pub opacity: f32,
    pub life: i32,
    pub life_max: i32,
    pub flags: ActorFlags,
    /// Free-form spawn parameters (wave index, segment index, ...).
    pub ai: [f32; 4],
    /// Actor that spawned this one, if any.
    pub owner: Option<ActorId>,
}

impl Actor {
    pub fn new(id: ActorId, kind: ActorType, position: Vec2, life_max: i32) -> Self {
        Self {
            id,
            kind,
            active: true,
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            opacity: 1.0,
            life: life_max,
            life_max,
            flags: ActorFlags::empty(),
            ai: [0.0; 4],
            owner: None,
        }
    }

    /// Current life as a fraction of maximum, clamped to `[0, 1]`.
    pub fn health_fraction(&self) -> f32 {
        if self.life_max <= 0 {
            return 0.0;
        }
        (self.life as f32 / self.life_max as f32).clamp(0.0, 1.0)
    }

    pub fn is_primary(&self) -> bool {
        self.flags.contains(ActorFlags::PRIMARY)
    }

    /// Request replication of this actor's host fields.
    pub fn mark_net_update(&mut self) {
        self.flags.insert(ActorFlags::NET_UPDATE);
    }
}

/// Parameters for a host-side spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub kind: ActorType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub life_max: i32,
    pub ai: [f32; 4],
    pub owner: Option<ActorId>,
}

impl SpawnRequest {
    pub fn new(kind: ActorType, position: Vec2) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            life_max: 1,
            ai: [0.0; 4],
            owner: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_life(mut self, life_max: i32) -> Self {
        self.life_max = life_max;
        self
    }

    pub fn with_ai(mut self, slot: usize, value: f32) -> Self {
        if let Some(ai) = self.ai.get_mut(slot) {
            *ai = value;
        }
        self
    }

    pub fn with_owner(mut self, owner: ActorId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Something actors aim at (a player, in the host's terms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub position: Vec2,
    pub velocity: Vec2,
}

// ═══════════════════════════════════════════════════════════════════════════
// World
// ═══════════════════════════════════════════════════════════════════════════

/// Host simulation as seen by the encounter core.
///
/// Handles may become invalid between any two ticks. `actor` returns `None`
/// for freed handles and an inactive actor for destroyed-but-not-freed ones;
/// both are ordinary values, never errors.
pub trait World {
    fn actor(&self, id: ActorId) -> Option<&Actor>;

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor>;

    /// Active actors in ascending handle order.
    fn active_actors(&self) -> impl Iterator<Item = &Actor>;

    /// Actor factory. Returns `None` when the host has no room.
    fn spawn(&mut self, request: SpawnRequest) -> Option<ActorId>;

    fn nearest_target(&self, from: Vec2) -> Option<Target>;

    /// The actor behind `id` if it is still active.
    fn live(&self, id: ActorId) -> Option<&Actor> {
        self.actor(id).filter(|actor| actor.active)
    }

    /// First active actor of `kind` in handle order.
    fn first_of(&self, kind: ActorType) -> Option<&Actor> {
        self.active_actors().find(|actor| actor.kind == kind)
    }

    fn any_of(&self, kind: ActorType) -> bool {
        self.first_of(kind).is_some()
    }
}
