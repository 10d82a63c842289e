//! One-way command channel from parent actors to their children.
//!
//! Parents enqueue during their own tick; children drain their queue at the
//! start of theirs. A child ticked before its parent sees the command on the
//! following tick.

use std::collections::VecDeque;

use glam::Vec2;
use hashbrown::HashMap;

use crate::actor::ActorId;

/// What a colossus hand should attack with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandAttack {
    Hold,
    /// Fire plasma bolts every `interval` ticks while the charge runs.
    PlasmaCannon { interval: u32 },
    /// Release a single gauss nuke once the charge reaches `release_at`.
    GaussNuke { release_at: u32 },
}

/// Per-tick instruction from a colossus body to one of its hands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandInstruction {
    /// Hover position relative to the body.
    pub offset: Vec2,
    pub attack: HandAttack,
    /// Body state timer when the instruction was issued.
    pub body_timer: u32,
    /// Length of the body's attack charge in ticks.
    pub charge_ticks: u32,
}

/// Instruction from a serpent head to one of its segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAction {
    Open,
    Close,
    FireMine { head_timer: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Hand(HandInstruction),
    Segment(SegmentAction),
}

/// Per-recipient command queues.
#[derive(Debug, Default)]
pub struct CommandBus {
    queues: HashMap<ActorId, VecDeque<Command>>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, to: ActorId, command: Command) {
        self.queues.entry(to).or_default().push_back(command);
    }

    /// Remove and return every queued command for `id`, oldest first.
    pub fn drain(&mut self, id: ActorId) -> Vec<Command> {
        self.queues
            .remove(&id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    pub fn pending(&self, id: ActorId) -> usize {
        self.queues.get(&id).map_or(0, VecDeque::len)
    }

    /// Drop the queue of a destroyed actor.
    pub fn forget(&mut self, id: ActorId) {
        self.queues.remove(&id);
    }

    /// Keep only the queues whose recipient satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(ActorId) -> bool) {
        self.queues.retain(|id, _| keep(*id));
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}
