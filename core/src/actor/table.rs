use glam::Vec2;

use super::{Actor, ActorId, ActorType, SpawnRequest, Target, World};

/// In-memory host used by the scenario runner and tests.
///
/// Slots are reused lowest-first once [`ActorTable::cleanup`] frees them,
/// which mirrors how real hosts recycle entity indices.
#[derive(Debug, Clone, Default)]
pub struct ActorTable {
    slots: Vec<Option<Actor>>,
    capacity: usize,
    targets: Vec<Target>,
}

impl ActorTable {
    pub const DEFAULT_CAPACITY: usize = 200;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
            targets: Vec::new(),
        }
    }

    pub fn add_target(&mut self, position: Vec2) {
        self.targets.push(Target {
            position,
            velocity: Vec2::ZERO,
        });
    }

    pub fn targets_mut(&mut self) -> &mut [Target] {
        &mut self.targets
    }

    /// Spawn directly, bypassing the encounter. The host must still report
    /// the new actor to the encounter.
    pub fn insert(&mut self, kind: ActorType, position: Vec2, life_max: i32) -> Option<ActorId> {
        self.spawn(SpawnRequest::new(kind, position).with_life(life_max))
    }

    /// Reduce life; the actor is destroyed when it reaches zero.
    /// Returns true if this hit killed it.
    pub fn apply_damage(&mut self, id: ActorId, amount: i32) -> bool {
        let Some(actor) = self.actor_mut(id).filter(|a| a.active) else {
            return false;
        };
        actor.life = (actor.life - amount).max(0);
        if actor.life == 0 {
            actor.active = false;
            return true;
        }
        false
    }

    pub fn set_life(&mut self, id: ActorId, life: i32) {
        if let Some(actor) = self.actor_mut(id) {
            actor.life = life.clamp(0, actor.life_max);
        }
    }

    /// Deactivate without killing (despawn).
    pub fn despawn(&mut self, id: ActorId) {
        if let Some(actor) = self.actor_mut(id) {
            actor.active = false;
        }
    }

    /// Integrate motion for every active actor.
    pub fn step(&mut self) {
        for actor in self.slots.iter_mut().flatten() {
            if actor.active {
                actor.position += actor.velocity;
            }
        }
    }

    /// Free the slots of inactive actors so their handles can be reused.
    pub fn cleanup(&mut self) -> Vec<ActorId> {
        let mut freed = Vec::new();
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|a| !a.active) {
                if let Some(actor) = slot.take() {
                    freed.push(actor.id);
                }
            }
        }
        freed
    }

    pub fn active_count(&self) -> usize {
        self.active_actors().count()
    }

    pub fn count_of(&self, kind: ActorType) -> usize {
        self.active_actors().filter(|a| a.kind == kind).count()
    }
}

impl World for ActorTable {
    fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn active_actors(&self) -> impl Iterator<Item = &Actor> {
        self.slots.iter().flatten().filter(|a| a.active)
    }

    fn spawn(&mut self, request: SpawnRequest) -> Option<ActorId> {
        let index = match self.slots.iter().position(Option::is_none) {
            Some(free) => free,
            None if self.slots.len() < self.capacity => {
                self.slots.push(None);
                self.slots.len() - 1
            }
            None => return None,
        };

        let id = ActorId(index as u32);
        let mut actor = Actor::new(id, request.kind, request.position, request.life_max);
        actor.velocity = request.velocity;
        actor.ai = request.ai;
        actor.owner = request.owner;
        self.slots[index] = Some(actor);
        Some(id)
    }

    fn nearest_target(&self, from: Vec2) -> Option<Target> {
        self.targets.iter().copied().min_by(|a, b| {
            a.position
                .distance_squared(from)
                .total_cmp(&b.position.distance_squared(from))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIND: ActorType = ActorType(7);

    #[test]
    fn spawn_reuses_lowest_free_slot() {
        let mut table = ActorTable::new();
        let a = table.insert(KIND, Vec2::ZERO, 10).unwrap();
        let b = table.insert(KIND, Vec2::ZERO, 10).unwrap();
        assert_eq!((a, b), (ActorId(0), ActorId(1)));

        table.despawn(a);
        // Not reusable until freed
        assert_eq!(table.insert(KIND, Vec2::ZERO, 10), Some(ActorId(2)));
        assert_eq!(table.cleanup(), vec![a]);
        assert_eq!(table.insert(KIND, Vec2::ZERO, 10), Some(a));
    }

    #[test]
    fn lethal_damage_deactivates() {
        let mut table = ActorTable::new();
        let id = table.insert(KIND, Vec2::ZERO, 10).unwrap();
        assert!(!table.apply_damage(id, 4));
        assert!(table.apply_damage(id, 100));
        let actor = table.actor(id).unwrap();
        assert!(!actor.active);
        assert_eq!(actor.life, 0);
        assert!(table.live(id).is_none());
    }

    #[test]
    fn capacity_limits_spawns() {
        let mut table = ActorTable::with_capacity(1);
        assert!(table.insert(KIND, Vec2::ZERO, 1).is_some());
        assert!(table.insert(KIND, Vec2::ZERO, 1).is_none());
    }
}
