use std::collections::{BTreeMap, VecDeque};

use exomech_types::NarratorState;
use hashbrown::HashMap;

use super::error::RegistryError;
use super::{Behavior, BehaviorOverride, KillContext, KillReport, LootTable, TickEnv};
use crate::actor::{ActorId, ActorType, World};
use crate::net::NetMode;

#[derive(Debug, Clone)]
struct Binding {
    kind: ActorType,
    behavior: Behavior,
}

/// Maps actor types to behavior templates and owns the bound instances.
///
/// Bindings are keyed by handle and iterated in ascending handle order, so
/// ticks run in the same order the host allocated the actors.
#[derive(Debug, Default)]
pub struct OverrideRegistry {
    templates: HashMap<ActorType, Behavior>,
    bindings: BTreeMap<ActorId, Binding>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the template cloned for every actor of `kind`.
    pub fn register(&mut self, kind: ActorType, template: impl Into<Behavior>) -> Result<(), RegistryError> {
        if self.templates.contains_key(&kind) {
            return Err(RegistryError::DuplicateTemplate { kind });
        }
        self.templates.insert(kind, template.into());
        Ok(())
    }

    pub fn has_template(&self, kind: ActorType) -> bool {
        self.templates.contains_key(&kind)
    }

    pub fn is_bound(&self, id: ActorId) -> bool {
        self.bindings.contains_key(&id)
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn bound_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.bindings.keys().copied()
    }

    pub fn behavior(&self, id: ActorId) -> Option<&Behavior> {
        self.bindings.get(&id).map(|b| &b.behavior)
    }

    pub fn behavior_mut(&mut self, id: ActorId) -> Option<&mut Behavior> {
        self.bindings.get_mut(&id).map(|b| &mut b.behavior)
    }

    pub fn narrator_state(&self, id: ActorId) -> Option<NarratorState> {
        self.behavior(id).and_then(Behavior::narrator_state)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind a new actor and run its spawn hook.
    ///
    /// Actors spawned from inside a spawn hook are bound right after it, in
    /// spawn order. A stale binding left on a reused handle is released
    /// through the destroy path first.
    pub fn on_actor_spawned<W: World>(&mut self, world: &mut W, env: &mut TickEnv<'_>, id: ActorId) -> Vec<KillReport> {
        let mut released = Vec::new();
        let mut pending = VecDeque::from([id]);

        while let Some(id) = pending.pop_front() {
            if self.bindings.contains_key(&id) {
                released.extend(self.on_actor_destroyed(world, env, id));
            }

            let Some(kind) = world.live(id).map(|a| a.kind) else {
                continue;
            };
            let Some(template) = self.templates.get(&kind) else {
                continue;
            };

            let mut behavior = template.clone();
            let spawned = {
                let mut ctx = env.context(world, id);
                behavior.on_spawn(&mut ctx);
                ctx.take_spawned()
            };
            tracing::debug!(actor = %id, behavior = behavior.name(), "Behavior bound");
            self.bindings.insert(id, Binding { kind, behavior });
            pending.extend(spawned);
        }
        released
    }

    /// Run one state machine step for `id`.
    ///
    /// Returns `None` for unmanaged or inactive actors, which the host
    /// simulates on its own. Otherwise returns the reports of any stale
    /// bindings released while binding actors spawned during the step.
    pub fn tick<W: World>(&mut self, world: &mut W, env: &mut TickEnv<'_>, id: ActorId) -> Option<Vec<KillReport>> {
        world.live(id)?;
        let binding = self.bindings.get_mut(&id)?;

        let spawned = {
            let mut ctx = env.context(world, id);
            binding.behavior.tick(&mut ctx);
            ctx.take_spawned()
        };

        let mut released = Vec::new();
        for child in spawned {
            released.extend(self.on_actor_spawned(world, env, child));
        }
        Some(released)
    }

    /// Tick every actor bound at the start of the pass, in handle order.
    /// Actors bound during the pass wait for the next one.
    pub fn tick_all<W: World>(&mut self, world: &mut W, env: &mut TickEnv<'_>) -> Vec<KillReport> {
        let ids: Vec<ActorId> = self.bindings.keys().copied().collect();
        ids.into_iter()
            .filter_map(|id| self.tick(world, env, id))
            .flatten()
            .collect()
    }

    /// Run the kill hook and release the binding.
    ///
    /// Returns `None` if `id` is not bound, so a second call for the same
    /// death produces nothing.
    pub fn on_actor_destroyed<W: World>(&mut self, world: &W, env: &mut TickEnv<'_>, id: ActorId) -> Option<KillReport> {
        let Binding { kind, mut behavior } = self.bindings.remove(&id)?;

        let mut ctx = KillContext {
            actor: world.actor(id),
            fight: env.fight,
            cues: &mut *env.cues,
        };
        behavior.on_kill(&mut ctx);
        let mut loot = LootTable::new();
        behavior.modify_loot(&mut loot);
        env.commands.forget(id);

        tracing::debug!(actor = %id, behavior = behavior.name(), "Behavior released");
        Some(KillReport { actor: id, kind, loot })
    }

    /// Release bindings whose actor is gone, inactive, or was replaced by an
    /// actor of another type.
    pub fn release_invalid<W: World>(&mut self, world: &W, env: &mut TickEnv<'_>) -> Vec<KillReport> {
        let stale: Vec<ActorId> = self
            .bindings
            .iter()
            .filter(|(id, binding)| world.live(**id).is_none_or(|a| a.kind != binding.kind))
            .map(|(id, _)| *id)
            .collect();

        stale
            .into_iter()
            .filter_map(|id| self.on_actor_destroyed(world, env, id))
            .collect()
    }

    /// Bind live actors of registered types the host never reported.
    ///
    /// A replica binds them without the spawn hook, the same way it binds
    /// actors first seen in a sync packet.
    pub fn bind_unbound<W: World>(&mut self, world: &mut W, env: &mut TickEnv<'_>) -> Vec<KillReport> {
        let unbound: Vec<(ActorId, ActorType)> = world
            .active_actors()
            .filter(|a| self.templates.contains_key(&a.kind) && !self.bindings.contains_key(&a.id))
            .map(|a| (a.id, a.kind))
            .collect();

        if env.mode == NetMode::Replica {
            for (id, kind) in unbound {
                self.bind_replica(id, kind);
            }
            return Vec::new();
        }

        let mut released = Vec::new();
        for (id, _) in unbound {
            if !self.bindings.contains_key(&id) {
                released.extend(self.on_actor_spawned(world, env, id));
            }
        }
        released
    }

    /// Bind a template to an actor that existed before replication began.
    /// The spawn hook is skipped; the caller applies replicated state.
    pub fn bind_replica(&mut self, id: ActorId, kind: ActorType) -> Option<&mut Behavior> {
        if !self.bindings.contains_key(&id) {
            let behavior = self.templates.get(&kind)?.clone();
            tracing::debug!(actor = %id, behavior = behavior.name(), "Replica behavior bound");
            self.bindings.insert(id, Binding { kind, behavior });
        }
        self.bindings.get_mut(&id).map(|b| &mut b.behavior)
    }

    /// Handles whose behavior has unsent state changes.
    pub fn dirty_ids(&self) -> Vec<ActorId> {
        self.bindings
            .iter()
            .filter(|(_, b)| b.behavior.needs_sync())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn kind_of(&self, id: ActorId) -> Option<ActorType> {
        self.bindings.get(&id).map(|b| b.kind)
    }
}
