//! Primary actor election.

use crate::actor::{ActorFlags, ActorId, ActorType, World};

/// Outcome of one election pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Election {
    pub actor: Option<ActorId>,
    pub kind: Option<ActorType>,
    /// The flag was assigned during this pass.
    pub newly_elected: bool,
}

/// Keep or assign the primary flag among live actors of `eligible` types.
///
/// Actors are scanned in ascending handle order. An existing holder keeps
/// the flag; otherwise the first candidate receives it and is marked for
/// replication. Passing a single type elects per type.
pub fn elect_primary<W: World>(world: &mut W, eligible: &[ActorType]) -> Election {
    let mut first = None;
    for actor in world.active_actors() {
        if !eligible.contains(&actor.kind) {
            continue;
        }
        if actor.is_primary() {
            return Election {
                actor: Some(actor.id),
                kind: Some(actor.kind),
                newly_elected: false,
            };
        }
        if first.is_none() {
            first = Some((actor.id, actor.kind));
        }
    }

    let Some((id, kind)) = first else {
        return Election::default();
    };
    if let Some(actor) = world.actor_mut(id) {
        actor.flags.insert(ActorFlags::PRIMARY | ActorFlags::NET_UPDATE);
    }
    tracing::debug!(actor = %id, kind = %kind, "Primary actor elected");

    Election {
        actor: Some(id),
        kind: Some(kind),
        newly_elected: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorTable;
    use glam::Vec2;

    const BODY: ActorType = ActorType(1);
    const HEAD: ActorType = ActorType(3);
    const OTHER: ActorType = ActorType(9);

    #[test]
    fn lowest_handle_wins_and_keeps_flag() {
        let mut world = ActorTable::new();
        let stray = world.insert(OTHER, Vec2::ZERO, 10).unwrap();
        let a = world.insert(HEAD, Vec2::ZERO, 10).unwrap();
        let b = world.insert(BODY, Vec2::ZERO, 10).unwrap();

        let first = elect_primary(&mut world, &[BODY, HEAD]);
        assert_eq!(first.actor, Some(a));
        assert!(first.newly_elected);
        assert!(!world.actor(stray).unwrap().is_primary());

        let again = elect_primary(&mut world, &[BODY, HEAD]);
        assert_eq!(again.actor, Some(a));
        assert!(!again.newly_elected);
        assert!(!world.actor(b).unwrap().is_primary());
    }

    #[test]
    fn existing_flag_beats_lower_handle() {
        let mut world = ActorTable::new();
        let a = world.insert(BODY, Vec2::ZERO, 10).unwrap();
        let b = world.insert(BODY, Vec2::ZERO, 10).unwrap();
        world.actor_mut(b).unwrap().flags.insert(ActorFlags::PRIMARY);

        let election = elect_primary(&mut world, &[BODY]);
        assert_eq!(election.actor, Some(b));
        assert!(!world.actor(a).unwrap().is_primary());
    }

    #[test]
    fn reelection_after_destruction_is_deterministic() {
        let mut world = ActorTable::new();
        let a = world.insert(BODY, Vec2::ZERO, 10).unwrap();
        let b = world.insert(BODY, Vec2::ZERO, 10).unwrap();
        let c = world.insert(BODY, Vec2::ZERO, 10).unwrap();
        assert_eq!(elect_primary(&mut world, &[BODY]).actor, Some(a));

        world.apply_damage(a, 100);
        let election = elect_primary(&mut world, &[BODY]);
        assert_eq!(election.actor, Some(b));
        assert!(election.newly_elected);
        let flags = world.actor(b).unwrap().flags;
        assert!(flags.contains(ActorFlags::NET_UPDATE));
        assert!(!world.actor(c).unwrap().is_primary());
    }

    #[test]
    fn no_candidates_elects_nobody() {
        let mut world = ActorTable::new();
        world.insert(OTHER, Vec2::ZERO, 10);
        assert_eq!(elect_primary(&mut world, &[BODY]), Election::default());
    }
}
