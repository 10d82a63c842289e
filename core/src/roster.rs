//! Actor types of the standard exo-mech encounter.

use exomech_types::FightDefinition;
use phf::phf_map;

use crate::actor::ActorType;
use crate::behavior::{
    ColossusBody, ColossusHand, OverrideRegistry, Overseer, RegistryError, SerpentHead,
    SerpentSegment,
};
use crate::config::{bundled_definition, DefinitionError};

pub const COLOSSUS_BODY: ActorType = ActorType(1);
pub const COLOSSUS_HAND: ActorType = ActorType(2);
pub const SERPENT_HEAD: ActorType = ActorType(3);
pub const SERPENT_SEGMENT: ActorType = ActorType(4);
/// Simulated by the host; tracked by the aggregator but has no behavior.
pub const TWIN_ARTILLERY: ActorType = ActorType(5);
pub const OVERSEER: ActorType = ActorType(10);

pub const GAUSS_NUKE: ActorType = ActorType(100);
pub const PLASMA_BOLT: ActorType = ActorType(101);
pub const SERPENT_MINE: ActorType = ActorType(102);

/// Phase orderings at which the overseer interjects.
pub const FIRST_INTERJECTION_PHASE: u32 = 1;
pub const SECOND_INTERJECTION_PHASE: u32 = 2;

static ACTOR_NAMES: phf::Map<u32, &'static str> = phf_map! {
    1u32 => "colossus",
    2u32 => "colossus_hand",
    3u32 => "serpent",
    4u32 => "serpent_segment",
    5u32 => "twin_artillery",
    10u32 => "overseer",
    100u32 => "gauss_nuke",
    101u32 => "plasma_bolt",
    102u32 => "serpent_mine",
};

static ACTOR_TYPES: phf::Map<&'static str, u32> = phf_map! {
    "colossus" => 1,
    "colossus_hand" => 2,
    "serpent" => 3,
    "serpent_segment" => 4,
    "twin_artillery" => 5,
    "overseer" => 10,
    "gauss_nuke" => 100,
    "plasma_bolt" => 101,
    "serpent_mine" => 102,
};

pub fn actor_name(kind: ActorType) -> Option<&'static str> {
    ACTOR_NAMES.get(&kind.0).copied()
}

pub fn actor_type_by_name(name: &str) -> Option<ActorType> {
    ACTOR_TYPES.get(name).copied().map(ActorType)
}

/// Every known actor type with its name, in id order.
pub fn all_actor_types() -> Vec<(ActorType, &'static str)> {
    let mut all: Vec<_> = ACTOR_NAMES
        .entries()
        .map(|(id, name)| (ActorType(*id), *name))
        .collect();
    all.sort_by_key(|(kind, _)| *kind);
    all
}

pub fn standard_definition() -> Result<FightDefinition, DefinitionError> {
    bundled_definition()
}

/// Registry with a template for every behavior-driven actor type.
pub fn standard_registry() -> Result<OverrideRegistry, RegistryError> {
    let mut registry = OverrideRegistry::new();
    registry.register(COLOSSUS_BODY, ColossusBody::new())?;
    registry.register(COLOSSUS_HAND, ColossusHand::new())?;
    registry.register(SERPENT_HEAD, SerpentHead::new())?;
    registry.register(SERPENT_SEGMENT, SerpentSegment::new())?;
    registry.register(
        OVERSEER,
        Overseer::new(FIRST_INTERJECTION_PHASE, SECOND_INTERJECTION_PHASE),
    )?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for (kind, name) in all_actor_types() {
            assert_eq!(actor_type_by_name(name), Some(kind));
            assert_eq!(actor_name(kind), Some(name));
        }
        assert_eq!(actor_type_by_name("unknown"), None);
    }

    #[test]
    fn standard_definition_matches_roster() {
        let definition = standard_definition().unwrap();
        assert_eq!(definition.narrator, Some(OVERSEER));
        assert_eq!(definition.role_group, vec![COLOSSUS_BODY, SERPENT_HEAD, TWIN_ARTILLERY]);
    }

    #[test]
    fn artillery_has_no_behavior() {
        let registry = standard_registry().unwrap();
        assert!(registry.has_template(COLOSSUS_BODY));
        assert!(registry.has_template(OVERSEER));
        assert!(!registry.has_template(TWIN_ARTILLERY));
        assert!(!registry.has_template(PLASMA_BOLT));
    }
}
