pub mod actor;
pub mod behavior;
pub mod commands;
pub mod config;
pub mod encounter;
pub mod fight;
pub mod net;
pub mod roster;
pub mod signal;

// Re-exports for convenience
pub use actor::{Actor, ActorFlags, ActorId, ActorTable, ActorType, SpawnRequest, Target, World};
pub use behavior::{
    Behavior, BehaviorOverride, Color, Cue, HitModifiers, KillReport, LootTable, OverrideRegistry,
    RegistryError,
};
pub use commands::{Command, CommandBus};
pub use config::{DefinitionError, load_definition, load_definitions_from_dir};
pub use encounter::{Encounter, EncounterError, TickReport};
pub use exomech_types::{FightDefinition, NarratorState, PhaseCondition, PhaseConfig};
pub use glam::Vec2;
pub use fight::{FightState, FightStateManager, FightView, PhaseDefinition, PhaseGraph};
pub use net::{NetError, NetMode, SyncPacket};
pub use signal::{FightListener, FightSignal};
