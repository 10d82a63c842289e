//! Tests for FightStateManager aggregation and phase progression

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec2;
use proptest::prelude::*;

use super::{ActorSnapshot, FightRoster, FightState, FightStateManager, PhaseDefinition, PhaseGraph};
use crate::actor::{ActorId, ActorTable, ActorType, World};
use crate::signal::FightSignal;
use exomech_types::NarratorState;

const BODY: ActorType = ActorType(1);
const HEAD: ActorType = ActorType(3);
const NARRATOR: ActorType = ActorType(10);

fn roster() -> FightRoster {
    FightRoster {
        narrator: Some(NARRATOR),
        role_group: vec![BODY, HEAD],
        managing: vec![BODY, HEAD],
    }
}

fn manager_with(phases: Vec<PhaseDefinition>) -> FightStateManager {
    let graph = phases
        .into_iter()
        .fold(PhaseGraph::builder(), |b, p| b.phase(p))
        .build()
        .unwrap();
    FightStateManager::new(roster(), graph)
}

/// Idle, then one phase per defeated member.
fn standard_manager() -> FightStateManager {
    manager_with(vec![
        PhaseDefinition::start("idle"),
        PhaseDefinition::new(1, "first down", |s: &FightState| s.defeated_count() >= 1),
        PhaseDefinition::new(2, "all down", |s: &FightState| s.all_defeated()),
    ])
}

fn no_narrator(_: ActorId) -> Option<NarratorState> {
    None
}

#[test]
fn narrator_alone_is_not_a_fight() {
    let mut world = ActorTable::new();
    world.insert(NARRATOR, Vec2::ZERO, 100);
    let mut manager = manager_with(vec![
        PhaseDefinition::start("idle"),
        PhaseDefinition::new(1, "always", |_: &FightState| true),
    ]);

    let signals = manager.update(&mut world, |_| Some(NarratorState::MoveAround));
    assert!(signals.is_empty());
    assert!(!manager.is_fight_ongoing());
    // Phases are not evaluated outside a fight
    assert_eq!(manager.current_phase_ordering(), 0);
    assert_eq!(manager.state().narrator_state, Some(NarratorState::MoveAround));
}

#[test]
fn fight_starts_when_member_appears() {
    let mut world = ActorTable::new();
    let a = world.insert(BODY, Vec2::ZERO, 100).unwrap();
    world.insert(HEAD, Vec2::ZERO, 100);
    let mut manager = standard_manager();

    let signals = manager.update(&mut world, no_narrator);
    assert_eq!(signals[0], FightSignal::FightStarted);
    assert!(signals.contains(&FightSignal::MemberFirstSeen { kind: BODY }));
    assert!(signals.contains(&FightSignal::MemberFirstSeen { kind: HEAD }));
    assert!(signals.contains(&FightSignal::PrimaryElected { actor: a, kind: BODY }));
    assert!(manager.is_fight_ongoing());
    assert_eq!(manager.current_phase_ordering(), 0);
    assert_eq!(manager.primary_actor(), Some(a));
    assert_eq!(manager.primary_health_fraction(), 1.0);
    assert_eq!(manager.other_actor_states().len(), 1);

    // Later ticks do not repeat one-shot signals
    assert!(manager.update(&mut world, no_narrator).is_empty());
}

#[test]
fn one_phase_step_per_tick() {
    let mut world = ActorTable::new();
    world.insert(BODY, Vec2::ZERO, 100);
    let mut manager = manager_with(vec![
        PhaseDefinition::start("idle"),
        PhaseDefinition::new(1, "one", |_: &FightState| true),
        PhaseDefinition::new(2, "two", |_: &FightState| true),
        PhaseDefinition::new(3, "three", |_: &FightState| true),
    ]);

    manager.update(&mut world, no_narrator);
    assert_eq!(manager.current_phase_ordering(), 1);
    manager.update(&mut world, no_narrator);
    assert_eq!(manager.current_phase_ordering(), 2);
    let signals = manager.update(&mut world, no_narrator);
    assert_eq!(manager.current_phase_ordering(), 3);
    assert_eq!(
        signals,
        vec![FightSignal::PhaseChanged {
            from: 2,
            to: 3,
            name: "three".into()
        }]
    );

    // Past the last phase the pointer stays put
    manager.update(&mut world, no_narrator);
    assert_eq!(manager.current_phase_ordering(), 3);
}

#[test]
fn simultaneous_defeats_still_advance_one_step() {
    let mut world = ActorTable::new();
    let a = world.insert(BODY, Vec2::ZERO, 100).unwrap();
    let b = world.insert(HEAD, Vec2::ZERO, 100).unwrap();
    world.insert(NARRATOR, Vec2::ZERO, 100);
    let mut manager = standard_manager();
    manager.update(&mut world, no_narrator);

    world.apply_damage(a, 100);
    world.apply_damage(b, 100);
    manager.update(&mut world, no_narrator);
    assert_eq!(manager.current_phase_ordering(), 1);
    manager.update(&mut world, no_narrator);
    assert_eq!(manager.current_phase_ordering(), 2);
}

#[test]
fn start_callback_fires_once() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let mut world = ActorTable::new();
    let a = world.insert(BODY, Vec2::ZERO, 100).unwrap();
    world.insert(HEAD, Vec2::ZERO, 100);
    let mut manager = manager_with(vec![
        PhaseDefinition::start("idle"),
        PhaseDefinition::new(1, "hurt", |s: &FightState| {
            s.all().any(|a| a.ever_existed && a.health_fraction <= 0.0)
        })
        .with_on_start(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    ]);

    manager.update(&mut world, no_narrator);
    world.set_life(a, 0);
    manager.update(&mut world, no_narrator);
    manager.update(&mut world, no_narrator);
    assert_eq!(manager.current_phase_ordering(), 1);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn removed_member_reads_absent() {
    let mut world = ActorTable::new();
    world.insert(BODY, Vec2::ZERO, 100);
    let head = world.insert(HEAD, Vec2::ZERO, 100).unwrap();
    let mut manager = standard_manager();
    manager.update(&mut world, no_narrator);

    world.despawn(head);
    manager.update(&mut world, no_narrator);
    assert_eq!(manager.other_actor_states(), &[ActorSnapshot::absent(true)]);
    let head_state = manager.other_actor_states()[0];
    assert_eq!(head_state.health_fraction, 0.0);
    assert!(head_state.ever_existed && head_state.is_dead);
}

#[test]
fn never_seen_member_is_not_defeated() {
    let mut world = ActorTable::new();
    world.insert(BODY, Vec2::ZERO, 100);
    let mut manager = standard_manager();
    manager.update(&mut world, no_narrator);
    assert_eq!(manager.other_actor_states(), &[ActorSnapshot::absent(false)]);
    assert_eq!(manager.current_phase_ordering(), 0);
}

#[test]
fn dead_primary_is_not_counted_twice() {
    let mut world = ActorTable::new();
    let a = world.insert(BODY, Vec2::ZERO, 100).unwrap();
    let b = world.insert(HEAD, Vec2::ZERO, 100).unwrap();
    let mut manager = standard_manager();
    manager.update(&mut world, no_narrator);

    world.apply_damage(a, 100);
    let signals = manager.update(&mut world, no_narrator);
    assert!(signals.contains(&FightSignal::PrimaryElected { actor: b, kind: HEAD }));
    assert_eq!(manager.primary_actor(), Some(b));
    assert_eq!(manager.state().defeated_count(), 1);
    assert_eq!(manager.current_phase_ordering(), 1);
}

#[test]
fn reset_clears_everything_once() {
    let mut world = ActorTable::new();
    let a = world.insert(BODY, Vec2::ZERO, 100).unwrap();
    let narrator = world.insert(NARRATOR, Vec2::ZERO, 100).unwrap();
    let mut manager = standard_manager();
    manager.update(&mut world, no_narrator);
    world.apply_damage(a, 100);
    manager.update(&mut world, no_narrator);
    assert_eq!(manager.current_phase_ordering(), 1);

    // Narrator keeps the fight alive
    manager.update(&mut world, no_narrator);
    assert!(manager.is_fight_ongoing());

    world.despawn(narrator);
    let signals = manager.update(&mut world, no_narrator);
    assert_eq!(signals, vec![FightSignal::FightReset]);
    assert!(!manager.is_fight_ongoing());
    assert_eq!(manager.current_phase_ordering(), 0);
    assert!(manager.previously_seen().is_empty());
    assert_eq!(manager.state(), &FightState::UNDEFINED);
    assert_eq!(manager.primary_actor(), None);

    assert!(manager.update(&mut world, no_narrator).is_empty());
}

#[test]
fn fresh_manager_does_not_signal_reset() {
    let mut world = ActorTable::new();
    let mut manager = standard_manager();
    assert!(manager.update(&mut world, no_narrator).is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Spawn(ActorType),
    Damage(usize, i32),
    Despawn(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop_oneof![Just(BODY), Just(HEAD), Just(NARRATOR)].prop_map(Op::Spawn),
        (0usize..8, 1i32..150).prop_map(|(i, d)| Op::Damage(i, d)),
        (0usize..8).prop_map(Op::Despawn),
    ]
}

fn nth_active(world: &ActorTable, n: usize) -> Option<ActorId> {
    world.active_actors().nth(n).map(|a| a.id)
}

proptest! {
    #[test]
    fn phase_is_monotonic_until_reset(ops in proptest::collection::vec(op(), 1..60)) {
        let mut world = ActorTable::new();
        let mut manager = standard_manager();
        let mut last_phase = 0;

        for op in ops {
            match op {
                Op::Spawn(kind) => {
                    world.insert(kind, Vec2::ZERO, 100);
                }
                Op::Damage(n, amount) => {
                    if let Some(id) = nth_active(&world, n) {
                        world.apply_damage(id, amount);
                    }
                }
                Op::Despawn(n) => {
                    if let Some(id) = nth_active(&world, n) {
                        world.despawn(id);
                    }
                }
            }
            world.cleanup();
            manager.update(&mut world, no_narrator);

            let phase = manager.current_phase_ordering();
            if world.active_count() == 0 {
                prop_assert_eq!(phase, 0);
                prop_assert!(!manager.is_fight_ongoing());
                prop_assert!(manager.previously_seen().is_empty());
            } else if manager.is_fight_ongoing() {
                prop_assert!(phase >= last_phase);
                prop_assert!(phase <= last_phase + 1);
            }
            last_phase = phase;
        }
    }
}
