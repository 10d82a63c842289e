//! Colossus body: the coordinating actor of the four-armed mech.
//!
//! The body never attacks directly. It spawns its hands, flies above the
//! target, and every tick tells each hand where to hover and what to fire.

use exomech_types::NarratorState;
use glam::Vec2;

use super::fsm::fsm_states;
use super::motion::{decelerate, smooth_fly_near};
use super::{BehaviorOverride, Cue, HitModifiers, KillContext, LootTable, StateMachine, TickContext};
use crate::actor::{ActorId, SpawnRequest, World};
use crate::commands::{Command, HandAttack, HandInstruction};
use crate::net::{NetError, NetReader, NetWriter};
use crate::roster;

pub const HAND_COUNT: usize = 4;
pub const SPAWN_ANIMATION_TICKS: u32 = 35;
pub const REPOSITION_TICKS: u32 = 90;
pub const NUKE_CHARGE_TICKS: u32 = 152;
pub const NUKE_TRANSITION_TICKS: u32 = 138;

/// Arm that carries the gauss nuke; the others fire plasma.
const GAUSS_ARM: usize = 3;
const GAUSS_RELEASE_LEAD: u32 = 12;
const PLASMA_INTERVAL: u32 = 30;
const HAND_LIFE: i32 = 60_000;
const HOVER_OFFSET: Vec2 = Vec2::new(0.0, -360.0);
const HAND_OFFSETS: [Vec2; HAND_COUNT] = [
    Vec2::new(-420.0, 60.0),
    Vec2::new(-240.0, 200.0),
    Vec2::new(240.0, 200.0),
    Vec2::new(420.0, 60.0),
];

fsm_states! {
    pub enum ColossusState {
        SpawnAnimation,
        Reposition,
        NukeBarrage,
        /// Holds position while the narrator talks.
        Standby,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColossusBody {
    fsm: StateMachine<ColossusState>,
    hands: [Option<ActorId>; HAND_COUNT],
    barrages: u32,
}

impl Default for ColossusBody {
    fn default() -> Self {
        Self {
            fsm: StateMachine::new(ColossusState::SpawnAnimation),
            hands: [None; HAND_COUNT],
            barrages: 0,
        }
    }
}

impl ColossusBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ColossusState {
        self.fsm.state()
    }

    pub fn timer(&self) -> u32 {
        self.fsm.timer()
    }

    pub fn hands(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.hands.iter().flatten().copied()
    }

    pub fn barrages(&self) -> u32 {
        self.barrages
    }

    fn spawn_animation<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let progress = self.fsm.timer() as f32 / SPAWN_ANIMATION_TICKS as f32;
        if let Some(me) = ctx.me_mut() {
            me.velocity = Vec2::ZERO;
            me.opacity = progress.min(1.0);
        }
        if self.fsm.timer() >= SPAWN_ANIMATION_TICKS {
            if let Some(me) = ctx.me_mut() {
                me.opacity = 1.0;
            }
            self.fsm.transition(ColossusState::Reposition);
        }
    }

    fn reposition<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        if let Some(target) = ctx.target() {
            if let Some(me) = ctx.me_mut() {
                smooth_fly_near(me, target.position + HOVER_OFFSET, 24.0, 0.1);
            }
        }
        if self.fsm.timer() >= REPOSITION_TICKS {
            self.fsm.transition(ColossusState::NukeBarrage);
        }
    }

    fn nuke_barrage<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        if let Some(me) = ctx.me_mut() {
            decelerate(me, 0.9);
        }
        if self.fsm.timer() == NUKE_CHARGE_TICKS {
            let at = ctx.me().map_or(Vec2::ZERO, |me| me.position);
            ctx.cue(Cue::Sound {
                at,
                key: "colossus.nuke_warning",
            });
        }
        if self.fsm.timer() >= NUKE_CHARGE_TICKS + NUKE_TRANSITION_TICKS {
            self.barrages += 1;
            self.fsm.transition(ColossusState::Reposition);
        }
    }

    fn standby<W: World>(&mut self, ctx: &mut TickContext<'_, W>, interjecting: bool) {
        if let Some(me) = ctx.me_mut() {
            decelerate(me, 0.85);
        }
        if !interjecting {
            self.fsm.transition(ColossusState::Reposition);
        }
    }

    fn instruct_hands<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let barrage = self.fsm.is(ColossusState::NukeBarrage);
        for (arm, slot) in self.hands.iter_mut().enumerate() {
            let Some(hand) = *slot else { continue };
            let me = ctx.actor;
            let still_ours = ctx
                .world
                .live(hand)
                .is_some_and(|a| a.kind == roster::COLOSSUS_HAND && a.owner == Some(me));
            if !still_ours {
                *slot = None;
                self.fsm.mark_dirty();
                continue;
            }

            let attack = match (barrage, arm) {
                (false, _) => HandAttack::Hold,
                (true, GAUSS_ARM) => HandAttack::GaussNuke {
                    release_at: NUKE_CHARGE_TICKS - GAUSS_RELEASE_LEAD,
                },
                (true, _) => HandAttack::PlasmaCannon {
                    interval: PLASMA_INTERVAL,
                },
            };
            ctx.issue(
                hand,
                Command::Hand(HandInstruction {
                    offset: HAND_OFFSETS[arm],
                    attack,
                    body_timer: self.fsm.timer(),
                    charge_ticks: NUKE_CHARGE_TICKS,
                }),
            );
        }
    }
}

impl BehaviorOverride for ColossusBody {
    fn tick<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let interjecting = ctx
            .fight
            .narrator_state()
            .is_some_and(NarratorState::is_interjecting);

        match self.fsm.state() {
            ColossusState::SpawnAnimation => self.spawn_animation(ctx),
            ColossusState::Reposition => self.reposition(ctx),
            ColossusState::NukeBarrage => self.nuke_barrage(ctx),
            ColossusState::Standby => self.standby(ctx, interjecting),
        }

        let busy = matches!(
            self.fsm.state(),
            ColossusState::SpawnAnimation | ColossusState::Standby
        );
        if interjecting && !busy {
            self.fsm.transition(ColossusState::Standby);
        }

        self.instruct_hands(ctx);
        self.fsm.end_tick();
    }

    fn on_spawn<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let Some(origin) = ctx.me().map(|me| me.position) else {
            return;
        };
        for (arm, offset) in HAND_OFFSETS.iter().enumerate() {
            let request = SpawnRequest::new(roster::COLOSSUS_HAND, origin + *offset)
                .with_life(HAND_LIFE)
                .with_ai(0, arm as f32)
                .with_owner(ctx.actor);
            self.hands[arm] = ctx.spawn(request);
        }
        self.fsm.mark_dirty();
    }

    fn on_kill(&mut self, ctx: &mut KillContext<'_>) {
        if let Some(actor) = ctx.actor {
            ctx.cues.push(Cue::Sound {
                at: actor.position,
                key: "colossus.death",
            });
        }
        ctx.cues.push(Cue::ScreenShake { strength: 12.0 });
    }

    fn on_damage(&self, hit: &mut HitModifiers) {
        if self.fsm.is(ColossusState::SpawnAnimation) {
            hit.immune = true;
        }
    }

    fn modify_loot(&self, loot: &mut LootTable) {
        loot.add("colossus_core", 1);
    }

    fn write_state(&self, writer: &mut impl NetWriter) {
        self.fsm.write(writer);
        writer.write_u32(self.barrages);
        for hand in &self.hands {
            writer.write_i32(hand.map_or(-1, |id| id.0 as i32));
        }
    }

    fn read_state(&mut self, reader: &mut impl NetReader) -> Result<(), NetError> {
        let (state, timer) = StateMachine::<ColossusState>::read(reader)?;
        let barrages = reader.read_u32()?;
        let mut hands = [None; HAND_COUNT];
        for hand in &mut hands {
            let raw = reader.read_i32()?;
            *hand = u32::try_from(raw).ok().map(ActorId);
        }

        self.fsm.restore(state, timer);
        self.barrages = barrages;
        self.hands = hands;
        Ok(())
    }

    fn needs_sync(&self) -> bool {
        self.fsm.is_dirty()
    }

    fn mark_synced(&mut self) {
        self.fsm.mark_clean();
    }
}
