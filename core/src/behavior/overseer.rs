//! Overseer: the narrator hologram.
//!
//! The overseer never fights. It hovers near the target, fades out while a
//! mech is on the verge of dying, delivers a monologue when the fight reaches
//! an interjection phase, and departs on the final phase. Its state is
//! exported to the aggregator as the snapshot's narrator state.

use exomech_types::NarratorState;
use glam::Vec2;

use super::motion::{decelerate, saturate, scale_alpha, smooth_fly_near};
use super::{BehaviorOverride, Color, Cue, HitModifiers, StateMachine, TickContext};
use crate::actor::{Actor, World};
use crate::net::{NetError, NetReader, NetWriter};

pub const HOLOGRAM_STEP: f32 = 0.02;
pub const MONOLOGUE_LEAD_TICKS: u32 = 90;
const MONOLOGUE_TAIL_TICKS: u32 = 120;
const SHAKE_BEFORE_END_TICKS: u32 = 60;
const HOVER_OFFSET: Vec2 = Vec2::new(-320.0, -260.0);

/// Lines of one monologue with their delay after the lead-in.
type Monologue = &'static [(u32, &'static str)];

const FIRST_MONOLOGUE: Monologue = &[
    (0, "overseer.first.0"),
    (150, "overseer.first.1"),
    (300, "overseer.first.2"),
];

const SECOND_MONOLOGUE: Monologue = &[
    (0, "overseer.second.0"),
    (160, "overseer.second.1"),
    (320, "overseer.second.2"),
    (480, "overseer.second.3"),
];

/// Total ticks a monologue occupies, including lead-in and tail.
fn monologue_duration(lines: Monologue) -> u32 {
    let last = lines.last().map_or(0, |(offset, _)| *offset);
    MONOLOGUE_LEAD_TICKS + last + MONOLOGUE_TAIL_TICKS
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overseer {
    fsm: StateMachine<NarratorState>,
    /// 0 is fully visible, 1 fully faded.
    hologram: f32,
    interjections: u8,
    first_interjection_phase: u32,
    second_interjection_phase: u32,
}

impl Default for Overseer {
    fn default() -> Self {
        Self::new(1, 2)
    }
}

impl Overseer {
    /// Overseer that interjects when the fight reaches the given phase orderings.
    pub fn new(first_interjection_phase: u32, second_interjection_phase: u32) -> Self {
        Self {
            fsm: StateMachine::new(NarratorState::MoveAround),
            hologram: 0.0,
            interjections: 0,
            first_interjection_phase,
            second_interjection_phase,
        }
    }

    pub fn state(&self) -> NarratorState {
        self.fsm.state()
    }

    pub fn timer(&self) -> u32 {
        self.fsm.timer()
    }

    pub fn hologram(&self) -> f32 {
        self.hologram
    }

    pub fn interjections(&self) -> u8 {
        self.interjections
    }

    fn fade(&mut self, direction: f32) {
        self.hologram = saturate(self.hologram + HOLOGRAM_STEP * direction);
    }

    fn move_around<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        if let Some(target) = ctx.target() {
            if let Some(me) = ctx.me_mut() {
                smooth_fly_near(me, target.position + HOVER_OFFSET, 12.0, 0.05);
            }
        }
        self.fade(-1.0);

        let fight = ctx.fight;
        if fight.is_final_phase() {
            self.fsm.transition(NarratorState::Departing);
        } else if self.interjections == 0 && fight.phase >= self.first_interjection_phase && fight.ongoing {
            self.fsm.transition(NarratorState::FirstInterjection);
        } else if self.interjections == 1 && fight.phase >= self.second_interjection_phase && fight.ongoing {
            self.fsm.transition(NarratorState::SecondInterjection);
        } else if fight.state.any_dying() {
            self.fsm.transition(NarratorState::TemporarilyLeave);
        }
    }

    fn temporarily_leave<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let dying = ctx.fight.state.any_dying();
        self.fade(if dying { 1.0 } else { -1.0 });
        if let Some(me) = ctx.me_mut() {
            decelerate(me, 0.9);
        }
        if !dying && self.hologram <= 0.0 {
            self.fsm.transition(NarratorState::MoveAround);
        }
    }

    fn monologue<W: World>(&mut self, ctx: &mut TickContext<'_, W>, lines: Monologue, shake: bool) {
        let timer = self.fsm.timer();
        if let Some(me) = ctx.me_mut() {
            decelerate(me, 0.9);
        }
        self.fade(-1.0);

        for &(offset, line) in lines {
            if timer == MONOLOGUE_LEAD_TICKS + offset {
                ctx.cue(Cue::Dialogue {
                    speaker: ctx.actor,
                    line,
                });
            }
        }

        let duration = monologue_duration(lines);
        if shake && timer + SHAKE_BEFORE_END_TICKS == duration {
            ctx.cue(Cue::ScreenShake { strength: 8.0 });
        }
        if timer >= duration {
            self.interjections += 1;
            self.fsm.mark_dirty();
            self.fsm.transition(NarratorState::MoveAround);
        }
    }

    fn departing<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        self.fade(1.0);
        if self.hologram >= 1.0 {
            tracing::debug!(overseer = %ctx.actor, "Overseer departed");
            ctx.deactivate();
        }
    }
}

impl BehaviorOverride for Overseer {
    fn tick<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        match self.fsm.state() {
            NarratorState::MoveAround => self.move_around(ctx),
            NarratorState::TemporarilyLeave => self.temporarily_leave(ctx),
            NarratorState::FirstInterjection => self.monologue(ctx, FIRST_MONOLOGUE, false),
            NarratorState::SecondInterjection => self.monologue(ctx, SECOND_MONOLOGUE, true),
            NarratorState::Departing => self.departing(ctx),
        }
        self.fsm.end_tick();
    }

    fn on_spawn<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        ctx.cue(Cue::Dialogue {
            speaker: ctx.actor,
            line: "overseer.arrival",
        });
        self.fsm.mark_dirty();
    }

    fn on_damage(&self, hit: &mut HitModifiers) {
        hit.immune = true;
    }

    fn visual_alpha<W: World>(&self, _world: &W, _actor: &Actor, base: Color) -> Option<Color> {
        Some(scale_alpha(base, 1.0 - self.hologram))
    }

    fn narrator_state(&self) -> Option<NarratorState> {
        Some(self.fsm.state())
    }

    fn write_state(&self, writer: &mut impl NetWriter) {
        self.fsm.write(writer);
        writer.write_f32(self.hologram);
        writer.write_u8(self.interjections);
    }

    fn read_state(&mut self, reader: &mut impl NetReader) -> Result<(), NetError> {
        let (state, timer) = StateMachine::<NarratorState>::read(reader)?;
        let hologram = reader.read_f32()?;
        let interjections = reader.read_u8()?;

        self.fsm.restore(state, timer);
        self.hologram = saturate(hologram);
        self.interjections = interjections;
        Ok(())
    }

    fn needs_sync(&self) -> bool {
        self.fsm.is_dirty()
    }

    fn mark_synced(&mut self) {
        self.fsm.mark_clean();
    }
}
