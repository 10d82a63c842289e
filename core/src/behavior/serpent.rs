//! Serpent head: drags a chain of armored segments and lays mine barrages.
//!
//! Segments act only on head commands. Each barrage has a redirect window,
//! where the head charges at the target with the body closed, and a release
//! window, where a subset of segments opens and drops mines.

use exomech_types::NarratorState;
use glam::Vec2;

use super::fsm::fsm_states;
use super::motion::{decelerate, face_velocity, smooth_fly_near};
use super::{BehaviorOverride, Cue, KillContext, LootTable, StateMachine, TickContext};
use crate::actor::{ActorId, SpawnRequest, World};
use crate::commands::{Command, SegmentAction};
use crate::net::{NetError, NetReader, NetWriter};
use crate::roster;

pub const SEGMENT_COUNT: usize = 12;
pub const SEGMENT_SPACING: f32 = 42.0;
pub const BARRAGE_REDIRECT_TICKS: u32 = 150;
pub const BARRAGE_RELEASE_TICKS: u32 = 210;
pub const BARRAGE_COUNT: u32 = 2;
pub const REPOSITION_TICKS: u32 = 120;

const OPEN_EVERY: usize = 4;
const FIRE_EVERY: usize = 2;
const SEGMENT_LIFE: i32 = 80_000;
const REPOSITION_OFFSET: Vec2 = Vec2::new(0.0, -600.0);

fsm_states! {
    pub enum SerpentState {
        MineBarrages,
        Reposition,
        /// Coiled up while the narrator talks.
        Inactive,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SerpentHead {
    fsm: StateMachine<SerpentState>,
    segments: Vec<ActorId>,
}

impl Default for SerpentHead {
    fn default() -> Self {
        Self {
            fsm: StateMachine::new(SerpentState::MineBarrages),
            segments: Vec::new(),
        }
    }
}

impl SerpentHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SerpentState {
        self.fsm.state()
    }

    pub fn timer(&self) -> u32 {
        self.fsm.timer()
    }

    pub fn segments(&self) -> &[ActorId] {
        &self.segments
    }

    /// Forget segments that died or whose handle now holds another actor.
    fn drop_lost_segments<W: World>(&mut self, world: &W) {
        let before = self.segments.len();
        self.segments
            .retain(|id| world.live(*id).is_some_and(|a| a.kind == roster::SERPENT_SEGMENT));
        if self.segments.len() != before {
            tracing::debug!(lost = before - self.segments.len(), "Serpent segments lost");
            self.fsm.mark_dirty();
        }
    }

    /// Send `action` to every `every`-th segment, starting at the neck.
    fn command_segments<W: World>(&self, ctx: &mut TickContext<'_, W>, every: usize, action: SegmentAction) {
        for (index, segment) in self.segments.iter().enumerate() {
            if index % every == 0 {
                ctx.issue(*segment, Command::Segment(action));
            }
        }
    }

    fn chase<W: World>(ctx: &mut TickContext<'_, W>, offset: Vec2, speed: f32, acceleration: f32) {
        let Some(target) = ctx.target() else {
            return;
        };
        if let Some(me) = ctx.me_mut() {
            smooth_fly_near(me, target.position + offset, speed, acceleration);
            face_velocity(me);
        }
    }

    fn mine_barrages<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let timer = self.fsm.timer();
        let cycle = BARRAGE_REDIRECT_TICKS + BARRAGE_RELEASE_TICKS;
        if timer >= cycle * BARRAGE_COUNT {
            self.command_segments(ctx, 1, SegmentAction::Close);
            self.fsm.transition(SerpentState::Reposition);
            return;
        }

        let local = timer % cycle;
        if local < BARRAGE_REDIRECT_TICKS {
            if local == 0 {
                self.command_segments(ctx, 1, SegmentAction::Close);
            }
            Self::chase(ctx, Vec2::ZERO, 30.0, 0.08);
            return;
        }

        if local == BARRAGE_REDIRECT_TICKS {
            self.command_segments(ctx, OPEN_EVERY, SegmentAction::Open);
        }
        if let Some(me) = ctx.me_mut() {
            decelerate(me, 0.97);
        }
        self.command_segments(ctx, FIRE_EVERY, SegmentAction::FireMine { head_timer: timer });
    }

    fn reposition<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        Self::chase(ctx, REPOSITION_OFFSET, 22.0, 0.06);
        if self.fsm.timer() >= REPOSITION_TICKS {
            self.fsm.transition(SerpentState::MineBarrages);
        }
    }

    fn inactive<W: World>(&mut self, ctx: &mut TickContext<'_, W>, interjecting: bool) {
        if self.fsm.timer() == 0 {
            self.command_segments(ctx, 1, SegmentAction::Close);
        }
        if let Some(me) = ctx.me_mut() {
            decelerate(me, 0.95);
        }
        if !interjecting {
            self.fsm.transition(SerpentState::Reposition);
        }
    }
}

impl BehaviorOverride for SerpentHead {
    fn tick<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let interjecting = ctx
            .fight
            .narrator_state()
            .is_some_and(NarratorState::is_interjecting);

        self.drop_lost_segments(&*ctx.world);
        match self.fsm.state() {
            SerpentState::MineBarrages => self.mine_barrages(ctx),
            SerpentState::Reposition => self.reposition(ctx),
            SerpentState::Inactive => self.inactive(ctx, interjecting),
        }

        if interjecting && !self.fsm.is(SerpentState::Inactive) {
            self.fsm.transition(SerpentState::Inactive);
        }
        self.fsm.end_tick();
    }

    fn on_spawn<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let Some(origin) = ctx.me().map(|me| me.position) else {
            return;
        };
        let mut ahead = ctx.actor;
        for index in 0..SEGMENT_COUNT {
            let position = origin - Vec2::new(0.0, SEGMENT_SPACING * (index + 1) as f32);
            let request = SpawnRequest::new(roster::SERPENT_SEGMENT, position)
                .with_life(SEGMENT_LIFE)
                .with_ai(0, index as f32)
                .with_owner(ahead);
            let Some(segment) = ctx.spawn(request) else {
                break;
            };
            self.segments.push(segment);
            ahead = segment;
        }
        self.fsm.mark_dirty();
    }

    fn on_kill(&mut self, ctx: &mut KillContext<'_>) {
        if let Some(actor) = ctx.actor {
            ctx.cues.push(Cue::Sound {
                at: actor.position,
                key: "serpent.death",
            });
        }
    }

    fn modify_loot(&self, loot: &mut LootTable) {
        loot.add("serpent_core", 1);
    }

    fn write_state(&self, writer: &mut impl NetWriter) {
        self.fsm.write(writer);
        writer.write_u32(self.segments.len() as u32);
        for segment in &self.segments {
            writer.write_u32(segment.0);
        }
    }

    fn read_state(&mut self, reader: &mut impl NetReader) -> Result<(), NetError> {
        let (state, timer) = StateMachine::<SerpentState>::read(reader)?;
        let count = reader.read_u32()?;
        let mut segments = Vec::new();
        for _ in 0..count {
            segments.push(ActorId(reader.read_u32()?));
        }

        self.fsm.restore(state, timer);
        self.segments = segments;
        Ok(())
    }

    fn needs_sync(&self) -> bool {
        self.fsm.is_dirty()
    }

    fn mark_synced(&mut self) {
        self.fsm.mark_clean();
    }
}
