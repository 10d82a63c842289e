use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::fsm::fsm_states;
use super::serpent::SEGMENT_SPACING;
use super::{BehaviorOverride, HitModifiers, LootTable, StateMachine, TickContext};
use crate::actor::{SpawnRequest, World};
use crate::commands::{Command, SegmentAction};
use crate::net::{NetError, NetReader, NetWriter};
use crate::roster;

/// Damage taken while the armor plates are shut.
pub const CLOSED_DAMAGE_SCALE: f32 = 0.25;

const MINE_CADENCE: u32 = 125;
const MINE_SPEED: std::ops::Range<f32> = 3.0..10.0;

fsm_states! {
    pub enum SegmentState {
        Closed,
        Open,
    }
}

/// One link of the serpent chain. Follows the actor ahead of it.
#[derive(Debug, Clone, PartialEq)]
pub struct SerpentSegment {
    fsm: StateMachine<SegmentState>,
    index: u32,
}

impl Default for SerpentSegment {
    fn default() -> Self {
        Self {
            fsm: StateMachine::new(SegmentState::Closed),
            index: 0,
        }
    }
}

impl SerpentSegment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SegmentState {
        self.fsm.state()
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    fn should_fire(&self, head_timer: u32) -> bool {
        self.fsm.is(SegmentState::Open)
            && (self.index.wrapping_mul(53).wrapping_add(head_timer)) % MINE_CADENCE == 0
    }

    fn release_mine<W: World>(&self, ctx: &mut TickContext<'_, W>, origin: Vec2) {
        let angle = ctx.rng.random_range(0.0..TAU);
        let speed = ctx.rng.random_range(MINE_SPEED);
        let request = SpawnRequest::new(roster::SERPENT_MINE, origin)
            .with_velocity(Vec2::from_angle(angle) * speed)
            .with_owner(ctx.actor);
        ctx.spawn(request);
    }
}

impl BehaviorOverride for SerpentSegment {
    fn tick<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        let mut fire_at = None;
        for command in ctx.inbox() {
            match command {
                Command::Segment(SegmentAction::Open) if self.fsm.is(SegmentState::Closed) => {
                    self.fsm.transition(SegmentState::Open);
                }
                Command::Segment(SegmentAction::Close) if self.fsm.is(SegmentState::Open) => {
                    self.fsm.transition(SegmentState::Closed);
                }
                Command::Segment(SegmentAction::FireMine { head_timer }) => {
                    fire_at = Some(head_timer);
                }
                _ => {}
            }
        }

        let ahead = ctx
            .me()
            .and_then(|me| me.owner)
            .and_then(|owner| ctx.world.live(owner))
            .map(|ahead| ahead.position);
        let Some(ahead_position) = ahead else {
            ctx.deactivate();
            return;
        };

        let mut position = None;
        if let Some(me) = ctx.me_mut() {
            let offset = ahead_position - me.position;
            if offset.length() > SEGMENT_SPACING {
                me.position = ahead_position - offset.normalize_or_zero() * SEGMENT_SPACING;
            }
            me.velocity = Vec2::ZERO;
            me.rotation = offset.y.atan2(offset.x);
            position = Some(me.position);
        }

        if let (Some(head_timer), Some(origin)) = (fire_at, position) {
            if self.should_fire(head_timer) {
                self.release_mine(ctx, origin);
            }
        }
        self.fsm.end_tick();
    }

    fn on_spawn<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        if let Some(me) = ctx.me() {
            self.index = me.ai[0] as u32;
        }
        self.fsm.mark_dirty();
    }

    fn on_damage(&self, hit: &mut HitModifiers) {
        if self.fsm.is(SegmentState::Closed) {
            hit.damage_scale *= CLOSED_DAMAGE_SCALE;
        }
    }

    fn modify_loot(&self, loot: &mut LootTable) {
        loot.clear();
    }

    fn write_state(&self, writer: &mut impl NetWriter) {
        self.fsm.write(writer);
        writer.write_u32(self.index);
    }

    fn read_state(&mut self, reader: &mut impl NetReader) -> Result<(), NetError> {
        let (state, timer) = StateMachine::<SegmentState>::read(reader)?;
        let index = reader.read_u32()?;
        self.fsm.restore(state, timer);
        self.index = index;
        Ok(())
    }

    fn needs_sync(&self) -> bool {
        self.fsm.is_dirty()
    }

    fn mark_synced(&mut self) {
        self.fsm.mark_clean();
    }
}
