use glam::Vec2;

use super::fsm::fsm_states;
use super::motion::{scale_alpha, smooth_fly_near};
use super::{BehaviorOverride, Color, Cue, LootTable, StateMachine, TickContext};
use crate::actor::{Actor, SpawnRequest, World};
use crate::commands::{Command, HandAttack, HandInstruction};
use crate::net::{NetError, NetReader, NetWriter};
use crate::roster;

const PLASMA_SPEED: f32 = 16.0;
const NUKE_SPEED: f32 = 9.0;

fsm_states! {
    pub enum HandState {
        /// Waiting for the first instruction from the body.
        Idle,
        Following,
    }
}

/// One arm of the colossus. Acts only on instructions from its body.
#[derive(Debug, Clone, PartialEq)]
pub struct ColossusHand {
    fsm: StateMachine<HandState>,
    arm: u8,
    instruction: Option<HandInstruction>,
}

impl Default for ColossusHand {
    fn default() -> Self {
        Self {
            fsm: StateMachine::new(HandState::Idle),
            arm: 0,
            instruction: None,
        }
    }
}

impl ColossusHand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HandState {
        self.fsm.state()
    }

    pub fn arm(&self) -> u8 {
        self.arm
    }

    pub fn instruction(&self) -> Option<&HandInstruction> {
        self.instruction.as_ref()
    }

    fn fire<W: World>(&self, ctx: &mut TickContext<'_, W>, instruction: &HandInstruction) {
        let timer = instruction.body_timer;
        let (kind, speed) = match instruction.attack {
            HandAttack::Hold => return,
            HandAttack::PlasmaCannon { interval } => {
                if interval == 0 || timer >= instruction.charge_ticks || timer % interval != 0 {
                    return;
                }
                (roster::PLASMA_BOLT, PLASMA_SPEED)
            }
            HandAttack::GaussNuke { release_at } => {
                if timer != release_at {
                    return;
                }
                (roster::GAUSS_NUKE, NUKE_SPEED)
            }
        };

        let Some(origin) = ctx.me().map(|me| me.position) else {
            return;
        };
        let aim = ctx
            .target()
            .and_then(|t| (t.position - origin).try_normalize())
            .unwrap_or(Vec2::Y);
        let request = SpawnRequest::new(kind, origin)
            .with_velocity(aim * speed)
            .with_owner(ctx.actor);
        if ctx.spawn(request).is_some() && kind == roster::GAUSS_NUKE {
            ctx.cue(Cue::Sound {
                at: origin,
                key: "colossus.gauss_release",
            });
        }
    }
}

// Attack tags on the wire
const ATTACK_HOLD: u8 = 0;
const ATTACK_PLASMA: u8 = 1;
const ATTACK_GAUSS: u8 = 2;

fn write_instruction(writer: &mut impl NetWriter, instruction: &HandInstruction) {
    writer.write_vec2(instruction.offset);
    let (tag, parameter) = match instruction.attack {
        HandAttack::Hold => (ATTACK_HOLD, 0),
        HandAttack::PlasmaCannon { interval } => (ATTACK_PLASMA, interval),
        HandAttack::GaussNuke { release_at } => (ATTACK_GAUSS, release_at),
    };
    writer.write_u8(tag);
    writer.write_u32(parameter);
    writer.write_u32(instruction.body_timer);
    writer.write_u32(instruction.charge_ticks);
}

fn read_instruction(reader: &mut impl NetReader) -> Result<HandInstruction, NetError> {
    let offset = reader.read_vec2()?;
    let tag = reader.read_u8()?;
    let parameter = reader.read_u32()?;
    let attack = match tag {
        ATTACK_HOLD => HandAttack::Hold,
        ATTACK_PLASMA => HandAttack::PlasmaCannon { interval: parameter },
        ATTACK_GAUSS => HandAttack::GaussNuke { release_at: parameter },
        value => return Err(NetError::InvalidTag { field: "hand attack", value }),
    };
    Ok(HandInstruction {
        offset,
        attack,
        body_timer: reader.read_u32()?,
        charge_ticks: reader.read_u32()?,
    })
}

impl BehaviorOverride for ColossusHand {
    fn tick<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        for command in ctx.inbox() {
            if let Command::Hand(instruction) = command {
                self.instruction = Some(instruction);
            }
        }

        let body = ctx
            .me()
            .and_then(|me| me.owner)
            .and_then(|owner| ctx.world.live(owner))
            .map(|body| body.position);
        let Some(body_position) = body else {
            tracing::debug!(hand = %ctx.actor, "Body gone, deactivating hand");
            ctx.deactivate();
            return;
        };

        match self.fsm.state() {
            HandState::Idle => {
                if self.instruction.is_some() {
                    self.fsm.transition(HandState::Following);
                }
            }
            HandState::Following => {
                if let Some(instruction) = self.instruction {
                    if let Some(me) = ctx.me_mut() {
                        smooth_fly_near(me, body_position + instruction.offset, 40.0, 0.3);
                    }
                    self.fire(ctx, &instruction);
                }
            }
        }
        self.fsm.end_tick();
    }

    fn on_spawn<W: World>(&mut self, ctx: &mut TickContext<'_, W>) {
        if let Some(me) = ctx.me() {
            self.arm = me.ai[0] as u8;
        }
        self.fsm.mark_dirty();
    }

    fn visual_alpha<W: World>(&self, world: &W, actor: &Actor, base: Color) -> Option<Color> {
        let body_opacity = actor
            .owner
            .and_then(|owner| world.live(owner))
            .map_or(0.0, |body| body.opacity);
        Some(scale_alpha(base, body_opacity * actor.opacity))
    }

    fn modify_loot(&self, loot: &mut LootTable) {
        loot.clear();
    }

    fn write_state(&self, writer: &mut impl NetWriter) {
        self.fsm.write(writer);
        writer.write_u8(self.arm);
        writer.write_bool(self.instruction.is_some());
        if let Some(instruction) = &self.instruction {
            write_instruction(writer, instruction);
        }
    }

    fn read_state(&mut self, reader: &mut impl NetReader) -> Result<(), NetError> {
        let (state, timer) = StateMachine::<HandState>::read(reader)?;
        let arm = reader.read_u8()?;
        let instruction = if reader.read_bool()? {
            Some(read_instruction(reader)?)
        } else {
            None
        };

        self.fsm.restore(state, timer);
        self.arm = arm;
        self.instruction = instruction;
        Ok(())
    }

    fn needs_sync(&self) -> bool {
        self.fsm.is_dirty()
    }

    fn mark_synced(&mut self) {
        self.fsm.mark_clean();
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::net::{PacketReader, PacketWriter};

    fn following_hand(attack: HandAttack) -> ColossusHand {
        let mut hand = ColossusHand::new();
        hand.arm = 3;
        hand.fsm.transition(HandState::Following);
        hand.fsm.end_tick();
        hand.fsm.end_tick();
        hand.instruction = Some(HandInstruction {
            offset: Vec2::new(420.0, 60.0),
            attack,
            body_timer: 140,
            charge_ticks: 152,
        });
        hand
    }

    #[test]
    fn instruction_is_replicated() {
        let attacks = [
            HandAttack::Hold,
            HandAttack::PlasmaCannon { interval: 30 },
            HandAttack::GaussNuke { release_at: 140 },
        ];
        for attack in attacks {
            let original = following_hand(attack);
            let mut writer = PacketWriter::new();
            original.write_state(&mut writer);

            let mut fresh = ColossusHand::new();
            fresh
                .read_state(&mut PacketReader::new(writer.finish()))
                .unwrap();
            assert_eq!(fresh.instruction, original.instruction);
            assert_eq!(fresh.arm, 3);
            assert_eq!(fresh.state(), HandState::Following);
            assert_eq!(fresh.fsm.timer(), 1);
        }
    }

    #[test]
    fn unknown_attack_tag_keeps_previous_state() {
        let mut writer = PacketWriter::new();
        following_hand(HandAttack::Hold).write_state(&mut writer);
        let mut payload = writer.finish().to_vec();
        // state, timer, arm, presence flag, then the offset ahead of the tag
        payload[1 + 4 + 1 + 1 + 8] = 9;

        let mut fresh = ColossusHand::new();
        assert_eq!(
            fresh.read_state(&mut PacketReader::new(Bytes::from(payload))),
            Err(NetError::InvalidTag {
                field: "hand attack",
                value: 9
            })
        );
        assert_eq!(fresh, ColossusHand::new());
    }
}
