//! Replication channel for behavior state.
//!
//! Each behavior variant writes a fixed sequence of primitives. Readers must
//! consume them in the same order; there is no framing beyond the packet.

mod error;

pub use error::NetError;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use glam::Vec2;

use crate::actor::{ActorId, ActorType};

/// Which side of the network this encounter runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetMode {
    /// Runs the simulation and spawns actors.
    #[default]
    Authority,
    /// Mirrors state from the authority; never spawns.
    Replica,
}

pub trait NetWriter {
    fn write_bool(&mut self, value: bool);
    fn write_u8(&mut self, value: u8);
    fn write_i32(&mut self, value: i32);
    fn write_u32(&mut self, value: u32);
    fn write_f32(&mut self, value: f32);

    fn write_vec2(&mut self, value: Vec2) {
        self.write_f32(value.x);
        self.write_f32(value.y);
    }
}

pub trait NetReader {
    fn read_bool(&mut self) -> Result<bool, NetError>;
    fn read_u8(&mut self) -> Result<u8, NetError>;
    fn read_i32(&mut self) -> Result<i32, NetError>;
    fn read_u32(&mut self) -> Result<u32, NetError>;
    fn read_f32(&mut self) -> Result<f32, NetError>;

    fn read_vec2(&mut self) -> Result<Vec2, NetError> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        Ok(Vec2::new(x, y))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Packet buffers
// ─────────────────────────────────────────────────────────────────────────────

/// Little-endian writer over a growable buffer.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

impl NetWriter for PacketWriter {
    fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    fn write_f32(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }
}

/// Reader counterpart of [`PacketWriter`].
#[derive(Debug, Clone)]
pub struct PacketReader {
    buf: Bytes,
}

impl PacketReader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), NetError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(NetError::UnexpectedEnd { needed, remaining });
        }
        Ok(())
    }
}

impl NetReader for PacketReader {
    fn read_bool(&mut self) -> Result<bool, NetError> {
        Ok(self.read_u8()? != 0)
    }

    fn read_u8(&mut self) -> Result<u8, NetError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    fn read_i32(&mut self) -> Result<i32, NetError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    fn read_u32(&mut self) -> Result<u32, NetError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    fn read_f32(&mut self) -> Result<f32, NetError> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }
}

/// Serialized behavior state of one actor.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPacket {
    pub actor: ActorId,
    /// Lets a replica bind a template for actors it has not seen spawn.
    pub kind: ActorType,
    pub payload: Bytes,
}
