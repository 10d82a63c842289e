use std::fmt::Debug;

use crate::net::{NetError, NetReader, NetWriter};

/// State tag of a behavior state machine with a fixed wire index.
pub trait FsmState: Copy + Eq + Debug {
    fn index(self) -> u8;
    fn from_index(index: u8) -> Option<Self>;
}

/// Current state plus a per-tick timer.
///
/// The timer advances by one in [`StateMachine::end_tick`] and restarts at
/// zero on every transition, so a handler sees `timer == 0` on the first tick
/// of a new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine<S> {
    state: S,
    timer: u32,
    dirty: bool,
    changed: bool,
}

impl<S: FsmState> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            timer: 0,
            dirty: false,
            changed: false,
        }
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn is(&self, state: S) -> bool {
        self.state == state
    }

    /// Switch state, restart the timer, and flag for replication.
    pub fn transition(&mut self, next: S) {
        tracing::debug!(from = ?self.state, to = ?next, after = self.timer, "State transition");
        self.state = next;
        self.timer = 0;
        self.dirty = true;
        self.changed = true;
    }

    pub fn end_tick(&mut self) {
        if !self.changed {
            self.timer = self.timer.saturating_add(1);
        }
        self.changed = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn write(&self, writer: &mut impl NetWriter) {
        writer.write_u8(self.state.index());
        writer.write_u32(self.timer);
    }

    /// Decode state and timer without applying them.
    pub fn read(reader: &mut impl NetReader) -> Result<(S, u32), NetError> {
        let value = reader.read_u8()?;
        let state = S::from_index(value).ok_or(NetError::InvalidState { value })?;
        let timer = reader.read_u32()?;
        Ok((state, timer))
    }

    pub fn restore(&mut self, state: S, timer: u32) {
        self.state = state;
        self.timer = timer;
        self.changed = false;
    }
}

impl FsmState for exomech_types::NarratorState {
    fn index(self) -> u8 {
        exomech_types::NarratorState::index(self)
    }

    fn from_index(index: u8) -> Option<Self> {
        exomech_types::NarratorState::from_index(index)
    }
}

/// Declare a behavior state enum with sequential wire indices.
macro_rules! fsm_states {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl $crate::behavior::FsmState for $name {
            fn index(self) -> u8 {
                Self::ALL.iter().position(|s| *s == self).unwrap_or(0) as u8
            }

            fn from_index(index: u8) -> Option<Self> {
                Self::ALL.get(index as usize).copied()
            }
        }
    };
}

pub(crate) use fsm_states;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{PacketReader, PacketWriter};

    fsm_states! {
        enum Light { Red, Green }
    }

    #[test]
    fn timer_restarts_on_transition() {
        let mut fsm = StateMachine::new(Light::Red);
        fsm.end_tick();
        fsm.end_tick();
        assert_eq!(fsm.timer(), 2);
        assert!(!fsm.is_dirty());

        fsm.transition(Light::Green);
        fsm.end_tick();
        assert_eq!((fsm.state(), fsm.timer()), (Light::Green, 0));
        assert!(fsm.is_dirty());
        fsm.end_tick();
        assert_eq!(fsm.timer(), 1);
    }

    #[test]
    fn wire_roundtrip_and_bad_index() {
        let mut fsm = StateMachine::new(Light::Green);
        fsm.restore(Light::Green, 44);
        let mut writer = PacketWriter::new();
        fsm.write(&mut writer);
        let mut reader = PacketReader::new(writer.finish());
        assert_eq!(
            StateMachine::<Light>::read(&mut reader).unwrap(),
            (Light::Green, 44)
        );

        let mut bad = PacketWriter::new();
        bad.write_u8(9);
        bad.write_u32(0);
        let mut reader = PacketReader::new(bad.finish());
        assert_eq!(
            StateMachine::<Light>::read(&mut reader).unwrap_err(),
            NetError::InvalidState { value: 9 }
        );
    }
}
