use crate::actor::{ActorId, ActorType};
use crate::fight::FightView;

/// Fight-level events produced by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum FightSignal {
    /// First role-group member seen since the last reset.
    FightStarted,

    MemberFirstSeen {
        kind: ActorType,
    },

    PrimaryElected {
        actor: ActorId,
        kind: ActorType,
    },

    PhaseChanged {
        from: u32,
        to: u32,
        name: String,
    },

    /// Everything tracked is gone; stateful collaborators should clear.
    FightReset,
}

/// Trait for collaborators that react to fight signals.
/// Implement this for scoring, cinematic triggers, UI feeds, etc.
pub trait FightListener {
    /// Handle a single signal with the view as of the end of this tick.
    fn handle_signal(&mut self, signal: &FightSignal, view: &FightView);

    /// Handle multiple signals (default implementation calls handle_signal for each)
    fn handle_signals(&mut self, signals: &[FightSignal], view: &FightView) {
        for signal in signals {
            self.handle_signal(signal, view);
        }
    }

    /// Called once per tick after signals are delivered
    fn on_tick(&mut self, _view: &FightView) {}
}
