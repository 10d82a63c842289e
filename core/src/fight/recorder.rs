//! Per-phase duration tracking driven by fight signals.

use std::collections::BTreeMap;

use crate::fight::FightView;
use crate::signal::{FightListener, FightSignal};

/// Counts how many ticks the fight spends in each phase.
///
/// The start phase is not counted. Clears itself when the fight resets.
#[derive(Debug, Clone, Default)]
pub struct PhaseDurationRecorder {
    durations: BTreeMap<u32, u32>,
}

impl PhaseDurationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(&self, ordering: u32) -> u32 {
        self.durations.get(&ordering).copied().unwrap_or(0)
    }

    pub fn durations(&self) -> &BTreeMap<u32, u32> {
        &self.durations
    }

    pub fn total(&self) -> u32 {
        self.durations.values().sum()
    }
}

impl FightListener for PhaseDurationRecorder {
    fn handle_signal(&mut self, signal: &FightSignal, _view: &FightView) {
        if matches!(signal, FightSignal::FightReset) {
            self.durations.clear();
        }
    }

    fn on_tick(&mut self, view: &FightView) {
        if view.ongoing && view.phase >= 1 {
            *self.durations.entry(view.phase).or_default() += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(phase: u32) -> FightView {
        FightView {
            ongoing: true,
            phase,
            ..Default::default()
        }
    }

    #[test]
    fn counts_ticks_per_phase_and_clears_on_reset() {
        let mut recorder = PhaseDurationRecorder::new();
        recorder.on_tick(&view(0));
        recorder.on_tick(&view(1));
        recorder.on_tick(&view(1));
        recorder.on_tick(&view(2));
        assert_eq!(recorder.duration(0), 0);
        assert_eq!(recorder.duration(1), 2);
        assert_eq!(recorder.total(), 3);

        recorder.handle_signals(&[FightSignal::FightReset], &FightView::default());
        assert!(recorder.durations().is_empty());
    }
}
