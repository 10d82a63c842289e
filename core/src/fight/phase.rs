//! Phase definitions and the ordered phase graph.

use super::error::PhaseGraphError;
use super::snapshot::FightState;

pub type PhasePredicate = Box<dyn Fn(&FightState) -> bool + Send + Sync>;
pub type PhaseCallback = Box<dyn Fn(&FightState) + Send + Sync>;

/// One stage of the encounter.
pub struct PhaseDefinition {
    pub ordering: u32,
    pub name: String,
    predicate: PhasePredicate,
    on_start: Option<PhaseCallback>,
}

impl PhaseDefinition {
    pub fn new(
        ordering: u32,
        name: impl Into<String>,
        predicate: impl Fn(&FightState) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            ordering,
            name: name.into(),
            predicate: Box::new(predicate),
            on_start: None,
        }
    }

    /// The "no fight" phase every graph starts from.
    pub fn start(name: impl Into<String>) -> Self {
        Self::new(0, name, |_| true)
    }

    pub fn with_on_start(mut self, on_start: impl Fn(&FightState) + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(on_start));
        self
    }

    pub fn holds(&self, state: &FightState) -> bool {
        (self.predicate)(state)
    }

    pub(crate) fn fire_on_start(&self, state: &FightState) {
        if let Some(on_start) = &self.on_start {
            on_start(state);
        }
    }
}

impl std::fmt::Debug for PhaseDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseDefinition")
            .field("ordering", &self.ordering)
            .field("name", &self.name)
            .field("on_start", &self.on_start.is_some())
            .finish()
    }
}

/// Phases indexed by ordering, contiguous from 0.
#[derive(Debug)]
pub struct PhaseGraph {
    phases: Vec<PhaseDefinition>,
}

impl PhaseGraph {
    pub fn builder() -> PhaseGraphBuilder {
        PhaseGraphBuilder::default()
    }

    pub fn get(&self, ordering: u32) -> Option<&PhaseDefinition> {
        self.phases.get(ordering as usize)
    }

    pub fn name(&self, ordering: u32) -> &str {
        self.get(ordering).map_or("", |p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Highest ordering in the graph.
    pub fn last_ordering(&self) -> u32 {
        self.phases.len().saturating_sub(1) as u32
    }
}

#[derive(Debug, Default)]
pub struct PhaseGraphBuilder {
    phases: Vec<PhaseDefinition>,
}

impl PhaseGraphBuilder {
    pub fn phase(mut self, phase: PhaseDefinition) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn build(mut self) -> Result<PhaseGraph, PhaseGraphError> {
        self.phases.sort_by_key(|p| p.ordering);

        for (expected, phase) in self.phases.iter().enumerate() {
            let expected = expected as u32;
            if phase.ordering == expected {
                continue;
            }
            if expected > 0 && phase.ordering == expected - 1 {
                return Err(PhaseGraphError::DuplicateOrdering {
                    ordering: phase.ordering,
                });
            }
            if expected == 0 {
                return Err(PhaseGraphError::MissingStartPhase);
            }
            return Err(PhaseGraphError::MissingOrdering { ordering: expected });
        }

        if self.phases.is_empty() {
            return Err(PhaseGraphError::MissingStartPhase);
        }

        Ok(PhaseGraph {
            phases: self.phases,
        })
    }
}
