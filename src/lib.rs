pub mod logging;
pub mod scenario;
pub mod settings;

pub use scenario::{Outcome, Runner, Scenario, ScenarioError, ScenarioEvent};
pub use settings::{Settings, SettingsError};
