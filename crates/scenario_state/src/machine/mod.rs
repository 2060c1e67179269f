//! State machine module - Load and turn phases of a simulation page

mod events;
mod states;
mod transitions;

pub use events::ScenarioEvent;
pub use states::{LoadPhase, PhaseSnapshot, ScenarioState, TurnKind, TurnPhase};
pub use transitions::{ScenarioMachine, StateTransition, TransitionError};
