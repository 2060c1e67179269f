//! scenario_state - Page state for a simulation view
//!
//! This crate provides the single state object a simulation page holds,
//! the events that move it between load and turn phases, the request
//! sequencing that discards stale responses, and the single-slot recorder.

pub mod machine;
pub mod recording;
pub mod sequencer;

// Re-export commonly used types
pub use machine::{
    LoadPhase, PhaseSnapshot, ScenarioEvent, ScenarioMachine, ScenarioState, StateTransition,
    TransitionError, TurnKind, TurnPhase,
};
pub use recording::{AudioCapture, CaptureHandle, Recorder, RecordingError};
pub use sequencer::{RequestKind, RequestSequencer, RequestTicket};
