//! Per-unit target selection

pub mod state_machine;

pub use state_machine::{TargetChanged, TargetState, TargetingConfig, TargetingController};
