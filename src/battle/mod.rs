//! Battle orchestration: dependency context, clock, scenarios and the
//! skirmish driver that steps every subsystem in order

pub mod clock;
pub mod context;
pub mod scenario;
pub mod skirmish;

pub use clock::GameClock;
pub use context::TacticalContext;
pub use scenario::{Scenario, UnitPlacement};
pub use skirmish::{Skirmish, SkirmishOutcome, SkirmishSummary, TickReport, UnitSummary};
