pub mod config;
pub mod error;
pub mod types;

pub use config::KernelConfig;
pub use error::{Result, TacticsError};
pub use types::{CombatantId, FactionId, Tick, Vec2};
