//! Line of sight over grid terrain

pub mod line_of_sight;
pub mod supercover;

pub use line_of_sight::{LineOfSight, LosConfig, LosStats};
pub use supercover::supercover;
