//! Spatial lookups over combatant positions

pub mod unit_index;

pub use unit_index::UnitIndex;
