//! Combatant state: vitals, effects and the owning roster

pub mod combatant;
pub mod vitals;

pub use combatant::{Combatant, Roster, UnitProfile};
pub use vitals::{LifeEvent, VitalState, Vitals};
