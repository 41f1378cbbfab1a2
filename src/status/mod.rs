//! Status effect engine
//!
//! Effects are trait objects created through an id-keyed registry and held
//! by a per-combatant collection that ticks them on a fixed cadence.

pub mod bleed;
pub mod collection;
pub mod effect;
pub mod hemorrhage;
pub mod registry;

pub use bleed::{BleedEffect, BleedTuning, BLEED_ID};
pub use collection::{StatusEffects, StatusTuning};
pub use effect::{EffectContext, EffectParams, StatusEffect};
pub use hemorrhage::{HemorrhageEffect, HemorrhageTuning, HEMORRHAGE_ID};
pub use registry::EffectRegistry;
