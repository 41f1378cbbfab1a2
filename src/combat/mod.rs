//! Ranged combat: weapons, shot resolution and fire cadence

pub mod events;
pub mod fire_control;
pub mod resolver;
pub mod weapon;

pub use events::{
    CombatEvent, CombatEventBus, HitReport, MissReason, MissReport, ShotOutcome, ShotReport,
    SubscriptionId,
};
pub use fire_control::FireControl;
pub use resolver::{AccuracyFalloff, CombatConfig, CombatResolver};
pub use weapon::{DamageRoll, EffectSpec, WeaponStats};
