//! Status effect capability set

use serde::{Deserialize, Serialize};

use crate::combatant::vitals::{LifeEvent, Vitals};

/// Quantity and remaining duration of an effect
///
/// A negative duration never runs out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectParams {
    pub amount: f32,
    pub duration: f32,
}

impl EffectParams {
    pub fn new(amount: f32, duration: f32) -> Self {
        Self {
            amount: amount.max(0.0),
            duration,
        }
    }

    /// Duration that never counts down
    pub fn permanent(amount: f32) -> Self {
        Self::new(amount, -1.0)
    }

    /// Count the duration down by `dt`, stopping at zero
    pub fn count_down(&mut self, dt: f32) {
        if self.duration > 0.0 {
            self.duration = (self.duration - dt).max(0.0);
        }
    }

    /// Add quantities, keep the longer duration
    pub fn merge(&mut self, incoming: EffectParams) {
        self.amount += incoming.amount;
        self.duration = self.duration.max(incoming.duration);
    }

    pub fn is_spent(&self) -> bool {
        self.amount <= 0.0 && self.duration <= 0.0
    }
}

/// Sink an effect writes into while it runs
///
/// Damage and stun go straight to the owner's vitals. New effects are
/// queued and added to the collection once the current pass finishes.
pub struct EffectContext<'a> {
    vitals: &'a mut Vitals,
    events: &'a mut Vec<LifeEvent>,
    spawned: &'a mut Vec<Box<dyn StatusEffect>>,
}

impl<'a> EffectContext<'a> {
    pub fn new(
        vitals: &'a mut Vitals,
        events: &'a mut Vec<LifeEvent>,
        spawned: &'a mut Vec<Box<dyn StatusEffect>>,
    ) -> Self {
        Self {
            vitals,
            events,
            spawned,
        }
    }

    pub fn vitals(&self) -> &Vitals {
        self.vitals
    }

    pub fn apply_damage(&mut self, amount: i32) {
        if let Some(event) = self.vitals.apply_damage(amount) {
            self.events.push(event);
        }
    }

    pub fn add_stun(&mut self, amount: f32) {
        if let Some(event) = self.vitals.add_stun(amount) {
            self.events.push(event);
        }
    }

    /// Queue another effect for add-or-stack on the same owner
    pub fn add_or_stack(&mut self, effect: Box<dyn StatusEffect>) {
        self.spawned.push(effect);
    }
}

/// A timed, stackable effect on a combatant
///
/// At most one instance per `id` lives on a combatant; repeated applications
/// call `stack` on the existing instance.
pub trait StatusEffect: std::fmt::Debug {
    fn id(&self) -> &str;

    /// Current quantity and remaining duration
    fn params(&self) -> EffectParams;

    fn on_apply(&mut self, _ctx: &mut EffectContext<'_>) {}

    fn on_tick(&mut self, ctx: &mut EffectContext<'_>, dt: f32);

    /// Merge a second application of the same id
    fn stack(&mut self, incoming: EffectParams);

    fn on_remove(&mut self, _ctx: &mut EffectContext<'_>) {}

    fn is_expired(&self) -> bool {
        self.params().is_spent()
    }
}
