//! Bleed: stacking damage over time that feeds hemorrhage

use serde::{Deserialize, Serialize};

use crate::status::effect::{EffectContext, EffectParams, StatusEffect};
use crate::status::hemorrhage::{HemorrhageEffect, HemorrhageTuning};

pub const BLEED_ID: &str = "Bleed";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BleedTuning {
    /// HP lost per second per unit of amount
    pub dps_per_amount: f32,
    /// Natural amount recovery per second
    pub decay_per_sec: f32,
    /// Hemorrhage gained per second per unit of amount
    pub to_hemorrhage_per_sec_per_amount: f32,
    /// Keep the fractional damage of a tick for the next one instead of
    /// flooring it away
    pub carry_remainder: bool,
}

impl Default for BleedTuning {
    fn default() -> Self {
        Self {
            dps_per_amount: 1.0,
            decay_per_sec: 0.0,
            to_hemorrhage_per_sec_per_amount: 0.2,
            carry_remainder: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BleedEffect {
    params: EffectParams,
    tuning: BleedTuning,
    hemorrhage: HemorrhageTuning,
    /// Fractional damage not yet applied
    carry: f32,
}

impl BleedEffect {
    pub fn new(params: EffectParams, tuning: BleedTuning, hemorrhage: HemorrhageTuning) -> Self {
        Self {
            params: EffectParams::new(params.amount, params.duration),
            tuning,
            hemorrhage,
            carry: 0.0,
        }
    }
}

impl StatusEffect for BleedEffect {
    fn id(&self) -> &str {
        BLEED_ID
    }

    fn params(&self) -> EffectParams {
        self.params
    }

    fn on_tick(&mut self, ctx: &mut EffectContext<'_>, dt: f32) {
        self.params.count_down(dt);

        let raw = self.tuning.dps_per_amount * self.params.amount * dt + self.carry;
        let damage = raw.floor();
        self.carry = if self.tuning.carry_remainder {
            raw - damage
        } else {
            0.0
        };
        if damage >= 1.0 {
            ctx.apply_damage(damage as i32);
        }

        let hemo = self.tuning.to_hemorrhage_per_sec_per_amount * self.params.amount * dt;
        if hemo > 0.0 {
            ctx.add_or_stack(Box::new(HemorrhageEffect::new(
                EffectParams::permanent(hemo),
                self.hemorrhage,
            )));
        }

        if self.tuning.decay_per_sec > 0.0 {
            self.params.amount = (self.params.amount - self.tuning.decay_per_sec * dt).max(0.0);
        }
    }

    fn stack(&mut self, incoming: EffectParams) {
        self.params.merge(incoming);
    }
}
