//! Hemorrhage: stacking stun accumulation

use serde::{Deserialize, Serialize};

use crate::status::effect::{EffectContext, EffectParams, StatusEffect};

pub const HEMORRHAGE_ID: &str = "Hemorrhage";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HemorrhageTuning {
    /// Stun gained per second per unit of amount
    pub stun_per_sec_per_amount: f32,
    /// Natural amount recovery per second
    pub decay_per_sec: f32,
}

impl Default for HemorrhageTuning {
    fn default() -> Self {
        Self {
            stun_per_sec_per_amount: 0.5,
            decay_per_sec: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HemorrhageEffect {
    params: EffectParams,
    tuning: HemorrhageTuning,
}

impl HemorrhageEffect {
    pub fn new(params: EffectParams, tuning: HemorrhageTuning) -> Self {
        Self {
            params: EffectParams::new(params.amount, params.duration),
            tuning,
        }
    }
}

impl StatusEffect for HemorrhageEffect {
    fn id(&self) -> &str {
        HEMORRHAGE_ID
    }

    fn params(&self) -> EffectParams {
        self.params
    }

    fn on_tick(&mut self, ctx: &mut EffectContext<'_>, dt: f32) {
        self.params.count_down(dt);

        let stun = self.tuning.stun_per_sec_per_amount * self.params.amount * dt;
        if stun > 0.0 {
            ctx.add_stun(stun);
        }

        if self.tuning.decay_per_sec > 0.0 {
            self.params.amount = (self.params.amount - self.tuning.decay_per_sec * dt).max(0.0);
        }
    }

    fn stack(&mut self, incoming: EffectParams) {
        self.params.merge(incoming);
    }
}
