//! Per-combatant effect collection with a fixed tick cadence

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combatant::vitals::{LifeEvent, Vitals};
use crate::status::bleed::BleedTuning;
use crate::status::effect::{EffectContext, StatusEffect};
use crate::status::hemorrhage::HemorrhageTuning;

/// Tick cadence and per-effect tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTuning {
    /// Seconds of accumulated time before effects tick
    pub tick_interval: f32,
    pub bleed: BleedTuning,
    pub hemorrhage: HemorrhageTuning,
}

impl Default for StatusTuning {
    fn default() -> Self {
        Self {
            tick_interval: 0.1,
            bleed: BleedTuning::default(),
            hemorrhage: HemorrhageTuning::default(),
        }
    }
}

/// Active effects keyed by id
#[derive(Debug)]
pub struct StatusEffects {
    effects: BTreeMap<String, Box<dyn StatusEffect>>,
    tick_interval: f32,
    accumulator: f32,
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self::new(StatusTuning::default().tick_interval)
    }
}

impl StatusEffects {
    pub fn new(tick_interval: f32) -> Self {
        Self {
            effects: BTreeMap::new(),
            tick_interval,
            accumulator: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.effects.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&dyn StatusEffect> {
        self.effects.get(id).map(|e| e.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    /// Add a new effect, or stack it onto the live instance with the same id
    ///
    /// Ignored once the owner is dead.
    pub fn add_or_stack(
        &mut self,
        effect: Box<dyn StatusEffect>,
        vitals: &mut Vitals,
        events: &mut Vec<LifeEvent>,
    ) {
        let mut pending = vec![effect];
        while let Some(effect) = pending.pop() {
            if vitals.is_dead() {
                tracing::trace!("status effect {} dropped on a dead owner", effect.id());
                break;
            }
            if let Some(existing) = self.effects.get_mut(effect.id()) {
                existing.stack(effect.params());
                continue;
            }

            let mut effect = effect;
            let mut ctx = EffectContext::new(vitals, events, &mut pending);
            effect.on_apply(&mut ctx);
            tracing::trace!("status effect {} applied", effect.id());
            self.effects.insert(effect.id().to_string(), effect);
        }
    }

    /// Remove an effect, running its remove hook. Returns false if absent.
    pub fn remove(&mut self, id: &str, vitals: &mut Vitals, events: &mut Vec<LifeEvent>) -> bool {
        let Some(mut effect) = self.effects.remove(id) else {
            return false;
        };

        let mut spawned = Vec::new();
        let mut ctx = EffectContext::new(vitals, events, &mut spawned);
        effect.on_remove(&mut ctx);
        for e in spawned {
            self.add_or_stack(e, vitals, events);
        }
        true
    }

    /// Advance by `dt` seconds
    ///
    /// Effects only tick once the accumulated time reaches the tick interval,
    /// and then tick with the whole accumulated step. Returns true when a
    /// step ran.
    pub fn tick(&mut self, dt: f32, vitals: &mut Vitals, events: &mut Vec<LifeEvent>) -> bool {
        if vitals.is_dead() {
            return false;
        }

        self.accumulator += dt.max(0.0);
        if self.accumulator < self.tick_interval {
            return false;
        }
        let step = self.accumulator;
        self.accumulator = 0.0;

        let mut spawned = Vec::new();
        {
            let mut ctx = EffectContext::new(vitals, events, &mut spawned);
            for effect in self.effects.values_mut() {
                effect.on_tick(&mut ctx, step);
            }
        }

        for effect in spawned {
            self.add_or_stack(effect, vitals, events);
        }

        let expired: Vec<String> = self
            .effects
            .iter()
            .filter(|(_, e)| e.is_expired())
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            tracing::trace!("status effect {} expired", id);
            self.remove(&id, vitals, events);
        }

        true
    }

    /// Drop every effect without running hooks
    pub fn clear(&mut self) {
        self.effects.clear();
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::bleed::BleedEffect;
    use crate::status::effect::EffectParams;
    use crate::status::registry::EffectRegistry;

    fn setup() -> (StatusEffects, Vitals, Vec<LifeEvent>, EffectRegistry) {
        (
            StatusEffects::new(0.1),
            Vitals::new(100),
            Vec::new(),
            EffectRegistry::default(),
        )
    }

    #[test]
    fn test_same_id_stacks() {
        let (mut effects, mut vitals, mut events, registry) = setup();
        effects.add_or_stack(registry.create("Bleed", 2.0, 3.0).unwrap(), &mut vitals, &mut events);
        effects.add_or_stack(registry.create("Bleed", 1.0, 5.0).unwrap(), &mut vitals, &mut events);

        assert_eq!(effects.len(), 1);
        let params = effects.get("Bleed").unwrap().params();
        assert_eq!(params.amount, 3.0);
        assert_eq!(params.duration, 5.0);
    }

    #[test]
    fn test_bleed_scenario_one_second() {
        let (mut effects, mut vitals, mut events, registry) = setup();
        effects.add_or_stack(registry.create("Bleed", 2.0, 3.0).unwrap(), &mut vitals, &mut events);

        assert!(effects.tick(1.0, &mut vitals, &mut events));

        assert_eq!(vitals.hp(), 98);
        let hemo = effects.get("Hemorrhage").unwrap().params();
        assert!((hemo.amount - 0.4).abs() < 1e-5);
        // Hemorrhage spawned this step has not ticked yet
        assert_eq!(vitals.stun(), 0.0);
    }

    #[test]
    fn test_tick_waits_for_interval() {
        let (mut effects, mut vitals, mut events, registry) = setup();
        effects.add_or_stack(registry.create("Bleed", 10.0, 3.0).unwrap(), &mut vitals, &mut events);

        assert!(!effects.tick(0.05, &mut vitals, &mut events));
        assert_eq!(vitals.hp(), 100);

        // Accumulated 0.1 s of 10 dps
        assert!(effects.tick(0.05, &mut vitals, &mut events));
        assert_eq!(vitals.hp(), 99);
    }

    #[test]
    fn test_expired_effects_are_removed() {
        let (mut effects, mut vitals, mut events, _) = setup();
        let tuning = StatusTuning::default();
        let mut bleed_tuning = tuning.bleed;
        bleed_tuning.decay_per_sec = 10.0;
        bleed_tuning.to_hemorrhage_per_sec_per_amount = 0.0;
        effects.add_or_stack(
            Box::new(BleedEffect::new(
                EffectParams::new(1.0, 0.5),
                bleed_tuning,
                tuning.hemorrhage,
            )),
            &mut vitals,
            &mut events,
        );

        effects.tick(1.0, &mut vitals, &mut events);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_remove() {
        let (mut effects, mut vitals, mut events, registry) = setup();
        effects.add_or_stack(registry.create("Hemorrhage", 1.0, -1.0).unwrap(), &mut vitals, &mut events);
        assert!(effects.remove("Hemorrhage", &mut vitals, &mut events));
        assert!(!effects.remove("Hemorrhage", &mut vitals, &mut events));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_dead_owner_does_not_tick() {
        let (mut effects, mut vitals, mut events, registry) = setup();
        effects.add_or_stack(registry.create("Hemorrhage", 5.0, -1.0).unwrap(), &mut vitals, &mut events);
        vitals.apply_damage(100);

        assert!(!effects.tick(1.0, &mut vitals, &mut events));
        assert_eq!(vitals.stun(), 0.0);
    }

    #[test]
    fn test_dead_owner_takes_no_new_effects() {
        let (mut effects, mut vitals, mut events, registry) = setup();
        vitals.apply_damage(95);
        effects.add_or_stack(registry.create("Bleed", 10.0, 3.0).unwrap(), &mut vitals, &mut events);

        // The killing tick would also spawn hemorrhage
        assert!(effects.tick(1.0, &mut vitals, &mut events));
        assert!(vitals.is_dead());
        assert!(!effects.contains("Hemorrhage"));

        effects.add_or_stack(registry.create("Hemorrhage", 1.0, -1.0).unwrap(), &mut vitals, &mut events);
        assert!(!effects.contains("Hemorrhage"));
        assert_eq!(effects.ids().collect::<Vec<_>>(), vec!["Bleed"]);
    }
}
