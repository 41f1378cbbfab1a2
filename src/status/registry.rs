//! Factory of status effects keyed by id
//!
//! New effect kinds plug in with `register`; nothing else needs to change.

use std::collections::BTreeMap;

use crate::core::error::{Result, TacticsError};
use crate::status::bleed::{BleedEffect, BLEED_ID};
use crate::status::collection::StatusTuning;
use crate::status::effect::{EffectParams, StatusEffect};
use crate::status::hemorrhage::{HemorrhageEffect, HEMORRHAGE_ID};

type EffectFactory = Box<dyn Fn(EffectParams) -> Box<dyn StatusEffect>>;

pub struct EffectRegistry {
    factories: BTreeMap<String, EffectFactory>,
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::with_defaults(&StatusTuning::default())
    }
}

impl EffectRegistry {
    /// Registry with no effect kinds
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with bleed and hemorrhage using the given tuning
    pub fn with_defaults(tuning: &StatusTuning) -> Self {
        let mut registry = Self::empty();

        let (bleed, hemorrhage) = (tuning.bleed, tuning.hemorrhage);
        registry.register(BLEED_ID, move |params| {
            Box::new(BleedEffect::new(params, bleed, hemorrhage))
        });
        registry.register(HEMORRHAGE_ID, move |params| {
            Box::new(HemorrhageEffect::new(params, hemorrhage))
        });

        registry
    }

    /// Add or replace the factory for `id`
    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn(EffectParams) -> Box<dyn StatusEffect> + 'static,
    ) {
        self.factories.insert(id.into(), Box::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a fresh effect instance
    pub fn create(&self, id: &str, amount: f32, duration: f32) -> Result<Box<dyn StatusEffect>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| TacticsError::UnknownEffect(id.to_string()))?;
        Ok(factory(EffectParams::new(amount, duration)))
    }
}
