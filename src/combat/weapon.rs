//! Weapon authoring data

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a weapon rolls base damage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageRoll {
    /// Uniform integer in `[min, max]`
    Range { min: i32, max: i32 },
    /// `base` scaled by a uniform factor in `[1 - spread, 1 + spread]`
    Spread { base: i32, spread: f32 },
}

impl Default for DamageRoll {
    fn default() -> Self {
        DamageRoll::Range { min: 5, max: 12 }
    }
}

impl DamageRoll {
    /// Roll damage. Never below 1.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        let raw = match *self {
            DamageRoll::Range { min, max } => {
                let (lo, hi) = (min.min(max), min.max(max));
                rng.gen_range(lo..=hi)
            }
            DamageRoll::Spread { base, spread } => {
                let spread = spread.abs();
                let factor = if spread > 0.0 {
                    1.0 + rng.gen_range(-spread..=spread)
                } else {
                    1.0
                };
                (base as f32 * factor).round() as i32
            }
        };
        raw.max(1)
    }
}

/// A status effect a weapon may apply on hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub id: String,
    pub amount: f32,
    pub duration: f32,
    /// Application chance in `[0, 1]`; 1 or more always applies
    #[serde(default = "default_chance")]
    pub chance: f32,
}

fn default_chance() -> f32 {
    1.0
}

impl EffectSpec {
    pub fn new(id: impl Into<String>, amount: f32, duration: f32, chance: f32) -> Self {
        Self {
            id: id.into(),
            amount,
            duration,
            chance,
        }
    }

    /// Roll for application. Certain effects draw no randomness.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if self.chance >= 1.0 {
            return true;
        }
        rng.gen::<f32>() < self.chance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    /// Shots per second
    pub fire_rate: f32,
    /// Maximum engagement distance in cells
    pub range_cells: f32,
    /// Hit chance before distance falloff
    pub accuracy: f32,
    pub damage: DamageRoll,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub on_hit: Vec<EffectSpec>,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            fire_rate: 4.0,
            range_cells: 12.0,
            accuracy: 0.7,
            damage: DamageRoll::default(),
            crit_chance: 0.1,
            crit_multiplier: 1.5,
            on_hit: Vec::new(),
        }
    }
}

impl WeaponStats {
    /// Seconds between shots
    pub fn cooldown(&self) -> f32 {
        1.0 / self.fire_rate.max(0.01)
    }

    pub fn with_effect(mut self, effect: EffectSpec) -> Self {
        self.on_hit.push(effect);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_range_roll_stays_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let roll = DamageRoll::Range { min: 5, max: 12 };
        for _ in 0..200 {
            let d = roll.roll(&mut rng);
            assert!((5..=12).contains(&d));
        }
    }

    #[test]
    fn test_spread_roll() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let roll = DamageRoll::Spread {
            base: 20,
            spread: 0.1,
        };
        for _ in 0..200 {
            let d = roll.roll(&mut rng);
            assert!((18..=22).contains(&d));
        }
    }

    #[test]
    fn test_damage_is_at_least_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let roll = DamageRoll::Range { min: -3, max: 0 };
        assert_eq!(roll.roll(&mut rng), 1);
    }

    #[test]
    fn test_cooldown() {
        let weapon = WeaponStats::default();
        assert!((weapon.cooldown() - 0.25).abs() < 1e-6);

        let stalled = WeaponStats {
            fire_rate: 0.0,
            ..Default::default()
        };
        assert!((stalled.cooldown() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_certain_effect_always_applies() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let spec = EffectSpec::new("Bleed", 1.0, 2.0, 1.0);
        assert!((0..50).all(|_| spec.roll(&mut rng)));

        let never = EffectSpec::new("Bleed", 1.0, 2.0, 0.0);
        assert!((0..50).all(|_| !never.roll(&mut rng)));
    }
}
