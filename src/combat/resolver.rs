//! Hitscan shot resolution
//!
//! Every shot between valid combatants publishes `ShotFired` first and then
//! exactly one of `Hit` or `Miss`. Damage lands before `Hit` is published.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::context::TacticalContext;
use crate::combat::events::{
    CombatEvent, CombatEventBus, HitReport, MissReason, MissReport, ShotOutcome, ShotReport,
    SubscriptionId,
};
use crate::core::types::{CombatantId, Vec2};
use crate::grid::GridTerrain;

/// Linear accuracy drop over a band of distances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracyFalloff {
    /// Distance (cells) where falloff begins
    pub start_cells: f32,
    /// Distance (cells) where accuracy bottoms out
    pub end_cells: f32,
    /// Accuracy at and beyond `end_cells`
    pub far_accuracy: f32,
}

impl Default for AccuracyFalloff {
    fn default() -> Self {
        Self {
            start_cells: 6.0,
            end_cells: 18.0,
            far_accuracy: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub allow_friendly_fire: bool,
    pub require_line_of_sight: bool,
    /// `None` uses the weapon accuracy at every distance
    pub falloff: Option<AccuracyFalloff>,
    /// Added to the attacker's cell centre to get the shot origin
    pub muzzle_offset: Vec2,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            allow_friendly_fire: false,
            require_line_of_sight: true,
            falloff: Some(AccuracyFalloff::default()),
            muzzle_offset: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Default)]
pub struct CombatResolver {
    config: CombatConfig,
    events: CombatEventBus,
}

impl CombatResolver {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            events: CombatEventBus::new(),
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CombatConfig) {
        self.config = config;
    }

    pub fn events_mut(&mut self) -> &mut CombatEventBus {
        &mut self.events
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&CombatEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Hit chance at a distance, clamped to [0, 1]
    pub fn accuracy_at(&self, base: f32, distance_cells: f32) -> f32 {
        let Some(falloff) = self.config.falloff else {
            return base.clamp(0.0, 1.0);
        };
        if falloff.end_cells <= falloff.start_cells || distance_cells <= falloff.start_cells {
            return base.clamp(0.0, 1.0);
        }
        if distance_cells >= falloff.end_cells {
            return falloff.far_accuracy.clamp(0.0, 1.0);
        }

        let t = (distance_cells - falloff.start_cells) / (falloff.end_cells - falloff.start_cells);
        (base + (falloff.far_accuracy - base) * t).clamp(0.0, 1.0)
    }

    /// Resolve one shot from `attacker` at `target`
    ///
    /// Missing or dead combatants produce an `InvalidCombatant` miss and no
    /// notifications. Friendly fire and blocked sight force a miss without
    /// drawing from `rng`.
    pub fn resolve_shot<T: GridTerrain, R: Rng + ?Sized>(
        &mut self,
        ctx: &mut TacticalContext<'_, T>,
        attacker: CombatantId,
        target: CombatantId,
        rng: &mut R,
    ) -> ShotOutcome {
        let shooter = ctx.roster.get(attacker).filter(|c| c.is_alive()).map(|c| {
            (
                c.faction,
                ctx.index.cell_of(attacker).unwrap_or(c.cell),
                c.weapon().clone(),
            )
        });
        let victim = ctx
            .roster
            .get(target)
            .filter(|c| c.is_alive())
            .map(|c| (c.faction, ctx.index.cell_of(target).unwrap_or(c.cell)));

        let (Some((a_faction, a_cell, weapon)), Some((t_faction, t_cell))) = (shooter, victim) else {
            return ShotOutcome::Miss(MissReport {
                attacker,
                target,
                origin: Vec2::ZERO,
                reason: MissReason::InvalidCombatant,
            });
        };

        let origin = ctx.terrain.cell_to_world_center(a_cell) + self.config.muzzle_offset;
        let aim_point = ctx.terrain.cell_to_world_center(t_cell);
        self.events.publish(&CombatEvent::ShotFired(ShotReport {
            attacker,
            target,
            origin,
            aim_point,
        }));

        let forced = if !self.config.allow_friendly_fire && a_faction == t_faction {
            Some(MissReason::FriendlyFire)
        } else if self.config.require_line_of_sight
            && !ctx.line_of_sight.can_see(ctx.terrain, a_cell, t_cell, None)
        {
            Some(MissReason::NoLineOfSight)
        } else {
            None
        };
        if let Some(reason) = forced {
            return self.miss(attacker, target, origin, reason);
        }

        let distance_cells = a_cell.distance(&t_cell);
        let accuracy = self.accuracy_at(weapon.accuracy, distance_cells);
        if rng.gen::<f32>() >= accuracy {
            return self.miss(attacker, target, origin, MissReason::Rolled);
        }

        let mut damage = weapon.damage.roll(rng);
        let critical = rng.gen::<f32>() < weapon.crit_chance;
        if critical {
            damage = ((damage as f32 * weapon.crit_multiplier).round() as i32).max(1);
        }

        let Some(victim) = ctx.roster.get_mut(target) else {
            return self.miss(attacker, target, origin, MissReason::InvalidCombatant);
        };
        victim.apply_damage(damage);
        let lethal = !victim.is_alive();

        let report = HitReport {
            attacker,
            target,
            damage,
            critical,
            accuracy,
            distance_cells,
            origin,
            contact_point: aim_point,
            lethal,
        };
        tracing::debug!(
            "{} hit {} for {}{} at {:.1} cells",
            attacker,
            target,
            damage,
            if critical { " (crit)" } else { "" },
            distance_cells
        );
        self.events.publish(&CombatEvent::Hit(report));

        for spec in &weapon.on_hit {
            let Some(victim) = ctx.roster.get_mut(target) else {
                break;
            };
            if !victim.is_alive() {
                break;
            }
            if !spec.roll(rng) {
                continue;
            }
            match ctx.effects.create(&spec.id, spec.amount, spec.duration) {
                Ok(effect) => victim.add_or_stack_effect(effect),
                Err(e) => tracing::warn!("skipping on-hit effect: {}", e),
            }
        }

        ShotOutcome::Hit(report)
    }

    fn miss(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        origin: Vec2,
        reason: MissReason,
    ) -> ShotOutcome {
        let report = MissReport {
            attacker,
            target,
            origin,
            reason,
        };
        tracing::trace!("{} missed {} ({})", attacker, target, reason);
        self.events.publish(&CombatEvent::Miss(report));
        ShotOutcome::Miss(report)
    }
}
