//! Per-unit fire cadence

use rand::Rng;

use crate::battle::context::TacticalContext;
use crate::combat::events::ShotOutcome;
use crate::combat::resolver::CombatResolver;
use crate::core::types::CombatantId;
use crate::grid::GridTerrain;

/// Decides when a unit pulls the trigger
///
/// Fires at the manual override target if one is set and alive, otherwise
/// at whatever the targeting controller is tracking.
#[derive(Debug, Clone, Default)]
pub struct FireControl {
    cooldown: f32,
    override_target: Option<CombatantId>,
}

impl FireControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_override_target(&mut self, target: Option<CombatantId>) {
        self.override_target = target;
    }

    pub fn override_target(&self) -> Option<CombatantId> {
        self.override_target
    }

    /// Seconds until the next shot is allowed
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Reset the cooldown, e.g. after changing weapons
    pub fn reset(&mut self) {
        self.cooldown = 0.0;
    }

    /// Advance the cooldown and fire if possible
    ///
    /// Returns the shot outcome when a shot was taken.
    pub fn update<T: GridTerrain, R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        owner: CombatantId,
        tracked: Option<CombatantId>,
        resolver: &mut CombatResolver,
        ctx: &mut TacticalContext<'_, T>,
        rng: &mut R,
    ) -> Option<ShotOutcome> {
        self.cooldown = (self.cooldown - dt).max(0.0);

        let target = self
            .override_target
            .filter(|&id| ctx.roster.is_alive(id))
            .or(tracked)?;
        if self.cooldown > 0.0 {
            return None;
        }

        let shooter = ctx.roster.get(owner).filter(|c| c.can_act())?;
        let range = shooter.weapon().range_cells;
        let cooldown = shooter.weapon().cooldown();

        let from = ctx.index.cell_of(owner)?;
        let to = ctx.index.cell_of(target)?;
        let range_sq = f64::from(range) * f64::from(range);
        if from.distance_squared(&to) as f64 > range_sq {
            return None;
        }
        if !ctx.line_of_sight.can_see(ctx.terrain, from, to, None) {
            return None;
        }

        self.cooldown = cooldown;
        Some(resolver.resolve_shot(ctx, owner, target, rng))
    }
}
