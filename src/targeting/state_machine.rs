//! Sticky target selection
//!
//! A tracked target is kept for as long as it lives and stays visible, even
//! when a closer enemy shows up. Only an unselected controller looks for a
//! new target: the priority target first, then the nearest visible enemy.

use serde::{Deserialize, Serialize};

use crate::battle::context::TacticalContext;
use crate::core::types::CombatantId;
use crate::grid::{Cell, GridTerrain};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Seconds between evaluations
    pub tick_interval: f32,
    /// Seek radius in cells; `None` is unlimited
    pub max_seek_range: Option<f32>,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            tick_interval: 0.15,
            max_seek_range: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetState {
    #[default]
    Unselected,
    Tracking(CombatantId),
}

impl TargetState {
    pub fn target(&self) -> Option<CombatantId> {
        match self {
            TargetState::Unselected => None,
            TargetState::Tracking(id) => Some(*id),
        }
    }
}

/// One change of target
///
/// Switching targets in a single evaluation reports the loss first
/// (`current: None`), then the new target (`previous: None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetChanged {
    pub owner: CombatantId,
    pub previous: Option<CombatantId>,
    pub current: Option<CombatantId>,
}

#[derive(Debug, Clone)]
pub struct TargetingController {
    owner: CombatantId,
    config: TargetingConfig,
    state: TargetState,
    priority: Option<CombatantId>,
    accumulator: f32,
}

impl TargetingController {
    pub fn new(owner: CombatantId, config: TargetingConfig) -> Self {
        Self {
            owner,
            config,
            state: TargetState::Unselected,
            priority: None,
            accumulator: 0.0,
        }
    }

    pub fn owner(&self) -> CombatantId {
        self.owner
    }

    pub fn state(&self) -> TargetState {
        self.state
    }

    pub fn current(&self) -> Option<CombatantId> {
        self.state.target()
    }

    pub fn priority(&self) -> Option<CombatantId> {
        self.priority
    }

    /// Nominate a preferred target; evaluation runs on the next update
    pub fn set_priority_target(&mut self, target: Option<CombatantId>) {
        self.priority = target;
        self.accumulator = self.config.tick_interval;
    }

    pub fn clear_priority(&mut self) {
        self.priority = None;
    }

    /// Accumulate `dt` and evaluate once a tick interval has passed
    pub fn update<T: GridTerrain>(
        &mut self,
        dt: f32,
        ctx: &mut TacticalContext<'_, T>,
    ) -> Vec<TargetChanged> {
        self.accumulator += dt.max(0.0);
        if self.accumulator < self.config.tick_interval {
            return Vec::new();
        }
        self.accumulator = 0.0;
        self.evaluate(ctx)
    }

    /// Run one selection pass now
    pub fn evaluate<T: GridTerrain>(
        &mut self,
        ctx: &mut TacticalContext<'_, T>,
    ) -> Vec<TargetChanged> {
        let previous = self.state.target();
        let next = self.select(ctx);
        self.state = match next {
            Some(id) => TargetState::Tracking(id),
            None => TargetState::Unselected,
        };

        if next == previous {
            return Vec::new();
        }
        tracing::debug!(
            "{} target {:?} -> {:?}",
            self.owner,
            previous.map(|id| id.to_string()),
            next.map(|id| id.to_string())
        );

        let change = |previous, current| TargetChanged {
            owner: self.owner,
            previous,
            current,
        };
        if previous.is_some() && next.is_some() {
            vec![change(previous, None), change(None, next)]
        } else {
            vec![change(previous, next)]
        }
    }

    fn select<T: GridTerrain>(&self, ctx: &mut TacticalContext<'_, T>) -> Option<CombatantId> {
        let terrain = ctx.terrain;
        let index = ctx.index;
        let roster = &*ctx.roster;
        let line_of_sight = &mut *ctx.line_of_sight;

        if !roster.is_alive(self.owner) {
            return None;
        }
        let me = index.cell_of(self.owner)?;

        let mut visible = |cell: Cell| line_of_sight.can_see(terrain, me, cell, None);

        if let TargetState::Tracking(current) = self.state {
            if !roster.is_alive(current) {
                return None;
            }
            if index.cell_of(current).is_some_and(&mut visible) {
                return Some(current);
            }
        }

        if let Some(priority) = self.priority {
            if roster.is_alive(priority) && index.cell_of(priority).is_some_and(&mut visible) {
                return Some(priority);
            }
        }

        index.nearest_enemy_where(self.owner, self.config.max_seek_range, |id, cell| {
            roster.is_alive(id) && visible(cell)
        })
    }
}
