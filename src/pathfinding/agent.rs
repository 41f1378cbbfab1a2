//! Path following with cell reservation

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::grid::{Cell, GridTerrain};
use crate::pathfinding::astar::Pathfinder;
use crate::spatial::UnitIndex;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Minimum seconds between two replans of the same agent
    pub repath_interval: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            repath_interval: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to do this tick
    Idle,
    /// Entered this cell
    Moved(Cell),
    /// The next cell could not be reserved; the path is kept
    Blocked(Cell),
}

/// Walks a combatant along a path one cell at a time
#[derive(Debug, Clone, Default)]
pub struct PathAgent {
    queue: VecDeque<Cell>,
    destination: Option<Cell>,
    /// Fraction of the next step already covered
    progress: f32,
    repath_interval: f32,
    /// Seconds left before another replan is allowed
    repath_cooldown: f32,
    /// Terrain version the queued route was planned against
    planned_version: u64,
}

impl PathAgent {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            repath_interval: config.repath_interval.max(0.0),
            ..Default::default()
        }
    }

    pub fn destination(&self) -> Option<Cell> {
        self.destination
    }

    pub fn next_cell(&self) -> Option<Cell> {
        self.queue.front().copied()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.destination = None;
        self.progress = 0.0;
        self.repath_cooldown = 0.0;
    }

    /// Plan a route from `from` to `goal`
    ///
    /// Returns false and clears any previous route if no path exists. A goal
    /// equal to `from` succeeds with nothing to walk.
    pub fn set_destination<T: GridTerrain>(
        &mut self,
        pathfinder: &Pathfinder,
        terrain: &T,
        from: Cell,
        goal: Cell,
    ) -> bool {
        self.clear();
        self.plan(pathfinder, terrain, from, goal)
    }

    fn plan<T: GridTerrain>(
        &mut self,
        pathfinder: &Pathfinder,
        terrain: &T,
        from: Cell,
        goal: Cell,
    ) -> bool {
        self.queue.clear();
        self.destination = None;
        self.planned_version = terrain.version();
        let Some(path) = pathfinder.find_path(terrain, from, goal) else {
            return false;
        };

        self.queue.extend(path.into_iter().skip(1));
        if !self.queue.is_empty() {
            self.destination = Some(goal);
        }
        true
    }

    /// Plan again from the unit's cell to the current destination
    ///
    /// Drops the order when the destination has become unreachable.
    fn replan<T: GridTerrain>(
        &mut self,
        pathfinder: &Pathfinder,
        terrain: &T,
        unit: &Combatant,
    ) {
        let Some(goal) = self.destination else {
            return;
        };
        self.repath_cooldown = self.repath_interval;
        if !self.plan(pathfinder, terrain, unit.cell, goal) {
            tracing::debug!("{} lost its route to {}", unit.id, goal);
            self.progress = 0.0;
        }
    }

    /// Try to step into the next queued cell
    ///
    /// The cell must be in bounds, passable and free of other combatants.
    /// On success the combatant and the index move together.
    pub fn try_advance<T: GridTerrain>(
        &mut self,
        terrain: &T,
        index: &mut UnitIndex,
        unit: &mut Combatant,
    ) -> StepOutcome {
        let Some(next) = self.next_cell() else {
            return StepOutcome::Idle;
        };

        if !terrain.in_bounds(next)
            || !terrain.is_passable(next)
            || index.is_occupied_by_other(next, unit.id)
        {
            return StepOutcome::Blocked(next);
        }

        if let Err(e) = index.update_cell(terrain, unit.id, unit.cell, next) {
            tracing::warn!("{} could not move to {}: {}", unit.id, next, e);
            return StepOutcome::Blocked(next);
        }

        unit.cell = next;
        self.queue.pop_front();
        if self.queue.is_empty() {
            self.destination = None;
        }
        StepOutcome::Moved(next)
    }

    /// Advance by `dt` seconds at the unit's move speed
    ///
    /// Takes at most one step per call. Units that cannot act do not move.
    /// The route is planned again when the terrain changed since it was
    /// planned or the next cell is blocked, at most once per repath interval.
    pub fn update<T: GridTerrain>(
        &mut self,
        dt: f32,
        pathfinder: &Pathfinder,
        terrain: &T,
        index: &mut UnitIndex,
        unit: &mut Combatant,
    ) -> StepOutcome {
        if self.is_idle() || !unit.can_act() {
            return StepOutcome::Idle;
        }

        self.repath_cooldown = (self.repath_cooldown - dt.max(0.0)).max(0.0);
        if terrain.version() != self.planned_version && self.repath_cooldown <= 0.0 {
            self.replan(pathfinder, terrain, unit);
            if self.is_idle() {
                return StepOutcome::Idle;
            }
        }

        self.progress += dt.max(0.0) * unit.profile.move_speed.max(0.0);
        if self.progress < 1.0 {
            return StepOutcome::Idle;
        }

        let outcome = self.try_advance(terrain, index, unit);
        self.progress = match outcome {
            StepOutcome::Moved(_) => (self.progress - 1.0).min(1.0),
            _ => 1.0,
        };
        if matches!(outcome, StepOutcome::Blocked(_)) && self.repath_cooldown <= 0.0 {
            self.replan(pathfinder, terrain, unit);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::UnitProfile;
    use crate::core::types::{CombatantId, FactionId};
    use crate::grid::TileMap;

    fn unit_at(map: &TileMap, index: &mut UnitIndex, cell: Cell) -> Combatant {
        let unit = Combatant::new(FactionId(1), cell, UnitProfile::default(), 0.1);
        index.register(map, unit.id, unit.faction, cell).unwrap();
        unit
    }

    #[test]
    fn test_walks_the_path() {
        let map = TileMap::new(5, 1);
        let mut index = UnitIndex::new();
        let mut unit = unit_at(&map, &mut index, Cell::new(0, 0));
        let mut agent = PathAgent::new(&MovementConfig::default());

        assert!(agent.set_destination(&Pathfinder::default(), &map, unit.cell, Cell::new(3, 0)));
        assert_eq!(agent.remaining(), 3);

        for expected in 1..=3 {
            let outcome = agent.try_advance(&map, &mut index, &mut unit);
            assert_eq!(outcome, StepOutcome::Moved(Cell::new(expected, 0)));
        }
        assert!(agent.is_idle());
        assert_eq!(agent.destination(), None);
        assert_eq!(index.cell_of(unit.id), Some(Cell::new(3, 0)));
        assert!(index.is_consistent());
    }

    #[test]
    fn test_occupied_cell_blocks_and_keeps_path() {
        let map = TileMap::new(5, 1);
        let mut index = UnitIndex::new();
        let mut unit = unit_at(&map, &mut index, Cell::new(0, 0));
        let blocker = CombatantId::new();
        index.register(&map, blocker, FactionId(2), Cell::new(1, 0)).unwrap();

        let mut agent = PathAgent::new(&MovementConfig::default());
        // Plan ignores units; reservation does not
        agent.set_destination(&Pathfinder::default(), &map, unit.cell, Cell::new(2, 0));
        assert_eq!(
            agent.try_advance(&map, &mut index, &mut unit),
            StepOutcome::Blocked(Cell::new(1, 0))
        );
        assert_eq!(agent.remaining(), 2);
        assert_eq!(unit.cell, Cell::new(0, 0));

        index.unregister(blocker).unwrap();
        assert_eq!(
            agent.try_advance(&map, &mut index, &mut unit),
            StepOutcome::Moved(Cell::new(1, 0))
        );
    }

    #[test]
    fn test_unreachable_destination() {
        let map = TileMap::from_ascii(&[".#."]);
        let mut agent = PathAgent::new(&MovementConfig::default());
        assert!(!agent.set_destination(&Pathfinder::default(), &map, Cell::new(0, 0), Cell::new(2, 0)));
        assert!(agent.is_idle());
    }

    #[test]
    fn test_update_uses_move_speed() {
        let map = TileMap::new(10, 1);
        let mut index = UnitIndex::new();
        let mut unit = unit_at(&map, &mut index, Cell::new(0, 0));
        unit.profile.move_speed = 2.0;
        let mut agent = PathAgent::new(&MovementConfig::default());
        let pathfinder = Pathfinder::default();
        agent.set_destination(&pathfinder, &map, unit.cell, Cell::new(9, 0));

        let mut moves = 0;
        for _ in 0..10 {
            if let StepOutcome::Moved(_) = agent.update(0.25, &pathfinder, &map, &mut index, &mut unit) {
                moves += 1;
            }
        }
        // 2.5 s at 2 cells per second
        assert_eq!(moves, 5);
        assert_eq!(unit.cell, Cell::new(5, 0));
    }

    #[test]
    fn test_goal_equal_to_start_is_idle() {
        let map = TileMap::new(3, 3);
        let mut agent = PathAgent::new(&MovementConfig::default());
        assert!(agent.set_destination(&Pathfinder::default(), &map, Cell::new(1, 1), Cell::new(1, 1)));
        assert!(agent.is_idle());
        assert_eq!(agent.destination(), None);
    }

    #[test]
    fn test_replans_around_new_wall() {
        let mut map = TileMap::new(6, 3);
        let mut index = UnitIndex::new();
        let mut unit = unit_at(&map, &mut index, Cell::new(0, 1));
        unit.profile.move_speed = 10.0;
        let pathfinder = Pathfinder::default();
        let mut agent = PathAgent::new(&MovementConfig::default());
        agent.set_destination(&pathfinder, &map, unit.cell, Cell::new(5, 1));
        assert_eq!(agent.next_cell(), Some(Cell::new(1, 1)));

        map.place_wall(Cell::new(2, 1));
        for _ in 0..20 {
            agent.update(0.1, &pathfinder, &map, &mut index, &mut unit);
        }
        assert_eq!(unit.cell, Cell::new(5, 1));
        assert!(agent.is_idle());
        assert!(index.is_consistent());
    }

    #[test]
    fn test_sealed_destination_drops_the_order() {
        let mut map = TileMap::new(5, 1);
        let mut index = UnitIndex::new();
        let mut unit = unit_at(&map, &mut index, Cell::new(0, 0));
        let pathfinder = Pathfinder::default();
        let mut agent = PathAgent::new(&MovementConfig::default());
        agent.set_destination(&pathfinder, &map, unit.cell, Cell::new(4, 0));

        map.place_wall(Cell::new(2, 0));
        agent.update(0.1, &pathfinder, &map, &mut index, &mut unit);
        assert!(agent.is_idle());
        assert_eq!(agent.destination(), None);
    }

    #[test]
    fn test_blocked_agent_waits_for_repath_interval() {
        let map = TileMap::new(5, 1);
        let mut index = UnitIndex::new();
        let mut unit = unit_at(&map, &mut index, Cell::new(0, 0));
        unit.profile.move_speed = 10.0;
        let blocker = CombatantId::new();
        index.register(&map, blocker, FactionId(2), Cell::new(1, 0)).unwrap();

        let pathfinder = Pathfinder::default();
        let mut agent = PathAgent::new(&MovementConfig { repath_interval: 0.3 });
        agent.set_destination(&pathfinder, &map, unit.cell, Cell::new(3, 0));

        // The corridor has no detour, so the order survives every replan
        for _ in 0..10 {
            assert_eq!(
                agent.update(0.1, &pathfinder, &map, &mut index, &mut unit),
                StepOutcome::Blocked(Cell::new(1, 0))
            );
        }
        assert_eq!(agent.destination(), Some(Cell::new(3, 0)));

        index.unregister(blocker).unwrap();
        assert_eq!(
            agent.update(0.1, &pathfinder, &map, &mut index, &mut unit),
            StepOutcome::Moved(Cell::new(1, 0))
        );
    }
}
