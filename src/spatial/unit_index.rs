//! Spatial index of living combatants
//!
//! Three mappings (all units, by faction, by cell) are kept consistent by
//! validating every mutation before touching any of them.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::core::error::{Result, TacticsError};
use crate::core::types::{CombatantId, FactionId};
use crate::grid::{Cell, GridTerrain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    faction: FactionId,
    cell: Cell,
}

#[derive(Debug, Default)]
pub struct UnitIndex {
    all: AHashMap<CombatantId, IndexEntry>,
    by_faction: BTreeMap<FactionId, Vec<CombatantId>>,
    by_cell: AHashMap<Cell, Vec<CombatantId>>,
}

impl UnitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.all.contains_key(&id)
    }

    pub fn register<T: GridTerrain>(
        &mut self,
        terrain: &T,
        id: CombatantId,
        faction: FactionId,
        cell: Cell,
    ) -> Result<()> {
        if !terrain.in_bounds(cell) {
            return Err(TacticsError::OutOfBounds(cell));
        }
        if self.all.contains_key(&id) {
            return Err(TacticsError::AlreadyRegistered(id));
        }

        self.all.insert(id, IndexEntry { faction, cell });
        self.by_faction.entry(faction).or_default().push(id);
        self.by_cell.entry(cell).or_default().push(id);
        tracing::trace!("registered {} ({}) at {}", id, faction, cell);
        Ok(())
    }

    pub fn unregister(&mut self, id: CombatantId) -> Result<()> {
        let entry = self
            .all
            .remove(&id)
            .ok_or(TacticsError::CombatantNotFound(id))?;

        if let Some(members) = self.by_faction.get_mut(&entry.faction) {
            members.retain(|&m| m != id);
            if members.is_empty() {
                self.by_faction.remove(&entry.faction);
            }
        }
        self.remove_from_cell(id, entry.cell);
        tracing::trace!("unregistered {}", id);
        Ok(())
    }

    /// Move a combatant between cells
    ///
    /// `old` must match the indexed cell. Nothing changes on error.
    pub fn update_cell<T: GridTerrain>(
        &mut self,
        terrain: &T,
        id: CombatantId,
        old: Cell,
        new: Cell,
    ) -> Result<()> {
        let entry = self
            .all
            .get(&id)
            .copied()
            .ok_or(TacticsError::CombatantNotFound(id))?;
        if entry.cell != old {
            return Err(TacticsError::StaleCell {
                id,
                indexed: entry.cell,
                claimed: old,
            });
        }
        if !terrain.in_bounds(new) {
            return Err(TacticsError::OutOfBounds(new));
        }
        if old == new {
            return Ok(());
        }

        self.remove_from_cell(id, old);
        self.by_cell.entry(new).or_default().push(id);
        if let Some(e) = self.all.get_mut(&id) {
            e.cell = new;
        }
        Ok(())
    }

    fn remove_from_cell(&mut self, id: CombatantId, cell: Cell) {
        if let Some(occupants) = self.by_cell.get_mut(&cell) {
            occupants.retain(|&o| o != id);
            if occupants.is_empty() {
                self.by_cell.remove(&cell);
            }
        }
    }

    pub fn cell_of(&self, id: CombatantId) -> Option<Cell> {
        self.all.get(&id).map(|e| e.cell)
    }

    pub fn faction_of(&self, id: CombatantId) -> Option<FactionId> {
        self.all.get(&id).map(|e| e.faction)
    }

    pub fn occupants_of(&self, cell: Cell) -> &[CombatantId] {
        self.by_cell.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        !self.occupants_of(cell).is_empty()
    }

    /// Is the cell held by anyone other than `id`?
    pub fn is_occupied_by_other(&self, cell: Cell, id: CombatantId) -> bool {
        self.occupants_of(cell).iter().any(|&o| o != id)
    }

    pub fn members_of(&self, faction: FactionId) -> &[CombatantId] {
        self.by_faction
            .get(&faction)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every indexed combatant not in `faction`
    pub fn enemies_of(&self, faction: FactionId) -> impl Iterator<Item = CombatantId> + '_ {
        self.by_faction
            .iter()
            .filter(move |(f, _)| **f != faction)
            .flat_map(|(_, members)| members.iter().copied())
    }

    /// Factions with at least one indexed member
    pub fn factions(&self) -> impl Iterator<Item = FactionId> + '_ {
        self.by_faction.keys().copied()
    }

    /// Closest enemy of `seeker` by squared cell distance
    ///
    /// `max_range` is in cells; `None` is unlimited. Ties go to the first
    /// enemy scanned.
    pub fn nearest_enemy(&self, seeker: CombatantId, max_range: Option<f32>) -> Option<CombatantId> {
        self.nearest_enemy_where(seeker, max_range, |_, _| true)
    }

    /// `nearest_enemy` restricted to enemies accepted by `accept`
    pub fn nearest_enemy_where(
        &self,
        seeker: CombatantId,
        max_range: Option<f32>,
        mut accept: impl FnMut(CombatantId, Cell) -> bool,
    ) -> Option<CombatantId> {
        let me = self.all.get(&seeker)?;
        let range_sq = max_range.map(|r| f64::from(r) * f64::from(r));

        let mut best: Option<(i64, CombatantId)> = None;
        for enemy in self.enemies_of(me.faction) {
            let Some(entry) = self.all.get(&enemy) else {
                continue;
            };
            let d2 = me.cell.distance_squared(&entry.cell);
            if let Some(limit) = range_sq {
                if d2 as f64 > limit {
                    continue;
                }
            }
            if best.is_some_and(|(best_d2, _)| d2 >= best_d2) {
                continue;
            }
            if accept(enemy, entry.cell) {
                best = Some((d2, enemy));
            }
        }

        best.map(|(_, id)| id)
    }

    /// Combatants in the square of cells within `radius` of `center`
    ///
    /// Only populated cells are visited, in row-major order.
    pub fn query_radius(&self, center: Cell, radius: i32) -> Vec<CombatantId> {
        let Ok(radius) = u32::try_from(radius) else {
            return Vec::new();
        };

        let mut cells: Vec<(&Cell, &Vec<CombatantId>)> = self
            .by_cell
            .iter()
            .filter(|(cell, _)| center.chebyshev(cell) <= radius)
            .collect();
        cells.sort_by_key(|(cell, _)| (cell.y, cell.x));
        cells
            .into_iter()
            .flat_map(|(_, occupants)| occupants.iter().copied())
            .collect()
    }

    /// Check that the three mappings agree with each other
    pub fn is_consistent(&self) -> bool {
        let faction_total: usize = self.by_faction.values().map(Vec::len).sum();
        let cell_total: usize = self.by_cell.values().map(Vec::len).sum();
        if faction_total != self.all.len() || cell_total != self.all.len() {
            return false;
        }

        let factions_ok = self.by_faction.iter().all(|(faction, members)| {
            !members.is_empty()
                && members
                    .iter()
                    .all(|id| self.all.get(id).is_some_and(|e| e.faction == *faction))
        });
        let cells_ok = self.by_cell.iter().all(|(cell, occupants)| {
            !occupants.is_empty()
                && occupants
                    .iter()
                    .all(|id| self.all.get(id).is_some_and(|e| e.cell == *cell))
        });

        factions_ok && cells_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileMap;

    fn setup() -> (TileMap, UnitIndex) {
        (TileMap::new(20, 20), UnitIndex::new())
    }

    #[test]
    fn test_register_and_query() {
        let (map, mut index) = setup();
        let a = CombatantId::new();
        let b = CombatantId::new();
        index.register(&map, a, FactionId(1), Cell::new(2, 2)).unwrap();
        index.register(&map, b, FactionId(2), Cell::new(2, 2)).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.occupants_of(Cell::new(2, 2)).len(), 2);
        assert_eq!(index.members_of(FactionId(1)), &[a]);
        assert_eq!(index.enemies_of(FactionId(1)).collect::<Vec<_>>(), vec![b]);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_register_rejects_out_of_bounds_and_duplicates() {
        let (map, mut index) = setup();
        let a = CombatantId::new();
        assert!(matches!(
            index.register(&map, a, FactionId(1), Cell::new(25, 0)),
            Err(TacticsError::OutOfBounds(_))
        ));
        index.register(&map, a, FactionId(1), Cell::new(0, 0)).unwrap();
        assert!(matches!(
            index.register(&map, a, FactionId(2), Cell::new(1, 0)),
            Err(TacticsError::AlreadyRegistered(_))
        ));
        assert!(index.is_consistent());
        assert_eq!(index.faction_of(a), Some(FactionId(1)));
    }

    #[test]
    fn test_update_cell() {
        let (map, mut index) = setup();
        let a = CombatantId::new();
        index.register(&map, a, FactionId(1), Cell::new(0, 0)).unwrap();
        index
            .update_cell(&map, a, Cell::new(0, 0), Cell::new(1, 0))
            .unwrap();

        assert!(!index.is_occupied(Cell::new(0, 0)));
        assert_eq!(index.cell_of(a), Some(Cell::new(1, 0)));
        assert!(index.is_consistent());
    }

    #[test]
    fn test_stale_update_changes_nothing() {
        let (map, mut index) = setup();
        let a = CombatantId::new();
        index.register(&map, a, FactionId(1), Cell::new(3, 3)).unwrap();

        let result = index.update_cell(&map, a, Cell::new(0, 0), Cell::new(1, 0));
        assert!(matches!(result, Err(TacticsError::StaleCell { .. })));
        assert_eq!(index.cell_of(a), Some(Cell::new(3, 3)));

        let result = index.update_cell(&map, a, Cell::new(3, 3), Cell::new(-1, 0));
        assert!(matches!(result, Err(TacticsError::OutOfBounds(_))));
        assert_eq!(index.cell_of(a), Some(Cell::new(3, 3)));
        assert!(index.is_consistent());
    }

    #[test]
    fn test_unregister() {
        let (map, mut index) = setup();
        let a = CombatantId::new();
        index.register(&map, a, FactionId(1), Cell::new(0, 0)).unwrap();
        index.unregister(a).unwrap();

        assert!(index.is_empty());
        assert!(index.members_of(FactionId(1)).is_empty());
        assert!(matches!(
            index.unregister(a),
            Err(TacticsError::CombatantNotFound(_))
        ));
        assert!(index.is_consistent());
    }

    #[test]
    fn test_nearest_enemy() {
        let (map, mut index) = setup();
        let me = CombatantId::new();
        let friend = CombatantId::new();
        let near = CombatantId::new();
        let far = CombatantId::new();
        index.register(&map, me, FactionId(1), Cell::new(0, 0)).unwrap();
        index.register(&map, friend, FactionId(1), Cell::new(1, 0)).unwrap();
        index.register(&map, far, FactionId(2), Cell::new(10, 10)).unwrap();
        index.register(&map, near, FactionId(3), Cell::new(3, 4)).unwrap();

        assert_eq!(index.nearest_enemy(me, None), Some(near));
        assert_eq!(index.nearest_enemy(me, Some(5.0)), Some(near));
        assert_eq!(index.nearest_enemy(me, Some(4.9)), None);
        assert_eq!(
            index.nearest_enemy_where(me, None, |id, _| id != near),
            Some(far)
        );
    }

    #[test]
    fn test_nearest_enemy_tie_goes_to_first_scanned() {
        let (map, mut index) = setup();
        let me = CombatantId::new();
        let first = CombatantId::new();
        let second = CombatantId::new();
        index.register(&map, me, FactionId(1), Cell::new(5, 5)).unwrap();
        index.register(&map, first, FactionId(2), Cell::new(7, 5)).unwrap();
        index.register(&map, second, FactionId(2), Cell::new(3, 5)).unwrap();

        assert_eq!(index.nearest_enemy(me, None), Some(first));
    }

    #[test]
    fn test_query_radius() {
        let (map, mut index) = setup();
        let inside = CombatantId::new();
        let corner = CombatantId::new();
        let outside = CombatantId::new();
        index.register(&map, inside, FactionId(1), Cell::new(5, 5)).unwrap();
        index.register(&map, corner, FactionId(1), Cell::new(7, 7)).unwrap();
        index.register(&map, outside, FactionId(2), Cell::new(8, 5)).unwrap();

        let found = index.query_radius(Cell::new(5, 5), 2);
        assert_eq!(found.len(), 2);
        assert!(!found.contains(&outside));
        assert!(index.query_radius(Cell::new(5, 5), -1).is_empty());
    }

    #[test]
    fn test_query_radius_huge() {
        let (map, mut index) = setup();
        assert!(index.query_radius(Cell::new(5, 5), i32::MAX).is_empty());

        let a = CombatantId::new();
        let b = CombatantId::new();
        index.register(&map, a, FactionId(1), Cell::new(19, 19)).unwrap();
        index.register(&map, b, FactionId(2), Cell::new(0, 0)).unwrap();
        assert_eq!(index.query_radius(Cell::new(5, 5), i32::MAX), vec![b, a]);
        assert_eq!(index.query_radius(Cell::new(i32::MIN, i32::MAX), i32::MAX).len(), 0);
    }
}
