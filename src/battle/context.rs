//! Explicit dependency bundle for per-tick combat calls

use crate::combatant::Roster;
use crate::grid::GridTerrain;
use crate::spatial::UnitIndex;
use crate::status::EffectRegistry;
use crate::visibility::LineOfSight;

/// Everything a shot or a targeting decision reads or mutates
///
/// Built fresh by the caller for each batch of calls; components never
/// hold on to these references between ticks.
pub struct TacticalContext<'a, T: GridTerrain> {
    pub terrain: &'a T,
    pub index: &'a UnitIndex,
    pub roster: &'a mut Roster,
    pub line_of_sight: &'a mut LineOfSight,
    pub effects: &'a EffectRegistry,
}

impl<'a, T: GridTerrain> TacticalContext<'a, T> {
    pub fn new(
        terrain: &'a T,
        index: &'a UnitIndex,
        roster: &'a mut Roster,
        line_of_sight: &'a mut LineOfSight,
        effects: &'a EffectRegistry,
    ) -> Self {
        Self {
            terrain,
            index,
            roster,
            line_of_sight,
            effects,
        }
    }
}
