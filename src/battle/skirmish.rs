//! Skirmish driver
//!
//! Each step: movement -> targeting -> fire -> resolution (per unit) ->
//! status effects -> removal of the dead

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::clock::GameClock;
use crate::battle::context::TacticalContext;
use crate::combat::{CombatEvent, CombatResolver, FireControl, ShotOutcome, SubscriptionId};
use crate::combatant::{Combatant, LifeEvent, Roster, UnitProfile, VitalState};
use crate::core::config::KernelConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::types::{CombatantId, FactionId, Tick};
use crate::grid::{Cell, GridTerrain, TileMap};
use crate::pathfinding::{PathAgent, Pathfinder, StepOutcome};
use crate::spatial::UnitIndex;
use crate::status::EffectRegistry;
use crate::targeting::{TargetChanged, TargetingController};
use crate::visibility::{LineOfSight, LosStats};

/// Skirmish result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkirmishOutcome {
    #[default]
    InProgress,
    Victory(FactionId),
    Draw,
}

/// Per-unit controllers
#[derive(Debug, Clone)]
struct UnitControl {
    targeting: TargetingController,
    fire: FireControl,
    agent: PathAgent,
}

/// Everything that happened during one step
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub tick: Tick,
    /// Scaled seconds simulated this step
    pub dt: f32,
    pub moves: Vec<(CombatantId, Cell)>,
    pub target_changes: Vec<TargetChanged>,
    pub shots: Vec<ShotOutcome>,
    pub life_events: Vec<(CombatantId, LifeEvent)>,
    /// Combatants removed from the index because they died
    pub removed: Vec<CombatantId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    pub id: CombatantId,
    pub name: String,
    pub faction: FactionId,
    pub cell: Cell,
    pub hp: i32,
    pub state: VitalState,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkirmishSummary {
    pub ticks: Tick,
    pub elapsed_secs: f64,
    pub outcome: SkirmishOutcome,
    pub shots_fired: u64,
    pub hits: u64,
    pub units: Vec<UnitSummary>,
    pub line_of_sight: LosStats,
}

#[derive(Debug)]
pub struct Skirmish {
    map: TileMap,
    config: KernelConfig,
    roster: Roster,
    index: UnitIndex,
    line_of_sight: LineOfSight,
    pathfinder: Pathfinder,
    resolver: CombatResolver,
    effects: EffectRegistry,
    controls: AHashMap<CombatantId, UnitControl>,
    clock: GameClock,
    shots_fired: u64,
    hits: u64,
}

impl Skirmish {
    pub fn new(map: TileMap, config: KernelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            line_of_sight: LineOfSight::new(config.line_of_sight.clone()),
            pathfinder: Pathfinder::new(config.pathfinding.clone()),
            resolver: CombatResolver::new(config.combat.clone()),
            effects: EffectRegistry::with_defaults(&config.status),
            map,
            config,
            roster: Roster::new(),
            index: UnitIndex::new(),
            controls: AHashMap::new(),
            clock: GameClock::new(),
            shots_fired: 0,
            hits: 0,
        })
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Mutable terrain access. Cached sight results expire on the next query.
    pub fn map_mut(&mut self) -> &mut TileMap {
        &mut self.map
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn index(&self) -> &UnitIndex {
        &self.index
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }

    pub fn effects_mut(&mut self) -> &mut EffectRegistry {
        &mut self.effects
    }

    pub fn line_of_sight_stats(&self) -> LosStats {
        self.line_of_sight.stats()
    }

    pub fn subscribe_combat(
        &mut self,
        subscriber: impl FnMut(&CombatEvent) + 'static,
    ) -> SubscriptionId {
        self.resolver.subscribe(subscriber)
    }

    pub fn unsubscribe_combat(&mut self, id: SubscriptionId) -> bool {
        self.resolver.unsubscribe(id)
    }

    /// Place a new combatant on the map
    pub fn spawn(&mut self, faction: FactionId, cell: Cell, profile: UnitProfile) -> Result<CombatantId> {
        if !self.map.in_bounds(cell) {
            return Err(TacticsError::OutOfBounds(cell));
        }
        if !self.map.is_passable(cell) {
            return Err(TacticsError::Impassable(cell));
        }

        let unit = Combatant::new(faction, cell, profile, self.config.status.tick_interval);
        let id = unit.id;
        self.index.register(&self.map, id, faction, cell)?;
        if let Err(e) = self.roster.insert(unit) {
            self.index.unregister(id)?;
            return Err(e);
        }

        self.controls.insert(
            id,
            UnitControl {
                targeting: TargetingController::new(id, self.config.targeting.clone()),
                fire: FireControl::new(),
                agent: PathAgent::new(&self.config.movement),
            },
        );
        tracing::debug!("spawned {} for {} at {}", id, faction, cell);
        Ok(id)
    }

    /// Order a combatant to walk to `goal`. Returns false if no path exists.
    pub fn set_destination(&mut self, id: CombatantId, goal: Cell) -> bool {
        let Some(from) = self.index.cell_of(id) else {
            return false;
        };
        let Some(control) = self.controls.get_mut(&id) else {
            return false;
        };
        control
            .agent
            .set_destination(&self.pathfinder, &self.map, from, goal)
    }

    pub fn set_priority_target(&mut self, id: CombatantId, target: Option<CombatantId>) {
        if let Some(control) = self.controls.get_mut(&id) {
            control.targeting.set_priority_target(target);
        }
    }

    pub fn set_fire_override(&mut self, id: CombatantId, target: Option<CombatantId>) {
        if let Some(control) = self.controls.get_mut(&id) {
            control.fire.set_override_target(target);
        }
    }

    pub fn current_target(&self, id: CombatantId) -> Option<CombatantId> {
        self.controls.get(&id).and_then(|c| c.targeting.current())
    }

    /// Advance the skirmish by `real_dt` seconds of caller time
    pub fn step<R: Rng + ?Sized>(&mut self, real_dt: f32, rng: &mut R) -> TickReport {
        let dt = self.clock.advance(real_dt);
        let mut report = TickReport {
            tick: self.clock.tick(),
            dt,
            ..Default::default()
        };
        if dt <= 0.0 {
            return report;
        }

        let ids: Vec<CombatantId> = self.roster.ids().to_vec();

        // Movement
        for &id in &ids {
            let (Some(control), Some(unit)) = (self.controls.get_mut(&id), self.roster.get_mut(id))
            else {
                continue;
            };
            let outcome = control
                .agent
                .update(dt, &self.pathfinder, &self.map, &mut self.index, unit);
            if let StepOutcome::Moved(cell) = outcome {
                report.moves.push((id, cell));
            }
        }

        // Targeting, fire decision and resolution, unit by unit
        for &id in &ids {
            if !self.roster.is_alive(id) {
                continue;
            }
            let Some(control) = self.controls.get_mut(&id) else {
                continue;
            };

            let mut ctx = TacticalContext::new(
                &self.map,
                &self.index,
                &mut self.roster,
                &mut self.line_of_sight,
                &self.effects,
            );

            report
                .target_changes
                .extend(control.targeting.update(dt, &mut ctx));

            let tracked = control.targeting.current();
            if let Some(shot) = control
                .fire
                .update(dt, id, tracked, &mut self.resolver, &mut ctx, rng)
            {
                self.shots_fired += 1;
                if shot.is_hit() {
                    self.hits += 1;
                }
                report.shots.push(shot);
            }
        }

        // Status effects
        for &id in &ids {
            if let Some(unit) = self.roster.get_mut(id) {
                unit.tick_status(dt);
            }
        }

        // Collect transitions and retire the dead
        for &id in &ids {
            let Some(unit) = self.roster.get_mut(id) else {
                continue;
            };
            for event in unit.drain_life_events() {
                report.life_events.push((id, event));
            }

            if !unit.is_alive() && self.index.contains(id) {
                let name = unit.profile.name.clone();
                if let Err(e) = self.index.unregister(id) {
                    tracing::warn!("failed to unregister {}: {}", id, e);
                    continue;
                }
                self.controls.remove(&id);
                tracing::info!("{} ({}) died at tick {}", name, id, report.tick);
                report.removed.push(id);
            }
        }

        report
    }

    /// Factions still holding living combatants decide the outcome
    pub fn outcome(&self) -> SkirmishOutcome {
        let standing: Vec<FactionId> = self.index.factions().collect();
        match standing.as_slice() {
            [] => SkirmishOutcome::Draw,
            [winner] => SkirmishOutcome::Victory(*winner),
            _ => SkirmishOutcome::InProgress,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome() != SkirmishOutcome::InProgress
    }

    pub fn summary(&self) -> SkirmishSummary {
        SkirmishSummary {
            ticks: self.clock.tick(),
            elapsed_secs: self.clock.elapsed(),
            outcome: self.outcome(),
            shots_fired: self.shots_fired,
            hits: self.hits,
            units: self
                .roster
                .iter()
                .map(|u| UnitSummary {
                    id: u.id,
                    name: u.profile.name.clone(),
                    faction: u.faction,
                    cell: u.cell,
                    hp: u.vitals().hp(),
                    state: u.vitals().state(),
                })
                .collect(),
            line_of_sight: self.line_of_sight.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{DamageRoll, EffectSpec, WeaponStats};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn marksman() -> UnitProfile {
        UnitProfile {
            name: "Marksman".into(),
            max_hp: 30,
            move_speed: 2.0,
            weapon: WeaponStats {
                accuracy: 1.0,
                damage: DamageRoll::Range { min: 10, max: 10 },
                crit_chance: 0.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_spawn_rejects_walls() {
        let map = TileMap::from_ascii(&[".#."]);
        let mut skirmish = Skirmish::new(map, KernelConfig::default()).unwrap();
        assert!(matches!(
            skirmish.spawn(FactionId(1), Cell::new(1, 0), marksman()),
            Err(TacticsError::Impassable(_))
        ));
        assert!(matches!(
            skirmish.spawn(FactionId(1), Cell::new(5, 0), marksman()),
            Err(TacticsError::OutOfBounds(_))
        ));
        assert!(skirmish.spawn(FactionId(1), Cell::new(0, 0), marksman()).is_ok());
        assert_eq!(skirmish.roster().len(), 1);
        assert_eq!(skirmish.outcome(), SkirmishOutcome::Victory(FactionId(1)));
    }

    #[test]
    fn test_duel_resolves() {
        let map = TileMap::new(8, 3);
        let mut skirmish = Skirmish::new(map, KernelConfig::default()).unwrap();
        let a = skirmish.spawn(FactionId(1), Cell::new(0, 1), marksman()).unwrap();
        let b = skirmish.spawn(FactionId(2), Cell::new(5, 1), marksman()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        assert_eq!(skirmish.outcome(), SkirmishOutcome::InProgress);
        let mut removed = Vec::new();
        for _ in 0..100 {
            let report = skirmish.step(0.1, &mut rng);
            removed.extend(report.removed);
            if skirmish.is_finished() {
                break;
            }
        }

        // The first mover shoots first with equal weapons
        assert_eq!(removed, vec![b]);
        assert_eq!(skirmish.outcome(), SkirmishOutcome::Victory(FactionId(1)));
        assert!(skirmish.roster().is_alive(a));
        assert!(!skirmish.index().contains(b));
        assert!(skirmish.index().is_consistent());
    }

    #[test]
    fn test_target_acquired_before_first_shot() {
        let map = TileMap::new(8, 3);
        let mut skirmish = Skirmish::new(map, KernelConfig::default()).unwrap();
        let a = skirmish.spawn(FactionId(1), Cell::new(0, 1), marksman()).unwrap();
        let b = skirmish.spawn(FactionId(2), Cell::new(5, 1), marksman()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        // Targeting ticks every 0.15 s
        let report = skirmish.step(0.1, &mut rng);
        assert!(report.shots.is_empty());

        let report = skirmish.step(0.1, &mut rng);
        assert_eq!(report.target_changes.len(), 2);
        assert_eq!(report.shots.len(), 2);
        assert_eq!(skirmish.current_target(a), Some(b));
    }

    #[test]
    fn test_walls_stop_the_fight() {
        let map = TileMap::from_ascii(&[
            "...#...", //
            "...#...",
            "...#...",
        ]);
        let mut skirmish = Skirmish::new(map, KernelConfig::default()).unwrap();
        skirmish.spawn(FactionId(1), Cell::new(0, 1), marksman()).unwrap();
        skirmish.spawn(FactionId(2), Cell::new(6, 1), marksman()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..50 {
            let report = skirmish.step(0.1, &mut rng);
            assert!(report.shots.is_empty());
        }
        assert_eq!(skirmish.outcome(), SkirmishOutcome::InProgress);
    }

    #[test]
    fn test_movement_reports_and_updates_index() {
        let map = TileMap::new(10, 1);
        let mut skirmish = Skirmish::new(map, KernelConfig::default()).unwrap();
        let a = skirmish.spawn(FactionId(1), Cell::new(0, 0), marksman()).unwrap();
        assert!(skirmish.set_destination(a, Cell::new(4, 0)));
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..40 {
            skirmish.step(0.1, &mut rng);
        }
        assert_eq!(skirmish.index().cell_of(a), Some(Cell::new(4, 0)));
        assert_eq!(skirmish.roster().get(a).unwrap().cell, Cell::new(4, 0));
    }

    #[test]
    fn test_paused_clock_does_nothing() {
        let map = TileMap::new(8, 3);
        let mut skirmish = Skirmish::new(map, KernelConfig::default()).unwrap();
        skirmish.spawn(FactionId(1), Cell::new(0, 1), marksman()).unwrap();
        skirmish.spawn(FactionId(2), Cell::new(5, 1), marksman()).unwrap();
        skirmish.clock_mut().pause();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let report = skirmish.step(1.0, &mut rng);
        assert_eq!(report.dt, 0.0);
        assert!(report.shots.is_empty());
    }

    #[test]
    fn test_bleeding_kills_over_time() {
        let map = TileMap::new(8, 3);
        let mut skirmish = Skirmish::new(map, KernelConfig::default()).unwrap();
        let mut shooter = marksman();
        shooter.weapon.damage = DamageRoll::Range { min: 1, max: 1 };
        shooter.weapon.fire_rate = 0.01;
        shooter.weapon = shooter.weapon.with_effect(EffectSpec::new("Bleed", 10.0, 5.0, 1.0));
        let target = UnitProfile {
            weapon: WeaponStats {
                range_cells: 1.0,
                ..Default::default()
            },
            ..marksman()
        };

        let _a = skirmish.spawn(FactionId(1), Cell::new(0, 1), shooter).unwrap();
        let b = skirmish.spawn(FactionId(2), Cell::new(5, 1), target).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut died = false;
        for _ in 0..60 {
            let report = skirmish.step(0.1, &mut rng);
            if report.life_events.contains(&(b, LifeEvent::Died)) {
                died = true;
                break;
            }
        }
        assert!(died);
        assert_eq!(skirmish.summary().shots_fired, 1);
    }
}
