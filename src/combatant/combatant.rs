//! Combatants and the roster that owns them

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::weapon::WeaponStats;
use crate::combatant::vitals::{LifeEvent, Vitals};
use crate::core::error::{Result, TacticsError};
use crate::core::types::{CombatantId, FactionId};
use crate::grid::Cell;
use crate::status::{StatusEffect, StatusEffects};

/// Authored base stats for a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitProfile {
    pub name: String,
    pub max_hp: i32,
    /// Cells per second
    pub move_speed: f32,
    pub weapon: WeaponStats,
}

impl Default for UnitProfile {
    fn default() -> Self {
        Self {
            name: "Rifleman".into(),
            max_hp: 100,
            move_speed: 2.0,
            weapon: WeaponStats::default(),
        }
    }
}

#[derive(Debug)]
pub struct Combatant {
    pub id: CombatantId,
    pub faction: FactionId,
    pub cell: Cell,
    pub profile: UnitProfile,
    vitals: Vitals,
    effects: StatusEffects,
    /// Transitions not yet collected by the driver
    life_events: Vec<LifeEvent>,
}

impl Combatant {
    pub fn new(faction: FactionId, cell: Cell, profile: UnitProfile, tick_interval: f32) -> Self {
        Self {
            id: CombatantId::new(),
            faction,
            cell,
            vitals: Vitals::new(profile.max_hp),
            profile,
            effects: StatusEffects::new(tick_interval),
            life_events: Vec::new(),
        }
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn effects(&self) -> &StatusEffects {
        &self.effects
    }

    pub fn weapon(&self) -> &WeaponStats {
        &self.profile.weapon
    }

    /// Not dead. Knocked out combatants are still alive.
    pub fn is_alive(&self) -> bool {
        !self.vitals.is_dead()
    }

    pub fn can_act(&self) -> bool {
        self.vitals.can_act()
    }

    pub fn apply_damage(&mut self, amount: i32) {
        let event = self.vitals.apply_damage(amount);
        self.record(event);
    }

    pub fn add_stun(&mut self, amount: f32) {
        let event = self.vitals.add_stun(amount);
        self.record(event);
    }

    pub fn recover_stun(&mut self, amount: f32) {
        let event = self.vitals.recover_stun(amount);
        self.record(event);
    }

    pub fn heal(&mut self, amount: i32) {
        let event = self.vitals.heal(amount);
        self.record(event);
    }

    pub fn add_or_stack_effect(&mut self, effect: Box<dyn StatusEffect>) {
        self.effects
            .add_or_stack(effect, &mut self.vitals, &mut self.life_events);
    }

    pub fn remove_effect(&mut self, id: &str) -> bool {
        self.effects
            .remove(id, &mut self.vitals, &mut self.life_events)
    }

    /// Feed elapsed time to the status ticker
    pub fn tick_status(&mut self, dt: f32) -> bool {
        self.effects
            .tick(dt, &mut self.vitals, &mut self.life_events)
    }

    /// Take every life transition recorded since the last drain
    pub fn drain_life_events(&mut self) -> Vec<LifeEvent> {
        std::mem::take(&mut self.life_events)
    }

    fn record(&mut self, event: Option<LifeEvent>) {
        if let Some(event) = event {
            tracing::debug!("combatant {} {}", self.id, event);
            self.life_events.push(event);
        }
    }
}

/// Owner of every combatant in a battle
///
/// Iteration follows insertion order so seeded runs are reproducible.
#[derive(Debug, Default)]
pub struct Roster {
    combatants: AHashMap<CombatantId, Combatant>,
    order: Vec<CombatantId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, combatant: Combatant) -> Result<CombatantId> {
        let id = combatant.id;
        if self.combatants.contains_key(&id) {
            return Err(TacticsError::AlreadyRegistered(id));
        }
        self.combatants.insert(id, combatant);
        self.order.push(id);
        Ok(id)
    }

    pub fn remove(&mut self, id: CombatantId) -> Option<Combatant> {
        let removed = self.combatants.remove(&id)?;
        self.order.retain(|&other| other != id);
        Some(removed)
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.combatants.contains_key(&id)
    }

    /// Ids in insertion order
    pub fn ids(&self) -> &[CombatantId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.order.iter().filter_map(|id| self.combatants.get(id))
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Is this combatant present and not dead?
    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.get(id).is_some_and(|c| c.is_alive())
    }
}
