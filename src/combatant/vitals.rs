//! Hit points, stun and the Alive / KnockedOut / Dead state machine

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum VitalState {
    #[default]
    Alive,
    KnockedOut,
    Dead,
}

/// One-shot transition notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum LifeEvent {
    Died,
    KnockedOut,
    Revived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vitals {
    max_hp: i32,
    hp: i32,
    stun: f32,
    state: VitalState,
}

impl Vitals {
    pub fn new(max_hp: i32) -> Self {
        let max_hp = max_hp.max(0);
        let mut vitals = Self {
            max_hp,
            hp: max_hp,
            stun: 0.0,
            state: VitalState::Alive,
        };
        vitals.recalc();
        vitals
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn stun(&self) -> f32 {
        self.stun
    }

    pub fn state(&self) -> VitalState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == VitalState::Dead
    }

    pub fn is_knocked_out(&self) -> bool {
        self.state == VitalState::KnockedOut
    }

    /// Alive and not knocked out
    pub fn can_act(&self) -> bool {
        self.state == VitalState::Alive
    }

    /// Subtract HP. Negative amounts are ignored.
    pub fn apply_damage(&mut self, amount: i32) -> Option<LifeEvent> {
        if self.is_dead() {
            return None;
        }
        self.hp = (self.hp - amount.max(0)).max(0);
        self.recalc()
    }

    /// Add (or with a negative amount, remove) stun
    pub fn add_stun(&mut self, amount: f32) -> Option<LifeEvent> {
        if self.is_dead() {
            return None;
        }
        self.stun = (self.stun + amount).max(0.0);
        self.recalc()
    }

    pub fn recover_stun(&mut self, amount: f32) -> Option<LifeEvent> {
        self.add_stun(-amount.max(0.0))
    }

    /// Restore HP up to the maximum. The dead stay dead.
    pub fn heal(&mut self, amount: i32) -> Option<LifeEvent> {
        if self.is_dead() {
            return None;
        }
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.recalc()
    }

    fn recalc(&mut self) -> Option<LifeEvent> {
        let next = if self.hp <= 0 {
            VitalState::Dead
        } else if self.stun >= self.hp as f32 {
            VitalState::KnockedOut
        } else {
            VitalState::Alive
        };

        if next == self.state {
            return None;
        }

        let previous = std::mem::replace(&mut self.state, next);
        match next {
            VitalState::Dead => Some(LifeEvent::Died),
            VitalState::KnockedOut => Some(LifeEvent::KnockedOut),
            VitalState::Alive if previous == VitalState::KnockedOut => Some(LifeEvent::Revived),
            VitalState::Alive => None,
        }
    }
}
