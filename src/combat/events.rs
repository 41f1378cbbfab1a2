//! Shot notifications and their subscriber list

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::types::{CombatantId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotReport {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub origin: Vec2,
    pub aim_point: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitReport {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub damage: i32,
    pub critical: bool,
    /// Hit chance the roll was made against
    pub accuracy: f32,
    pub distance_cells: f32,
    pub origin: Vec2,
    pub contact_point: Vec2,
    /// Target died from this hit
    pub lethal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum MissReason {
    /// Lost the hit roll
    Rolled,
    FriendlyFire,
    NoLineOfSight,
    /// Attacker or target missing or dead
    InvalidCombatant,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissReport {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub origin: Vec2,
    pub reason: MissReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    ShotFired(ShotReport),
    Hit(HitReport),
    Miss(MissReport),
}

/// Result of one `resolve_shot`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShotOutcome {
    Hit(HitReport),
    Miss(MissReport),
}

impl ShotOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, ShotOutcome::Hit(_))
    }

    pub fn hit(&self) -> Option<&HitReport> {
        match self {
            ShotOutcome::Hit(report) => Some(report),
            ShotOutcome::Miss(_) => None,
        }
    }

    pub fn miss_reason(&self) -> Option<MissReason> {
        match self {
            ShotOutcome::Hit(_) => None,
            ShotOutcome::Miss(report) => Some(report.reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&CombatEvent)>;

/// Subscribers to shot notifications, called in subscription order
#[derive(Default)]
pub struct CombatEventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl std::fmt::Debug for CombatEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatEventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl CombatEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&CombatEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn publish(&mut self, event: &CombatEvent) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(event);
        }
    }
}
