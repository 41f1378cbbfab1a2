//! Scaled simulation time
//!
//! The caller supplies real elapsed seconds; everything downstream only ever
//! sees the scaled value.

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    time_scale: f32,
    elapsed: f64,
    tick: Tick,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            elapsed: 0.0,
            tick: 0,
        }
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the speed multiplier. Negative values clamp to zero.
    pub fn set_speed(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn pause(&mut self) {
        self.set_speed(0.0);
    }

    pub fn slow(&mut self) {
        self.set_speed(0.5);
    }

    pub fn normal(&mut self) {
        self.set_speed(1.0);
    }

    pub fn fast(&mut self) {
        self.set_speed(2.0);
    }

    pub fn is_paused(&self) -> bool {
        self.time_scale <= f32::EPSILON
    }

    /// Scaled seconds since the clock started
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Advance by `real_dt` seconds and return the scaled step
    pub fn advance(&mut self, real_dt: f32) -> f32 {
        let dt = real_dt.max(0.0) * self.time_scale;
        self.elapsed += f64::from(dt);
        self.tick += 1;
        dt
    }
}
