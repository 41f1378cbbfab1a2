//! Cached line-of-sight evaluation
//!
//! A cheap broad phase (range, field of view) runs on every query. The
//! supercover narrow phase is memoised per (from, to) pair and the whole
//! memo is dropped whenever the terrain version moves or it reaches its
//! capacity.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::grid::{Cell, GridTerrain};
use crate::visibility::supercover::supercover;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LosConfig {
    /// Maximum sight distance in cells; `None` is unlimited
    pub max_range: Option<f32>,
    /// Minimum cosine between facing and sightline; `None` disables the cone
    pub fov_cos: Option<f32>,
    /// Whether a blocking destination cell hides itself
    pub include_destination: bool,
    /// Cached pairs kept before the cache is flushed; `None` is unbounded
    pub cache_capacity: Option<usize>,
}

impl Default for LosConfig {
    fn default() -> Self {
        Self {
            max_range: None,
            fov_cos: None,
            include_destination: true,
            cache_capacity: Some(65_536),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    from: Cell,
    to: Cell,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LosStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    /// Flushes caused by a full cache
    pub evictions: u64,
}

#[derive(Debug, Default)]
pub struct LineOfSight {
    config: LosConfig,
    cache: AHashMap<CacheKey, bool>,
    /// Terrain version the cache was filled against
    cached_version: Option<u64>,
    stats: LosStats,
}

impl LineOfSight {
    pub fn new(config: LosConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &LosConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LosConfig) {
        self.config = config;
        self.invalidate();
    }

    pub fn set_max_range(&mut self, max_range: Option<f32>) {
        self.config.max_range = max_range;
        self.invalidate();
    }

    pub fn set_fov_cos(&mut self, fov_cos: Option<f32>) {
        self.config.fov_cos = fov_cos;
        self.invalidate();
    }

    pub fn set_include_destination(&mut self, include: bool) {
        self.config.include_destination = include;
        self.invalidate();
    }

    pub fn stats(&self) -> LosStats {
        self.stats
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached result
    pub fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            tracing::debug!("line of sight cache cleared ({} entries)", self.cache.len());
        }
        self.cache.clear();
        self.cached_version = None;
        self.stats.invalidations += 1;
    }

    /// Can a viewer at `from` see `to`?
    ///
    /// `facing` only matters when a field-of-view cone is configured.
    pub fn can_see<T: GridTerrain>(
        &mut self,
        terrain: &T,
        from: Cell,
        to: Cell,
        facing: Option<Vec2>,
    ) -> bool {
        if !self.broad_phase(from, to, facing) {
            return false;
        }

        let version = terrain.version();
        if self.cached_version != Some(version) {
            if self.cached_version.is_some() {
                self.invalidate();
            }
            self.cached_version = Some(version);
        }

        let key = CacheKey { from, to };
        if let Some(&visible) = self.cache.get(&key) {
            self.stats.hits += 1;
            return visible;
        }

        self.stats.misses += 1;
        let visible = self.narrow_phase(terrain, from, to);
        if self
            .config
            .cache_capacity
            .is_some_and(|cap| self.cache.len() >= cap)
        {
            tracing::debug!("line of sight cache full ({} entries), flushing", self.cache.len());
            self.cache.clear();
            self.stats.evictions += 1;
        }
        self.cache.insert(key, visible);
        visible
    }

    /// `can_see` between world-space points
    pub fn can_see_world<T: GridTerrain>(
        &mut self,
        terrain: &T,
        from: Vec2,
        to: Vec2,
        facing: Option<Vec2>,
    ) -> bool {
        let from = terrain.world_to_cell(from);
        let to = terrain.world_to_cell(to);
        self.can_see(terrain, from, to, facing)
    }

    fn broad_phase(&self, from: Cell, to: Cell, facing: Option<Vec2>) -> bool {
        if let Some(range) = self.config.max_range {
            let range_sq = f64::from(range) * f64::from(range);
            if from.distance_squared(&to) as f64 > range_sq {
                return false;
            }
        }

        if let (Some(fov_cos), Some(facing)) = (self.config.fov_cos, facing) {
            let dir = Vec2::new((to.x - from.x) as f32, (to.y - from.y) as f32);
            if dir.length_squared() > 0.0 {
                let cos = facing.normalize().dot(&dir.normalize());
                if cos < fov_cos {
                    return false;
                }
            }
        }

        true
    }

    fn narrow_phase<T: GridTerrain>(&self, terrain: &T, from: Cell, to: Cell) -> bool {
        for cell in supercover(from, to) {
            if cell == from {
                continue;
            }
            if cell == to && !self.config.include_destination {
                continue;
            }
            if terrain.is_blocking(cell) {
                return false;
            }
        }
        true
    }
}
