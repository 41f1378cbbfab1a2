//! TOML-authored skirmish setups

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::skirmish::Skirmish;
use crate::combat::{DamageRoll, EffectSpec, WeaponStats};
use crate::combatant::UnitProfile;
use crate::core::config::KernelConfig;
use crate::core::error::{Result, TacticsError};
use crate::core::types::FactionId;
use crate::grid::{Cell, TileMap};
use crate::status::BLEED_ID;

/// One unit to spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    pub faction: u32,
    pub x: i32,
    pub y: i32,
    /// Key into `Scenario::profiles`; the default profile when absent
    #[serde(default)]
    pub profile: Option<String>,
    /// Walk here once the skirmish starts
    #[serde(default)]
    pub destination: Option<Cell>,
}

impl UnitPlacement {
    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// A map, a configuration, unit profiles and their placements
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    /// Text rows, see `TileMap::from_ascii`
    pub map: Vec<String>,
    pub config: KernelConfig,
    pub profiles: BTreeMap<String, UnitProfile>,
    pub units: Vec<UnitPlacement>,
}

impl Scenario {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(text)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn tile_map(&self) -> TileMap {
        let rows: Vec<&str> = self.map.iter().map(String::as_str).collect();
        TileMap::from_ascii(&rows)
    }

    fn profile_for(&self, placement: &UnitPlacement) -> Result<UnitProfile> {
        match &placement.profile {
            None => Ok(UnitProfile::default()),
            Some(key) => self.profiles.get(key).cloned().ok_or_else(|| {
                TacticsError::InvalidConfig(format!(
                    "unit at {} uses unknown profile '{}'",
                    placement.cell(),
                    key
                ))
            }),
        }
    }

    /// Spawn every placement and issue initial move orders
    pub fn build(&self) -> Result<Skirmish> {
        if self.map.is_empty() {
            return Err(TacticsError::InvalidConfig(format!(
                "scenario '{}' has an empty map",
                self.name
            )));
        }

        let mut skirmish = Skirmish::new(self.tile_map(), self.config.clone())?;
        for placement in &self.units {
            let profile = self.profile_for(placement)?;
            let id = skirmish.spawn(FactionId(placement.faction), placement.cell(), profile)?;

            if let Some(goal) = placement.destination {
                if !skirmish.set_destination(id, goal) {
                    tracing::warn!(
                        "no path from {} to {} in scenario '{}'",
                        placement.cell(),
                        goal,
                        self.name
                    );
                }
            }
        }

        tracing::info!(
            "built scenario '{}' with {} units",
            self.name,
            skirmish.roster().len()
        );
        Ok(skirmish)
    }

    /// Two fireteams across a broken wall line
    pub fn demo() -> Self {
        let map = [
            "....................",
            "......#.....#.......",
            "......#.....#.......",
            "....................",
            ".........~~.........",
            "......#.....#.......",
            "......#.....#.......",
            "....................",
        ];

        let mut profiles = BTreeMap::new();
        profiles.insert("rifleman".to_string(), UnitProfile::default());
        profiles.insert(
            "gunner".to_string(),
            UnitProfile {
                name: "Gunner".into(),
                max_hp: 120,
                move_speed: 1.5,
                weapon: WeaponStats {
                    fire_rate: 8.0,
                    range_cells: 10.0,
                    accuracy: 0.5,
                    damage: DamageRoll::Range { min: 3, max: 7 },
                    ..Default::default()
                },
            },
        );
        profiles.insert(
            "skirmisher".to_string(),
            UnitProfile {
                name: "Skirmisher".into(),
                max_hp: 80,
                move_speed: 3.0,
                weapon: WeaponStats {
                    fire_rate: 2.0,
                    range_cells: 8.0,
                    damage: DamageRoll::Spread {
                        base: 8,
                        spread: 0.25,
                    },
                    ..Default::default()
                }
                .with_effect(EffectSpec::new(BLEED_ID, 2.0, 4.0, 0.5)),
            },
        );

        let place = |faction, x, y, profile: &str, destination: Option<Cell>| UnitPlacement {
            faction,
            x,
            y,
            profile: Some(profile.to_string()),
            destination,
        };

        Self {
            name: "Broken Line".into(),
            map: map.iter().map(|r| r.to_string()).collect(),
            config: KernelConfig::default(),
            profiles,
            units: vec![
                place(1, 1, 2, "rifleman", None),
                place(1, 1, 5, "gunner", None),
                place(1, 0, 3, "skirmisher", Some(Cell::new(8, 3))),
                place(2, 18, 2, "rifleman", None),
                place(2, 18, 5, "gunner", None),
                place(2, 19, 4, "skirmisher", Some(Cell::new(11, 4))),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::skirmish::SkirmishOutcome;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SAMPLE: &str = r#"
name = "Corridor"
map = [
    "........",
    "...#....",
    "........",
]

[config.combat]
allow_friendly_fire = true

[profiles.sniper]
name = "Sniper"
max_hp = 60
weapon = { fire_rate = 0.5, range_cells = 20.0, accuracy = 0.95, damage = { Range = { min = 30, max = 40 } } }

[[units]]
faction = 1
x = 0
y = 0
profile = "sniper"

[[units]]
faction = 2
x = 7
y = 2
destination = { x = 5, y = 2 }
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml_str(SAMPLE).unwrap();
        assert_eq!(scenario.name, "Corridor");
        assert_eq!(scenario.map.len(), 3);
        assert!(scenario.config.combat.allow_friendly_fire);
        assert!(scenario.config.combat.require_line_of_sight);

        let sniper = &scenario.profiles["sniper"];
        assert_eq!(sniper.max_hp, 60);
        assert_eq!(sniper.weapon.damage, DamageRoll::Range { min: 30, max: 40 });
        // Unspecified weapon fields keep their defaults
        assert_eq!(sniper.weapon.crit_chance, 0.1);

        assert_eq!(scenario.units[1].destination, Some(Cell::new(5, 2)));
        assert_eq!(scenario.units[1].profile, None);
    }

    #[test]
    fn test_build_spawns_units() {
        let scenario = Scenario::from_toml_str(SAMPLE).unwrap();
        let skirmish = scenario.build().unwrap();
        assert_eq!(skirmish.roster().len(), 2);
        assert_eq!(skirmish.index().members_of(FactionId(1)).len(), 1);
        assert_eq!(skirmish.outcome(), SkirmishOutcome::InProgress);

        let names: Vec<_> = skirmish.roster().iter().map(|u| u.profile.name.clone()).collect();
        assert_eq!(names, vec!["Sniper".to_string(), "Rifleman".to_string()]);
    }

    #[test]
    fn test_unknown_profile_is_rejected() {
        let mut scenario = Scenario::from_toml_str(SAMPLE).unwrap();
        scenario.units[0].profile = Some("grenadier".into());
        match scenario.build() {
            Err(TacticsError::InvalidConfig(msg)) => assert!(msg.contains("grenadier")),
            other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_spawn_on_wall_is_rejected() {
        let mut scenario = Scenario::from_toml_str(SAMPLE).unwrap();
        scenario.units[0].x = 3;
        scenario.units[0].y = 1;
        assert!(scenario.build().is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let text = SAMPLE.replace("allow_friendly_fire = true", "max_range = -1.0");
        let text = text.replace("[config.combat]", "[config.line_of_sight]");
        assert!(matches!(
            Scenario::from_toml_str(&text),
            Err(TacticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_demo_runs_to_completion() {
        let mut skirmish = Scenario::demo().build().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..5000 {
            skirmish.step(0.1, &mut rng);
            if skirmish.is_finished() {
                break;
            }
            assert!(skirmish.index().is_consistent());
        }
        let summary = skirmish.summary();
        assert!(summary.shots_fired > 0);
        assert!(summary.hits <= summary.shots_fired);
    }
}
