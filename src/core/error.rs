use thiserror::Error;

use crate::core::types::CombatantId;
use crate::grid::Cell;

#[derive(Error, Debug)]
pub enum TacticsError {
    #[error("Combatant not found: {0}")]
    CombatantNotFound(CombatantId),

    #[error("Combatant already registered: {0}")]
    AlreadyRegistered(CombatantId),

    #[error("Cell out of bounds: {0}")]
    OutOfBounds(Cell),

    #[error("Cell is not passable: {0}")]
    Impassable(Cell),

    #[error("Stale cell for {id}: index has {indexed}, caller passed {claimed}")]
    StaleCell {
        id: CombatantId,
        indexed: Cell,
        claimed: Cell,
    },

    #[error("Unknown status effect id: {0}")]
    UnknownEffect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TacticsError>;
