//! Error types for the battle simulator

use crate::core::PlayerId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// An attempted action failed validation (no active Pokémon, card not in
    /// hand, insufficient energy, invalid target)
    #[error("{player}: invalid action {action}: {reason}")]
    InvalidAction {
        player: PlayerId,
        action: String,
        reason: String,
    },

    /// The turn already ended; the context no longer accepts actions
    #[error("Turn has already ended")]
    TurnEnded,

    /// A decision agent answered outside the offered set
    #[error("{player}: contract violation in {request}: {reason}")]
    ContractViolation {
        player: PlayerId,
        request: String,
        reason: String,
    },

    /// The match reached a state it cannot continue from
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Invalid catalog record: {0}")]
    CatalogError(String),

    #[error("Invalid deck: {0}")]
    DeckError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl GameError {
    pub fn invalid_action(player: PlayerId, action: impl Into<String>, reason: impl Into<String>) -> Self {
        GameError::InvalidAction {
            player,
            action: action.into(),
            reason: reason.into(),
        }
    }

    pub fn contract(player: PlayerId, request: impl Into<String>, reason: impl Into<String>) -> Self {
        GameError::ContractViolation {
            player,
            request: request.into(),
            reason: reason.into(),
        }
    }

    /// Errors that end the match instead of being absorbed at the turn boundary
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GameError::ContractViolation { .. } | GameError::InvalidState(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
