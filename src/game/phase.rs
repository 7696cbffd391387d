//! Turn phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the match is in its state machine
///
/// SETUP, then repeating DRAW -> MAIN -> ATTACK-OR-END -> CHECKUP, then GAME_OVER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TurnPhase {
    #[default]
    Setup,
    Draw,
    Main,
    /// An attack is resolving or the turn is closing
    AttackOrEnd,
    Checkup,
    GameOver,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::Setup => "SETUP",
            TurnPhase::Draw => "DRAW",
            TurnPhase::Main => "MAIN",
            TurnPhase::AttackOrEnd => "ATTACK-OR-END",
            TurnPhase::Checkup => "CHECKUP",
            TurnPhase::GameOver => "GAME_OVER",
        };
        write!(f, "{name}")
    }
}
