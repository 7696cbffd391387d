//! Rules configuration

use crate::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable match rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub deck_size: usize,
    pub max_copies: usize,
    pub opening_hand: usize,
    pub max_hand_size: usize,
    pub prize_threshold: u32,
    /// The match is a draw once this many turns have been played
    pub turn_limit: u32,
    pub weakness_bonus: i32,
    pub poison_damage: i32,
    pub poison_plus_damage: i32,
    pub burn_damage: i32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            deck_size: 20,
            max_copies: 2,
            opening_hand: 5,
            max_hand_size: 10,
            prize_threshold: 3,
            turn_limit: 60,
            weakness_bonus: 20,
            poison_damage: 10,
            poison_plus_damage: 20,
            burn_damage: 20,
        }
    }
}

impl RulesConfig {
    pub fn with_turn_limit(mut self, turn_limit: u32) -> Self {
        self.turn_limit = turn_limit;
        self
    }

    pub fn with_prize_threshold(mut self, threshold: u32) -> Self {
        self.prize_threshold = threshold;
        self
    }

    /// Load rules from a JSON file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let rules: RulesConfig = serde_json::from_str(&content)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<()> {
        if self.opening_hand == 0 || self.opening_hand > self.deck_size {
            return Err(GameError::DeckError(format!(
                "opening hand of {} does not fit a {}-card deck",
                self.opening_hand, self.deck_size
            )));
        }
        if self.prize_threshold == 0 || self.turn_limit == 0 {
            return Err(GameError::InvalidState(
                "prize threshold and turn limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
