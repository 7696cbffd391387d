//! Deck list loader (.deck format)
//!
//! ```text
//! # Lightning
//! Energy: Lightning
//! 2 Pikachu ex
//! 2 Poké Ball
//! ```

use crate::core::{Card, EnergyType};
use crate::game::{RulesConfig, Seat};
use crate::loader::CardCatalog;
use crate::{GameError, Result};
use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;

/// Deck loader for .deck files
pub struct DeckLoader;

impl DeckLoader {
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path)?;
        let mut deck = Self::parse(&content)?;
        if deck.name.is_empty() {
            deck.name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .unwrap_or_default();
        }
        Ok(deck)
    }

    /// Parse a deck from its text content
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut deck = DeckList::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                match key.trim().to_lowercase().as_str() {
                    "energy" => {
                        for word in value.split(',').map(str::trim).filter(|w| !w.is_empty()) {
                            let energy = word.parse::<EnergyType>().map_err(GameError::DeckError)?;
                            if !deck.energy.contains(&energy) {
                                deck.energy.push(energy);
                            }
                        }
                        continue;
                    }
                    "name" => {
                        deck.name = value.trim().to_string();
                        continue;
                    }
                    _ => {}
                }
            }

            // "2 Pikachu ex"
            let entry = line
                .split_once(' ')
                .and_then(|(count, name)| Some((count.parse::<u8>().ok()?, name.trim())))
                .filter(|(_, name)| !name.is_empty())
                .ok_or_else(|| GameError::DeckError(format!("expected `<count> <card name>`, got {line:?}")))?;
            deck.entries.push(DeckEntry {
                card_name: entry.1.to_string(),
                count: entry.0,
            });
        }

        if deck.entries.is_empty() {
            return Err(GameError::DeckError("Empty deck".to_string()));
        }
        Ok(deck)
    }
}

/// A deck entry (card name and count)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: u8,
}

/// A deck as written, before it is checked against a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckList {
    pub name: String,
    pub energy: Vec<EnergyType>,
    pub entries: Vec<DeckEntry>,
}

impl DeckList {
    pub fn total_cards(&self) -> usize {
        self.entries.iter().map(|e| e.count as usize).sum()
    }

    /// Resolve every entry against the catalog and check the deck rules
    pub fn resolve(&self, catalog: &CardCatalog, rules: &RulesConfig) -> Result<DeckSpec> {
        let mut copies: FxHashMap<String, usize> = FxHashMap::default();
        let mut cards = Vec::with_capacity(self.total_cards());
        for entry in &self.entries {
            let card = catalog
                .get(&entry.card_name)
                .ok_or_else(|| GameError::CardNotFound(entry.card_name.clone()))?;
            *copies.entry(card.name().key()).or_default() += entry.count as usize;
            cards.extend(std::iter::repeat(card.clone()).take(entry.count as usize));
        }

        let spec = DeckSpec {
            name: self.name.clone(),
            energy_types: self.energy.clone(),
            cards,
        };
        if let Some((name, count)) = copies.iter().find(|(_, count)| **count > rules.max_copies) {
            return Err(GameError::DeckError(format!(
                "{}: {count} copies of {name} (at most {})",
                spec.name, rules.max_copies
            )));
        }
        spec.validate(rules)?;
        Ok(spec)
    }
}

/// A deck resolved against the catalog, ready to be seated
#[derive(Debug, Clone)]
pub struct DeckSpec {
    pub name: String,
    pub energy_types: Vec<EnergyType>,
    pub cards: Vec<Card>,
}

impl DeckSpec {
    /// Deck size, a Basic to open with, and one to three energy types
    pub fn validate(&self, rules: &RulesConfig) -> Result<()> {
        if self.cards.len() != rules.deck_size {
            return Err(GameError::DeckError(format!(
                "{}: {} cards (expected {})",
                self.name,
                self.cards.len(),
                rules.deck_size
            )));
        }
        if !self.cards.iter().any(Card::is_basic_pokemon) {
            return Err(GameError::DeckError(format!("{}: no Basic Pokémon", self.name)));
        }
        if !(1..=3).contains(&self.energy_types.len()) {
            return Err(GameError::DeckError(format!(
                "{}: {} energy types declared (expected 1 to 3)",
                self.name,
                self.energy_types.len()
            )));
        }
        Ok(())
    }

    pub fn into_seat(self, player_name: impl Into<String>) -> Seat {
        Seat::new(player_name.into(), self.energy_types, self.cards)
    }
}
