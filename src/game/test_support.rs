//! Shared fixtures for unit tests

use crate::core::{Attack, Card, CardName, CardRef, EnergyType, PokemonCard, Stage};
use crate::game::{Game, RulesConfig, Seat, VerbosityLevel};
use std::sync::Arc;

/// A vanilla Basic Pokémon with no attacks, retreat cost 1 and prize value 1
pub fn basic(name: &str, hp: i32) -> PokemonCard {
    PokemonCard {
        id: format!("TEST-{}", name.to_lowercase().replace(' ', "-")),
        name: CardName::new(name),
        energy_type: EnergyType::Colorless,
        hp,
        stage: Stage::Basic,
        evolves_from: None,
        retreat_cost: 1,
        weakness: None,
        prize_value: 1,
        is_ex: false,
        attacks: Vec::new(),
        ability: None,
    }
}

pub fn with_attack(mut card: PokemonCard, name: &str, cost: &[EnergyType], damage: i32) -> PokemonCard {
    card.attacks.push(Attack::basic(name, cost, damage));
    card
}

/// A fresh physical copy of `card` with a game-unique id
pub fn card_ref(game: &mut Game, card: PokemonCard) -> CardRef {
    CardRef::new(game.next_card_id(), Card::Pokemon(Arc::new(card)))
}

pub fn seat(name: &str, deck: Vec<PokemonCard>) -> Seat {
    let deck = deck.into_iter().map(|card| Card::Pokemon(Arc::new(card))).collect();
    Seat::new(name, vec![EnergyType::Lightning], deck)
}

/// Two players, empty decks, silent log
pub fn two_player_game() -> Game {
    let mut game = Game::new([seat("Alice", Vec::new()), seat("Bob", Vec::new())], RulesConfig::default(), 42);
    game.logger.set_verbosity(VerbosityLevel::Silent);
    game
}
