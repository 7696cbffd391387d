//! Shared helpers for integration tests
#![allow(dead_code)]

use pocket_sim::compiler::Compiler;
use pocket_sim::core::{Attack, Card, CardName, CardRef, EnergyType, PlayerId, PokemonCard, PokemonRef, Position, Stage};
use pocket_sim::game::{Game, RulesConfig, Seat, VerbosityLevel};
use pocket_sim::loader::{CardCatalog, DeckLoader, DeckSpec};
use std::path::PathBuf;
use std::sync::Arc;

pub fn test_data(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data").join(path)
}

pub fn catalog() -> CardCatalog {
    CardCatalog::load_dir(&test_data("catalog")).expect("test catalog loads")
}

pub fn deck(catalog: &CardCatalog, name: &str) -> DeckSpec {
    DeckLoader::load_from_file(&test_data(&format!("decks/{name}.deck")))
        .and_then(|deck| deck.resolve(catalog, &RulesConfig::default()))
        .expect("test deck resolves")
}

pub fn pokemon(name: &str, hp: i32, energy_type: EnergyType) -> PokemonCard {
    PokemonCard {
        id: format!("IT-{}", name.to_lowercase()),
        name: CardName::new(name),
        energy_type,
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

/// Compile an attack and insist that every sentence was understood
pub fn attack(compiler: &Compiler, name: &str, cost: &[EnergyType], damage: i32, text: &str) -> Attack {
    let compiled = compiler.compile_attack(name, cost, damage, text);
    assert!(compiled.ok, "{name} did not compile: {:?}", compiled.unmatched);
    compiled.value
}

/// Two players with empty decks and a silent log
pub fn empty_game() -> Game {
    let seats = [
        Seat::new("Alice", vec![EnergyType::Fire], Vec::new()),
        Seat::new("Bob", vec![EnergyType::Water], Vec::new()),
    ];
    let mut game = Game::new(seats, RulesConfig::default(), 2024);
    game.logger.set_verbosity(VerbosityLevel::Silent);
    game.turn = 3;
    game
}

pub fn place(game: &mut Game, owner: PlayerId, position: Position, card: PokemonCard) -> PokemonRef {
    let card = CardRef::new(game.next_card_id(), Card::Pokemon(Arc::new(card)));
    game.place_pokemon(owner, position, card).expect("slot is free")
}

pub fn to_hand(game: &mut Game, owner: PlayerId, card: Card) {
    let card = CardRef::new(game.next_card_id(), card);
    game.player_mut(owner).hand.add(card);
}
