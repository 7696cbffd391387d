//! Same seed, same game: two runs must produce identical event logs

mod common;

use common::{catalog, deck};
use pocket_sim::game::{Game, GameLoop, RandomAgent, RulesConfig, VerbosityLevel};
use pocket_sim::loader::DeckSpec;
use pocket_sim::tournament::{play_game, AgentKind};
use similar_asserts::assert_eq;

fn play_logged(decks: [&DeckSpec; 2], seed: u64) -> Vec<String> {
    let seats = [decks[0].clone().into_seat("Alice"), decks[1].clone().into_seat("Bob")];
    let mut game = Game::new(seats, RulesConfig::default(), seed);
    let first = RandomAgent::with_seed(seed ^ 0x5eed);
    let second = RandomAgent::with_seed(seed.rotate_left(17));
    GameLoop::new(&mut game, [&first, &second])
        .with_verbosity(VerbosityLevel::Silent)
        .run_game()
        .expect("game runs to completion");
    game.logger
        .entries()
        .iter()
        .map(|entry| serde_json::to_string(entry).expect("log entries serialize"))
        .collect()
}

#[test]
fn test_same_seed_same_log() {
    let catalog = catalog();
    let lightning = deck(&catalog, "lightning");
    let fire = deck(&catalog, "fire");

    for seed in [1, 42, 9001] {
        let run1 = play_logged([&lightning, &fire], seed);
        let run2 = play_logged([&lightning, &fire], seed);
        assert!(!run1.is_empty());
        assert_eq!(run1, run2);
    }
}

#[test]
fn test_different_seeds_diverge() {
    let catalog = catalog();
    let water = deck(&catalog, "water");
    let fire = deck(&catalog, "fire");
    let runs: Vec<_> = (0..4).map(|seed| play_logged([&water, &fire], seed)).collect();
    assert!(runs.windows(2).any(|pair| pair[0] != pair[1]));
}

#[test]
fn test_tournament_game_is_reproducible() {
    let catalog = catalog();
    let water = deck(&catalog, "water");
    let lightning = deck(&catalog, "lightning");
    let rules = RulesConfig::default();
    let agents = [AgentKind::Random, AgentKind::Zero];

    let first = play_game([&water, &lightning], agents, &rules, 77).unwrap();
    let second = play_game([&water, &lightning], agents, &rules, 77).unwrap();
    assert_eq!(first, second);
    assert!(first.turns_played <= rules.turn_limit);
}
