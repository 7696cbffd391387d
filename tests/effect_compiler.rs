//! Compiled card text running against a live game

mod common;

use common::{attack, catalog, empty_game, place, pokemon, to_hand};
use pocket_sim::compiler::Compiler;
use pocket_sim::core::{Card, EnergyType, PlayerId, PokemonCard, Position, StatusKind};
use pocket_sim::game::actions::execute_action;
use pocket_sim::game::combat::resolve_attack;
use pocket_sim::game::{DecisionAgent, PlayerAction, ZeroAgent};
use pocket_sim::loader::CardCatalog;

const ME: PlayerId = PlayerId::FIRST;
const THEM: PlayerId = PlayerId::SECOND;

fn printed(catalog: &CardCatalog, name: &str) -> PokemonCard {
    catalog
        .get(name)
        .and_then(Card::as_pokemon)
        .map(|card| card.as_ref().clone())
        .unwrap_or_else(|| panic!("{name} is a Pokémon in the test catalog"))
}

fn hand_id(game: &pocket_sim::game::Game, player: PlayerId, name: &str) -> pocket_sim::core::CardId {
    game.player(player)
        .hand
        .iter()
        .find(|c| c.name().as_str() == name)
        .map(|c| c.id)
        .unwrap_or_else(|| panic!("{name} in hand"))
}

#[test]
fn test_catalog_compiles_cleanly() {
    let catalog = catalog();
    let failures: Vec<String> = catalog.report().failures.iter().map(ToString::to_string).collect();
    assert!(failures.is_empty(), "{failures:#?}");
    assert_eq!(catalog.len(), 41);
    assert!(catalog.contains("Poke Ball"));
    assert!(catalog.get("PIKACHU EX").is_some());
}

#[test]
fn test_damage_per_benched_lightning() {
    let catalog = catalog();
    let mut game = empty_game();
    let attacker = place(&mut game, ME, Position::Active, printed(&catalog, "Pikachu ex"));
    place(&mut game, ME, Position::Bench(0), printed(&catalog, "Voltorb"));
    place(&mut game, ME, Position::Bench(1), printed(&catalog, "Magnemite"));
    place(&mut game, ME, Position::Bench(2), printed(&catalog, "Squirtle"));
    let defender = place(&mut game, THEM, Position::Active, pokemon("Snorlax", 150, EnergyType::Colorless));
    game.attach_energy(&attacker, EnergyType::Lightning);
    game.attach_energy(&attacker, EnergyType::Lightning);

    let agent = ZeroAgent::new();
    resolve_attack(&mut game, [&agent, &agent], ME, 0).unwrap();
    assert_eq!(game.pokemon(&defender).unwrap().hp, 90);
}

#[test]
fn test_coin_scaled_damage_uses_every_flip() {
    let catalog = catalog();
    let mut game = empty_game();
    let attacker = place(&mut game, ME, Position::Active, printed(&catalog, "Zapdos ex"));
    let defender = place(&mut game, THEM, Position::Active, pokemon("Snorlax", 200, EnergyType::Colorless));
    for _ in 0..3 {
        game.attach_energy(&attacker, EnergyType::Lightning);
    }
    game.queue_coin_flips([true, false, true, true]);

    let agent = ZeroAgent::new();
    resolve_attack(&mut game, [&agent, &agent], ME, 1).unwrap();
    assert_eq!(game.pokemon(&defender).unwrap().hp, 50);
}

#[test]
fn test_supporter_boost_applies_this_turn() {
    let catalog = catalog();
    let mut game = empty_game();
    let attacker = place(&mut game, ME, Position::Active, printed(&catalog, "Pikachu"));
    let defender = place(&mut game, THEM, Position::Active, pokemon("Snorlax", 150, EnergyType::Colorless));
    game.attach_energy(&attacker, EnergyType::Lightning);
    to_hand(&mut game, ME, catalog.get("Giovanni").cloned().unwrap());
    let giovanni = hand_id(&game, ME, "Giovanni");

    let agent = ZeroAgent::new();
    let agents = [&agent as &dyn DecisionAgent, &agent];
    execute_action(&mut game, agents, ME, PlayerAction::PlayTrainer(giovanni)).unwrap();
    execute_action(&mut game, agents, ME, PlayerAction::Attack(0)).unwrap();
    assert_eq!(game.pokemon(&defender).unwrap().hp, 120);
    assert!(game.gates.supporter_used);
}

#[test]
fn test_named_boost_skips_other_pokemon() {
    let catalog = catalog();
    let mut game = empty_game();
    let attacker = place(&mut game, ME, Position::Active, printed(&catalog, "Ponyta"));
    let defender = place(&mut game, THEM, Position::Active, pokemon("Snorlax", 150, EnergyType::Colorless));
    game.attach_energy(&attacker, EnergyType::Fire);
    to_hand(&mut game, ME, catalog.get("Blaine").cloned().unwrap());
    let blaine = hand_id(&game, ME, "Blaine");

    let agent = ZeroAgent::new();
    let agents = [&agent as &dyn DecisionAgent, &agent];
    execute_action(&mut game, agents, ME, PlayerAction::PlayTrainer(blaine)).unwrap();
    execute_action(&mut game, agents, ME, PlayerAction::Attack(0)).unwrap();
    assert_eq!(game.pokemon(&defender).unwrap().hp, 130);
}

#[test]
fn test_reduction_in_either_clause_order() {
    let compiler = Compiler::new();
    for text in [
        "During your opponent's next turn, this Pokémon takes -20 damage from attacks.",
        "This Pokémon takes -20 damage from attacks during your opponent's next turn.",
    ] {
        let mut game = empty_game();
        let mut seel = pokemon("Seel", 70, EnergyType::Water);
        seel.attacks.push(attack(&compiler, "Headbutt", &[EnergyType::Water], 20, text));
        let attacker = place(&mut game, ME, Position::Active, seel);
        place(&mut game, THEM, Position::Active, pokemon("Rattata", 40, EnergyType::Colorless));
        game.attach_energy(&attacker, EnergyType::Water);

        let agent = ZeroAgent::new();
        resolve_attack(&mut game, [&agent, &agent], ME, 0).unwrap();
        let reduced = game
            .statuses_of(&attacker)
            .iter()
            .any(|s| s.kind == StatusKind::DamageReduction(20));
        assert!(reduced, "no reduction from {text:?}");
    }
}

#[test]
fn test_fossil_plays_as_basic() {
    let catalog = catalog();
    let mut game = empty_game();
    place(&mut game, ME, Position::Active, printed(&catalog, "Pikachu"));
    to_hand(&mut game, ME, catalog.get("Helix Fossil").cloned().unwrap());
    let fossil = hand_id(&game, ME, "Helix Fossil");

    let agent = ZeroAgent::new();
    let agents = [&agent as &dyn DecisionAgent, &agent];
    execute_action(&mut game, agents, ME, PlayerAction::PlayFossil(fossil)).unwrap();
    let placed = game.slot_ref(ME, Position::Bench(0)).expect("fossil on the bench");
    assert_eq!(game.pokemon(&placed).unwrap().hp, 40);
    assert!(game.has_status(&placed, StatusKind::CannotRetreat));

    execute_action(&mut game, agents, ME, PlayerAction::DiscardFossil(Position::Bench(0))).unwrap();
    assert!(game.slot_ref(ME, Position::Bench(0)).is_none());
}

#[test]
fn test_unknown_sentence_is_reported_not_fatal() {
    let compiler = Compiler::new();
    let compiled = compiler.compile_attack(
        "Thunder Jolt",
        &[EnergyType::Lightning],
        50,
        "Flip a coin. If heads, this attack does 30 more damage. Shout at the moon.",
    );
    assert!(!compiled.ok);
    assert_eq!(compiled.unmatched.len(), 1);
    assert_eq!(compiled.value.base_damage, 50);
}
