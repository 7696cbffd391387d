//! End-to-end rules scenarios: damage, coin-gated effects, checkup knockouts,
//! simultaneous knockouts and once-per-turn abilities

mod common;

use common::{attack, empty_game, place, pokemon, to_hand};
use pocket_sim::compiler::Compiler;
use pocket_sim::core::{
    Card, EnergyType, PlayerId, Position, SecondaryCondition, SpecialCondition, StatusKind, TrainerCard,
    TrainerKind,
};
use pocket_sim::game::actions::execute_action;
use pocket_sim::game::checkup::{run_checkup, settle};
use pocket_sim::game::combat::resolve_attack;
use pocket_sim::game::context::enter_play;
use pocket_sim::game::{
    DecisionAgent, Game, GameEndReason, GameEvent, GameLoop, PlayerAction, RulesConfig, Seat, VerbosityLevel,
    ZeroAgent,
};
use pocket_sim::GameError;
use std::sync::Arc;

const ME: PlayerId = PlayerId::FIRST;
const THEM: PlayerId = PlayerId::SECOND;

#[test]
fn test_weakness_adds_twenty() {
    let compiler = Compiler::new();
    let mut game = empty_game();
    let mut charmander = pokemon("Charmander", 60, EnergyType::Fire);
    charmander.attacks.push(attack(&compiler, "Ember", &[EnergyType::Fire], 40, ""));
    let mut squirtle = pokemon("Squirtle", 100, EnergyType::Water);
    squirtle.weakness = Some(EnergyType::Fire);

    let attacker = place(&mut game, ME, Position::Active, charmander);
    let defender = place(&mut game, THEM, Position::Active, squirtle);
    game.attach_energy(&attacker, EnergyType::Fire);

    let agent = ZeroAgent::new();
    resolve_attack(&mut game, [&agent, &agent], ME, 0).unwrap();

    assert_eq!(game.pokemon(&defender).unwrap().hp, 40);
    let dealt: Vec<i32> = game
        .logger
        .events()
        .filter_map(|e| match e {
            GameEvent::Damaged { amount, by_attack: true, .. } => Some(*amount),
            _ => None,
        })
        .collect();
    assert_eq!(dealt, vec![60]);
}

fn coin_discard_game(heads: bool) -> usize {
    let compiler = Compiler::new();
    let mut game = empty_game();
    let mut meowth = pokemon("Meowth", 60, EnergyType::Colorless);
    meowth.attacks.push(attack(
        &compiler,
        "Pay Day",
        &[],
        0,
        "Flip a coin. If heads, discard a random card from the opponent's hand.",
    ));
    place(&mut game, ME, Position::Active, meowth);
    place(&mut game, THEM, Position::Active, pokemon("Snorlax", 150, EnergyType::Colorless));
    for name in ["Abra", "Gastly", "Drowzee"] {
        to_hand(&mut game, THEM, Card::Pokemon(Arc::new(pokemon(name, 50, EnergyType::Psychic))));
    }

    game.queue_coin_flips([heads]);
    let agent = ZeroAgent::new();
    resolve_attack(&mut game, [&agent, &agent], ME, 0).unwrap();
    assert_eq!(game.player(THEM).hand.len() + game.player(THEM).discard.len(), 3);
    game.player(THEM).hand.len()
}

#[test]
fn test_coin_gated_discard() {
    assert_eq!(coin_discard_game(true), 2);
    assert_eq!(coin_discard_game(false), 3);
}

#[test]
fn test_poison_knockout_at_checkup() {
    let mut game = empty_game();
    place(&mut game, ME, Position::Active, pokemon("Ekans", 60, EnergyType::Grass));
    let mut weedle = pokemon("Weedle", 50, EnergyType::Grass);
    weedle.prize_value = 1;
    let target = place(&mut game, THEM, Position::Active, weedle);
    game.damage_pokemon(&target, 40, true);
    game.apply_condition(&target, SpecialCondition::Secondary(SecondaryCondition::Poisoned));

    let agent = ZeroAgent::new();
    run_checkup(&mut game, [&agent, &agent]).unwrap();

    assert!(game.player(THEM).active().is_none());
    assert_eq!(game.player(ME).prize_points, 1);
    let result = game.result().expect("the match is decided");
    assert_eq!(result.winner, Some(ME));
    assert_eq!(result.end_reason, GameEndReason::Conditions);
    assert_eq!(result.conditions[THEM.index()], 0);
    assert!(game.logger.events().any(|e| matches!(e, GameEvent::KnockedOut { prize_value: 1, .. })));
}

#[test]
fn test_poison_knockout_with_bench_keeps_playing() {
    let mut game = empty_game();
    place(&mut game, ME, Position::Active, pokemon("Ekans", 60, EnergyType::Grass));
    let mut nidoking = pokemon("Nidoking ex", 150, EnergyType::Grass);
    nidoking.prize_value = 2;
    let target = place(&mut game, THEM, Position::Active, nidoking);
    let spare = place(&mut game, THEM, Position::Bench(0), pokemon("Oddish", 60, EnergyType::Grass));
    game.damage_pokemon(&target, 140, true);
    game.apply_condition(&target, SpecialCondition::Secondary(SecondaryCondition::Poisoned));

    let agent = ZeroAgent::new();
    run_checkup(&mut game, [&agent, &agent]).unwrap();

    assert!(!game.is_over());
    assert_eq!(game.player(ME).prize_points, 2);
    assert_eq!(game.player(THEM).active().unwrap().id, spare.id);
}

#[test]
fn test_counter_damage_double_knockout_is_draw() {
    let compiler = Compiler::new();
    let mut game = empty_game();
    let mut pikachu = pokemon("Pikachu", 20, EnergyType::Lightning);
    pikachu.attacks.push(attack(&compiler, "Gnaw", &[EnergyType::Lightning], 40, ""));
    let attacker = place(&mut game, ME, Position::Active, pikachu);
    place(&mut game, THEM, Position::Active, pokemon("Geodude", 40, EnergyType::Fighting));
    game.attach_energy(&attacker, EnergyType::Lightning);

    let helmet = compiler.compile_trainer(
        TrainerKind::PokemonTool,
        "If the Pokémon this card is attached to is in the Active Spot and is damaged by an attack from your opponent's Pokémon, do 20 damage to the Attacking Pokémon.",
    );
    assert!(helmet.ok, "{:?}", helmet.unmatched);
    let helmet = Card::Trainer(Arc::new(TrainerCard {
        id: "IT-helmet".to_string(),
        name: "Rocky Helmet".into(),
        kind: TrainerKind::PokemonTool,
        text: String::new(),
        effect: helmet.value.effect,
        fossil: None,
    }));
    to_hand(&mut game, THEM, helmet);
    let helmet_id = game.player(THEM).hand.iter().next().unwrap().id;

    let agent = ZeroAgent::new();
    let agents = [&agent as &dyn pocket_sim::game::DecisionAgent, &agent];
    execute_action(&mut game, agents, THEM, PlayerAction::AttachTool { card: helmet_id, target: Position::Active }).unwrap();
    execute_action(&mut game, agents, ME, PlayerAction::Attack(0)).unwrap();
    settle(&mut game, agents).unwrap();

    assert_eq!(game.player(ME).in_play_count(), 0);
    assert_eq!(game.player(THEM).in_play_count(), 0);
    let result = game.result().expect("the match is decided");
    assert_eq!(result.winner, None);
    assert_eq!(result.conditions, [1, 1]);
}

#[test]
fn test_once_per_turn_ability_on_same_instance() {
    let compiler = Compiler::new();
    let mut game = empty_game();
    let heal = compiler.compile_ability(
        "Soothing Aroma",
        "Once during your turn, if this Pokémon is in the Active Spot, you may heal 10 damage from this Pokémon.",
    );
    assert!(heal.ok, "{:?}", heal.unmatched);
    let mut bellossom = pokemon("Bellossom", 120, EnergyType::Grass);
    bellossom.ability = Some(heal.value);
    let target = place(&mut game, ME, Position::Active, bellossom);
    place(&mut game, THEM, Position::Active, pokemon("Rattata", 40, EnergyType::Colorless));
    game.damage_pokemon(&target, 50, true);

    let agent = ZeroAgent::new();
    let agents = [&agent as &dyn pocket_sim::game::DecisionAgent, &agent];
    execute_action(&mut game, agents, ME, PlayerAction::UseAbility(Position::Active)).unwrap();
    assert_eq!(game.pokemon(&target).unwrap().hp, 80);

    let again = execute_action(&mut game, agents, ME, PlayerAction::UseAbility(Position::Active));
    assert!(matches!(again, Err(GameError::InvalidAction { .. })));
    assert_eq!(game.pokemon(&target).unwrap().hp, 80);
}

#[test]
fn test_setup_pokemon_get_passive_abilities() {
    let compiler = Compiler::new();
    let shell = compiler.compile_ability("Shell Armor", "This Pokémon takes −20 damage from attacks.");
    assert!(shell.ok, "{:?}", shell.unmatched);
    let mut shellder = pokemon("Shellder", 60, EnergyType::Water);
    shellder.ability = Some(shell.value);
    let deck: Vec<Card> = (0..20).map(|_| Card::Pokemon(Arc::new(shellder.clone()))).collect();
    let seats = [
        Seat::new("Alice", vec![EnergyType::Water], deck.clone()),
        Seat::new("Bob", vec![EnergyType::Water], deck),
    ];
    let mut game = Game::new(seats, RulesConfig::default(), 11);
    game.logger.set_verbosity(VerbosityLevel::Silent);

    let agent = ZeroAgent::new();
    GameLoop::new(&mut game, [&agent, &agent]).setup().unwrap();

    for player in [ME, THEM] {
        let placed = game.in_play(player);
        assert!(!placed.is_empty());
        for target in placed {
            assert!(
                game.has_status(&target, StatusKind::DamageReduction(20)),
                "{player} {} started without its ability",
                target.position
            );
        }
    }
}

#[test]
fn test_non_stacking_grant_survives_one_source_leaving() {
    let compiler = Compiler::new();
    let lighten = compiler.compile_ability("Run Light", "Your Active Pokémon's Retreat Cost is 1 less.");
    assert!(lighten.ok, "{:?}", lighten.unmatched);
    let mut dodrio = pokemon("Dodrio", 100, EnergyType::Colorless);
    dodrio.ability = Some(lighten.value);
    let mut snorlax = pokemon("Snorlax", 150, EnergyType::Colorless);
    snorlax.retreat_cost = 3;

    let mut game = empty_game();
    let active = place(&mut game, ME, Position::Active, snorlax);
    let first = place(&mut game, ME, Position::Bench(0), dodrio.clone());
    let second = place(&mut game, ME, Position::Bench(1), dodrio);
    place(&mut game, THEM, Position::Active, pokemon("Rattata", 40, EnergyType::Colorless));

    let agent = ZeroAgent::new();
    let agents = [&agent as &dyn DecisionAgent, &agent];
    enter_play(&mut game, agents, &first).unwrap();
    enter_play(&mut game, agents, &second).unwrap();
    assert_eq!(game.retreat_cost(&active), 2);

    game.discard_pokemon(&first);
    assert_eq!(game.retreat_cost(&active), 2);

    game.discard_pokemon(&second);
    assert_eq!(game.retreat_cost(&active), 3);
}
