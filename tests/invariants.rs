//! Property tests for rules that must hold in every game state

mod common;

use common::{catalog, deck, empty_game, place, pokemon};
use pocket_sim::core::{
    EnergyType, PlayerId, Position, Status, StatusDuration, StatusKind, StatusSource,
};
use pocket_sim::game::combat::damage_against;
use pocket_sim::game::{Game, GameEndReason, GameEvent, GameLoop, RandomAgent, RulesConfig, VerbosityLevel};
use proptest::prelude::*;

fn effect(name: &str) -> StatusSource {
    StatusSource::CardEffect(name.into())
}

proptest! {
    #[test]
    fn test_damage_is_never_negative(
        base in 0i32..300,
        reduction in 0i32..200,
        boost in 0i32..60,
        weak in any::<bool>(),
    ) {
        let mut game = empty_game();
        let attacker = place(&mut game, PlayerId::FIRST, Position::Active, pokemon("Charmander", 60, EnergyType::Fire));
        let mut squirtle = pokemon("Squirtle", 60, EnergyType::Water);
        if weak {
            squirtle.weakness = Some(EnergyType::Fire);
        }
        let defender = place(&mut game, PlayerId::SECOND, Position::Active, squirtle);
        game.grant_status(&attacker, Status::new(StatusKind::DamageBoost(boost), effect("Giovanni"), StatusDuration::Checkups(1)));
        game.grant_status(&defender, Status::new(StatusKind::DamageReduction(reduction), effect("Harden"), StatusDuration::Checkups(1)));

        let dealt = damage_against(&game, &attacker, &defender, defender.id, base);
        prop_assert!(dealt >= 0);
        if base == 0 {
            prop_assert_eq!(dealt, 0);
        }
        if reduction == 0 && boost == 0 && base > 0 {
            prop_assert_eq!(dealt, base + if weak { 20 } else { 0 });
        }
    }

    #[test]
    fn test_checkup_counters_expire_on_time(checkups in 1u32..6) {
        let mut game = empty_game();
        let target = place(&mut game, PlayerId::FIRST, Position::Active, pokemon("Onix", 110, EnergyType::Fighting));
        game.grant_status(&target, Status::new(StatusKind::CannotRetreat, effect("Bind"), StatusDuration::Checkups(checkups)));

        for _ in 1..checkups {
            game.expire_statuses();
            prop_assert!(game.has_status(&target, StatusKind::CannotRetreat));
        }
        game.expire_statuses();
        prop_assert!(!game.has_status(&target, StatusKind::CannotRetreat));
    }
}

#[test]
fn test_next_turn_status_outlives_one_checkup() {
    let mut game = empty_game();
    let target = place(&mut game, PlayerId::FIRST, Position::Active, pokemon("Onix", 110, EnergyType::Fighting));
    let granted_turn = game.turn;
    game.grant_status(&target, Status::new(StatusKind::PreventDamage, effect("Protect"), StatusDuration::ThroughNextTurn { granted_turn }));

    game.expire_statuses();
    assert!(game.has_status(&target, StatusKind::PreventDamage));
    game.turn += 1;
    game.expire_statuses();
    assert!(!game.has_status(&target, StatusKind::PreventDamage));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn test_full_games_keep_board_invariants(seed in any::<u64>(), decks in (0usize..3, 0usize..3)) {
        let catalog = catalog();
        let names = ["lightning", "fire", "water"];
        let seats = [
            deck(&catalog, names[decks.0]).into_seat("Alice"),
            deck(&catalog, names[decks.1]).into_seat("Bob"),
        ];
        let mut game = Game::new(seats, RulesConfig::default(), seed);
        let first = RandomAgent::with_seed(seed.wrapping_add(1));
        let second = RandomAgent::with_seed(seed.wrapping_add(2));
        let result = GameLoop::new(&mut game, [&first, &second])
            .with_verbosity(VerbosityLevel::Silent)
            .run_game()
            .expect("random agents never break the decision contract");

        prop_assert!(result.turns_played <= game.rules.turn_limit);

        // Prize totals only ever grow, by the value of the Pokémon knocked out
        let mut totals = [0u32; 2];
        let mut knocked_out_value = 0;
        for event in game.logger.events() {
            match event {
                GameEvent::KnockedOut { prize_value, .. } => knocked_out_value += prize_value,
                GameEvent::PrizeAwarded { player, points, total } => {
                    prop_assert!(*points > 0);
                    prop_assert_eq!(*total, totals[player.index()] + points);
                    totals[player.index()] = *total;
                }
                _ => {}
            }
        }
        prop_assert_eq!(totals.iter().sum::<u32>(), knocked_out_value);

        for player in PlayerId::both() {
            let me = game.player(player);
            prop_assert_eq!(me.prize_points, totals[player.index()]);
            prop_assert!(me.in_play_count() <= Position::all().len());
            for (_, pokemon) in me.occupied() {
                prop_assert!(pokemon.hp >= 0);
            }
            // A match decided mid-settle may leave a player without a promoted active
            if me.in_play_count() > 0 && result.end_reason == GameEndReason::TurnLimit {
                prop_assert!(me.active().is_some());
            }
        }
    }
}
