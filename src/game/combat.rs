//! Attack resolution
//!
//! Handles the attack gates, coin shapes, the three effect buckets and the
//! damage formula.

use crate::core::{
    Attack, AttackState, DamageShape, EffectSource, Origin, PlayerId, PokemonId, PokemonRef,
    PrimaryCondition, SpecialCondition, StatusKind, Trigger,
};
use crate::game::context::{fire_triggers, run_steps};
use crate::game::controller::Agents;
use crate::game::{EffectCtx, Game, GameEvent, TurnPhase};
use crate::{GameError, Result};

/// Damage one hit does to `target`, before prevention
///
/// Non-positive base damage never picks up modifiers. Weakness only applies
/// to the defending Pokémon while it is active.
pub fn damage_against(game: &Game, attacker: &PokemonRef, target: &PokemonRef, defender: PokemonId, base: i32) -> i32 {
    if base <= 0 {
        return 0;
    }
    let mut amount = base;

    for status in game.statuses_of(attacker) {
        if let Some(counterpart) = &status.counterpart {
            if !counterpart(game, attacker.owner, target) {
                continue;
            }
        }
        match status.kind {
            StatusKind::DamageBoost(n) => amount += n,
            StatusKind::DamagePenalty(n) => amount -= n,
            _ => {}
        }
    }

    if target.id == defender && target.position.is_active() {
        let weak = match (game.pokemon(attacker), game.pokemon(target)) {
            (Some(att), Some(def)) => def.card.weakness == Some(att.card.energy_type),
            _ => false,
        };
        if weak {
            amount += game.rules.weakness_bonus;
        }
    }

    for status in game.statuses_of(target) {
        if let Some(counterpart) = &status.counterpart {
            if !counterpart(game, target.owner, attacker) {
                continue;
            }
        }
        if let StatusKind::DamageReduction(n) = status.kind {
            amount -= n;
        }
    }

    amount.max(0)
}

/// Apply one hit of attack damage from the source Pokémon of `ctx`
pub fn deal_attack_damage(ctx: &mut EffectCtx<'_>, target: &PokemonRef, base: i32) -> i32 {
    let Some(attacker) = ctx.source_ref() else {
        return 0;
    };
    if target.owner != attacker.owner {
        let protected = ctx
            .game
            .statuses_of(target)
            .iter()
            .any(|s| matches!(s.kind, StatusKind::PreventDamage | StatusKind::PreventEffects));
        if protected {
            if let Some(pokemon) = ctx.game.pokemon(target) {
                let name = pokemon.name().clone();
                ctx.game.log(GameEvent::DamagePrevented { player: target.owner, pokemon: name });
            }
            return 0;
        }
    }
    let defender = ctx.attack.as_ref().map_or(target.id, |state| state.defender);
    let amount = damage_against(ctx.game, &attacker, target, defender, base);
    let dealt = ctx.game.damage_pokemon(target, amount, true);
    if dealt > 0 {
        if let Some(state) = ctx.attack.as_mut() {
            state.record_damage(target.id);
        }
    }
    dealt
}

/// Why the active Pokémon cannot use `attack` right now, if it cannot
pub fn attack_blocker(game: &Game, attacker: &PokemonRef, attack: &Attack) -> Option<String> {
    let pokemon = game.pokemon(attacker)?;
    match pokemon.primary {
        Some(PrimaryCondition::Asleep) => return Some("asleep".to_string()),
        Some(PrimaryCondition::Paralyzed) => return Some("paralyzed".to_string()),
        _ => {}
    }
    if game.has_status(attacker, StatusKind::CannotAttack) {
        return Some("can't attack".to_string());
    }
    if !game.effective_energy(attacker).can_pay(&attack.cost) {
        return Some("not enough energy".to_string());
    }
    let source = EffectSource::new(attacker.owner, Some(attacker.id), pokemon.name().clone(), Origin::Attack);
    if !attack.preconditions.iter().all(|check| check(game, &source)) {
        return Some("conditions not met".to_string());
    }
    None
}

/// Declare and resolve an attack by the active Pokémon of `player`
///
/// Declaring ends the turn whether or not the attack goes through.
pub fn resolve_attack(game: &mut Game, agents: Agents<'_>, player: PlayerId, index: usize) -> Result<()> {
    let attacker = game
        .active_ref(player)
        .ok_or_else(|| GameError::invalid_action(player, "attack", "no active Pokémon"))?;
    let card = game
        .pokemon(&attacker)
        .map(|p| p.card.clone())
        .ok_or_else(|| GameError::InvalidState("active Pokémon vanished".to_string()))?;
    let attack = card
        .attacks
        .get(index)
        .ok_or_else(|| GameError::invalid_action(player, "attack", format!("no attack #{index}")))?;
    if let Some(reason) = attack_blocker(game, &attacker, attack) {
        return Err(GameError::invalid_action(player, format!("attack {}", attack.name), reason));
    }
    let defender = game
        .active_ref(player.opponent())
        .ok_or_else(|| GameError::InvalidState(format!("{} has no active Pokémon", player.opponent())))?;

    game.phase = TurnPhase::AttackOrEnd;
    game.log(GameEvent::AttackDeclared {
        player,
        pokemon: card.name.clone(),
        attack: attack.name.clone(),
    });
    game.signal_end_of_turn();

    let gate_flips = game
        .statuses_of(&attacker)
        .iter()
        .filter(|s| s.kind == StatusKind::FlipToAttack)
        .count()
        + usize::from(
            game.pokemon(&attacker)
                .is_some_and(|p| p.has_condition(SpecialCondition::Primary(PrimaryCondition::Confused))),
        );
    for _ in 0..gate_flips {
        if !game.flip_coin(player) {
            game.log(GameEvent::AttackFailed {
                player,
                pokemon: card.name.clone(),
                attack: attack.name.clone(),
                reason: "tails".to_string(),
            });
            return Ok(());
        }
    }

    let source = EffectSource::new(player, Some(attacker.id), card.name.clone(), Origin::Attack);
    let state = AttackState::new(attacker.id, defender.id, attack);
    let mut ctx = EffectCtx::new(game, agents, source).with_attack(state);

    if let Some(coins) = attack.coins {
        let heads = ctx.flip_coins(coins);
        let flipped = ctx.flips();
        if let Some(state) = ctx.attack.as_mut() {
            state.heads = heads;
            state.coins_flipped = flipped;
        }
        if attack.shape == DamageShape::FlipOrNothing && heads == 0 {
            ctx.game.log(GameEvent::AttackFailed {
                player,
                pokemon: card.name.clone(),
                attack: attack.name.clone(),
                reason: "tails".to_string(),
            });
            return Ok(());
        }
    }

    run_steps(&mut ctx, &attack.pre_damage)?;

    if attack.shape != DamageShape::None {
        if let Some(target) = ctx.game.active_ref(player.opponent()) {
            if let Some(state) = ctx.attack.as_mut() {
                state.defender = target.id;
            }
            let amount = match (&attack.damage, &ctx.attack) {
                (Some(calc), Some(state)) => calc(ctx.game, &ctx.source, state),
                _ => attack.base_damage,
            };
            ctx.attack_damage(&target, amount);
        }
    }

    run_steps(&mut ctx, &attack.attacking)?;
    run_steps(&mut ctx, &attack.side)?;

    let damaged = ctx.attack.take().map(|state| state.damaged).unwrap_or_default();
    react_to_damage(game, agents, attacker.id, &damaged)
}

/// After-damaged abilities and counter damage for every Pokémon the attack hurt
fn react_to_damage(game: &mut Game, agents: Agents<'_>, attacker: PokemonId, damaged: &[PokemonId]) -> Result<()> {
    for id in damaged {
        let Some(target) = game.locate(*id) else {
            continue;
        };
        if target.owner == game.attacking {
            continue;
        }
        fire_triggers(
            game,
            agents,
            &[target],
            |trigger| matches!(trigger, Trigger::AfterDamaged),
            Some(attacker),
        )?;

        let Some(target) = game.locate(*id) else {
            continue;
        };
        if !target.position.is_active() {
            continue;
        }
        let counter: i32 = game
            .statuses_of(&target)
            .iter()
            .filter_map(|s| match s.kind {
                StatusKind::CounterDamage(n) => Some(n),
                _ => None,
            })
            .sum();
        if let Some(attacker) = game.locate(attacker) {
            game.damage_pokemon(&attacker, counter, false);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EnergyType, Position, Status, StatusDuration, StatusSource};
    use crate::game::test_support::{basic, card_ref, two_player_game, with_attack};
    use crate::game::ZeroAgent;

    fn setup(attacker_type: EnergyType, weakness: Option<EnergyType>) -> (Game, PokemonRef, PokemonRef) {
        let mut game = two_player_game();
        let mut charmander = with_attack(basic("Charmander", 60), "Ember", &[EnergyType::Fire], 40);
        charmander.energy_type = attacker_type;
        let mut squirtle = basic("Squirtle", 100);
        squirtle.weakness = weakness;
        let a = card_ref(&mut game, charmander);
        let d = card_ref(&mut game, squirtle);
        let a = game.place_pokemon(PlayerId::FIRST, Position::Active, a).unwrap();
        let d = game.place_pokemon(PlayerId::SECOND, Position::Active, d).unwrap();
        game.attach_energy(&a, EnergyType::Fire);
        game.turn = 2;
        (game, a, d)
    }

    #[test]
    fn test_weakness_bonus() {
        let (game, a, d) = setup(EnergyType::Fire, Some(EnergyType::Fire));
        assert_eq!(damage_against(&game, &a, &d, d.id, 40), 60);
        let (game, a, d) = setup(EnergyType::Fire, Some(EnergyType::Lightning));
        assert_eq!(damage_against(&game, &a, &d, d.id, 40), 40);
    }

    #[test]
    fn test_zero_base_ignores_modifiers() {
        let (mut game, a, d) = setup(EnergyType::Fire, Some(EnergyType::Fire));
        game.grant_status(&a, Status::new(StatusKind::DamageBoost(30), StatusSource::CardEffect("Giovanni".into()), StatusDuration::Checkups(1)));
        assert_eq!(damage_against(&game, &a, &d, d.id, 0), 0);
        assert_eq!(damage_against(&game, &a, &d, d.id, 10), 60);
    }

    #[test]
    fn test_reduction_floors_at_zero() {
        let (mut game, a, d) = setup(EnergyType::Fire, None);
        game.grant_status(&d, Status::new(StatusKind::DamageReduction(50), StatusSource::CardEffect("Harden".into()), StatusDuration::Checkups(1)));
        assert_eq!(damage_against(&game, &a, &d, d.id, 40), 0);
    }

    #[test]
    fn test_resolve_attack_ends_turn() {
        let (mut game, _, d) = setup(EnergyType::Fire, Some(EnergyType::Fire));
        let agent = ZeroAgent::new();
        resolve_attack(&mut game, [&agent, &agent], PlayerId::FIRST, 0).unwrap();
        assert!(game.end_signalled());
        assert_eq!(game.pokemon(&d).unwrap().hp, 40);
    }

    #[test]
    fn test_confused_tails_fails_attack() {
        let (mut game, a, d) = setup(EnergyType::Fire, None);
        game.apply_condition(&a, SpecialCondition::Primary(PrimaryCondition::Confused));
        game.queue_coin_flips([false]);
        let agent = ZeroAgent::new();
        resolve_attack(&mut game, [&agent, &agent], PlayerId::FIRST, 0).unwrap();
        assert_eq!(game.pokemon(&d).unwrap().hp, 100);
        assert!(game.logger.events().any(|e| matches!(e, GameEvent::AttackFailed { .. })));
        assert!(game.end_signalled());
    }

    #[test]
    fn test_prevent_damage_suppresses_hit() {
        let (mut game, _, d) = setup(EnergyType::Fire, Some(EnergyType::Fire));
        game.grant_status(&d, Status::new(StatusKind::PreventDamage, StatusSource::CardEffect("Protect".into()), StatusDuration::Checkups(1)));
        let agent = ZeroAgent::new();
        resolve_attack(&mut game, [&agent, &agent], PlayerId::FIRST, 0).unwrap();
        assert_eq!(game.pokemon(&d).unwrap().hp, 100);
    }

    #[test]
    fn test_cannot_attack_without_energy() {
        let (mut game, a, _) = setup(EnergyType::Fire, None);
        game.discard_energy(&a, None, 1);
        let agent = ZeroAgent::new();
        let err = resolve_attack(&mut game, [&agent, &agent], PlayerId::FIRST, 0).unwrap_err();
        assert!(matches!(err, GameError::InvalidAction { .. }));
        assert!(!game.end_signalled());
    }
}
