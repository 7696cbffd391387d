//! Checkup, knockouts and win conditions

use crate::core::{PlayerId, PokemonRef, Position, PrimaryCondition, SecondaryCondition, SpecialCondition, StatusKind, Trigger};
use crate::game::context::fire_triggers;
use crate::game::controller::{request_new_active, Agents};
use crate::game::{Game, GameEndReason, GameEvent, GameResult, TurnPhase};
use crate::{GameError, Result};

/// Run the checkup phase at the end of a turn
///
/// Both active Pokémon are checked, the attacker's first: poison, then burn
/// with its recovery flip, then the sleep flip, then paralysis wears off
/// for the attacker only. Checkup abilities fire afterwards, statuses tick
/// down, and the board is settled.
pub fn run_checkup(game: &mut Game, agents: Agents<'_>) -> Result<()> {
    game.phase = TurnPhase::Checkup;
    let attacking = game.attacking;
    for owner in [attacking, attacking.opponent()] {
        let Some(active) = game.active_ref(owner) else {
            continue;
        };
        check_active(game, &active, owner == attacking);
    }

    for owner in [attacking, attacking.opponent()] {
        let in_play = game.in_play(owner);
        fire_triggers(game, agents, &in_play, |trigger| matches!(trigger, Trigger::OnCheckup), None)?;
    }

    game.expire_statuses();
    settle(game, agents)
}

fn check_active(game: &mut Game, active: &PokemonRef, is_attacker: bool) {
    let Some(pokemon) = game.pokemon(active) else {
        return;
    };
    let conditions = pokemon.conditions();

    let poison = if conditions.contains(&SpecialCondition::Secondary(SecondaryCondition::PoisonedPlus)) {
        Some(game.rules.poison_plus_damage)
    } else if conditions.contains(&SpecialCondition::Secondary(SecondaryCondition::Poisoned)) {
        Some(game.rules.poison_damage)
    } else {
        None
    };
    if let Some(amount) = poison {
        game.damage_pokemon(active, amount, false);
    }

    let burned = SpecialCondition::Secondary(SecondaryCondition::Burned);
    if conditions.contains(&burned) {
        let amount = game.rules.burn_damage;
        game.damage_pokemon(active, amount, false);
        if game.flip_coin(active.owner) {
            game.recover_condition(active, burned);
        }
    }

    let asleep = SpecialCondition::Primary(PrimaryCondition::Asleep);
    if conditions.contains(&asleep) && game.flip_coin(active.owner) {
        game.recover_condition(active, asleep);
    }

    let paralyzed = SpecialCondition::Primary(PrimaryCondition::Paralyzed);
    if is_attacker && conditions.contains(&paralyzed) {
        game.recover_condition(active, paralyzed);
    }
}

/// Knock out every Pokémon at zero HP and award prize points
///
/// Pokémon under a knockout guard stay in play.
pub fn knockout_sweep(game: &mut Game) -> usize {
    let mut knocked_out = 0;
    for owner in [game.defending(), game.attacking] {
        for target in game.in_play(owner) {
            let Some(pokemon) = game.pokemon(&target) else {
                continue;
            };
            if !pokemon.is_knocked_out() || game.has_status(&target, StatusKind::KnockoutGuard) {
                continue;
            }
            let name = pokemon.name().clone();
            let Some(prize_value) = game.discard_pokemon(&target) else {
                continue;
            };
            game.log(GameEvent::KnockedOut { player: owner, pokemon: name, prize_value });
            game.tracking.knocked_out.push(target.id);
            game.award_prize(owner.opponent(), prize_value);
            knocked_out += 1;
        }
    }
    knocked_out
}

/// Count each player's win conditions and decide the match if any is met
///
/// "Opponent has no Pokémon in play" and "reached the prize threshold" are
/// counted separately; more conditions wins and a tie is a draw.
pub fn check_win_conditions(game: &Game) -> Option<GameResult> {
    let count = |player: PlayerId| -> u32 {
        let opponent_empty = game.player(player.opponent()).in_play_count() == 0;
        let prizes = game.player(player).prize_points >= game.rules.prize_threshold;
        u32::from(opponent_empty) + u32::from(prizes)
    };
    let first = count(PlayerId::FIRST);
    let second = count(PlayerId::SECOND);
    if first == 0 && second == 0 {
        return None;
    }
    let winner = match first.cmp(&second) {
        std::cmp::Ordering::Greater => Some(PlayerId::FIRST),
        std::cmp::Ordering::Less => Some(PlayerId::SECOND),
        std::cmp::Ordering::Equal => None,
    };
    Some(GameResult {
        winner,
        turns_played: game.turn,
        end_reason: GameEndReason::Conditions,
        conditions: [first, second],
    })
}

/// Sweep knockouts, decide the match if it is over, and otherwise make
/// sure both players have an active Pokémon
pub fn settle(game: &mut Game, agents: Agents<'_>) -> Result<()> {
    if game.is_over() {
        return Ok(());
    }
    knockout_sweep(game);
    game.check_prize_ledger()?;
    if let Some(result) = check_win_conditions(game) {
        game.finish(result);
        return Ok(());
    }
    for owner in [game.defending(), game.attacking] {
        promote_active(game, agents, owner)?;
    }
    Ok(())
}

/// Fill an empty active slot from the bench
fn promote_active(game: &mut Game, agents: Agents<'_>, owner: PlayerId) -> Result<()> {
    if game.player(owner).active().is_some() {
        return Ok(());
    }
    let options = game.bench_refs(owner);
    let chosen = request_new_active(agents[owner.index()], game, owner, &options)?
        .ok_or_else(|| GameError::InvalidState(format!("{owner} has no active Pokémon and an empty bench")))?;
    game.player_mut(owner).swap_slots(Position::Active, chosen.position);
    let name = game
        .player(owner)
        .active()
        .map(|p| p.name().clone())
        .ok_or_else(|| GameError::InvalidState(format!("{owner} promotion left the active spot empty")))?;
    game.log(GameEvent::ActivePromoted { player: owner, pokemon: name });
    Ok(())
}
