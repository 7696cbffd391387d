//! Main-phase actions and the turn context
//!
//! Agents act only through a `TurnContext`. Every action is validated
//! before anything changes, and the board is settled (knockouts, win check,
//! replacements) after each one.

use crate::core::{
    Card, CardId, CardRef, EffectSource, EnergyType, Origin, PlayerId, PokemonRef, Position,
    PrimaryCondition, StatusKind, TrainerKind, Trigger,
};
use crate::game::checkup::settle;
use crate::game::combat::{attack_blocker, resolve_attack};
use crate::game::context::{enter_play, fire_triggers, run_effect};
use crate::game::controller::Agents;
use crate::game::{Game, GameEvent, GameView};
use crate::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something a player can do during their main phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Put a Basic Pokémon from hand onto the bench
    PlayBasic(CardId),
    Evolve { card: CardId, target: Position },
    /// Attach this turn's energy
    AttachEnergy(Position),
    /// Play an Item or Supporter
    PlayTrainer(CardId),
    AttachTool { card: CardId, target: Position },
    PlayFossil(CardId),
    DiscardFossil(Position),
    /// Retreat the active Pokémon, swapping in the benched one at this position
    Retreat(Position),
    UseAbility(Position),
    /// Use the active Pokémon's attack with this index; ends the turn
    Attack(usize),
    EndTurn,
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerAction::PlayBasic(card) => write!(f, "play basic {card}"),
            PlayerAction::Evolve { card, target } => write!(f, "evolve {target} with {card}"),
            PlayerAction::AttachEnergy(target) => write!(f, "attach energy to {target}"),
            PlayerAction::PlayTrainer(card) => write!(f, "play trainer {card}"),
            PlayerAction::AttachTool { card, target } => write!(f, "attach tool {card} to {target}"),
            PlayerAction::PlayFossil(card) => write!(f, "play fossil {card}"),
            PlayerAction::DiscardFossil(target) => write!(f, "discard fossil at {target}"),
            PlayerAction::Retreat(target) => write!(f, "retreat to {target}"),
            PlayerAction::UseAbility(target) => write!(f, "use ability at {target}"),
            PlayerAction::Attack(index) => write!(f, "attack #{index}"),
            PlayerAction::EndTurn => write!(f, "end turn"),
        }
    }
}

/// The restricted handle an agent's turn routine acts through
///
/// Once the turn has ended (an attack was declared, an effect ended the
/// turn, the routine asked to end it, or the match is over) every further
/// action fails with `GameError::TurnEnded`.
pub struct TurnContext<'a> {
    game: &'a mut Game,
    agents: Agents<'a>,
    player: PlayerId,
}

impl<'a> TurnContext<'a> {
    pub(crate) fn new(game: &'a mut Game, agents: Agents<'a>, player: PlayerId) -> Self {
        TurnContext { game, agents, player }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player
    }

    pub fn view(&self) -> GameView<'_> {
        GameView::new(self.game, self.player)
    }

    pub fn game(&self) -> &Game {
        self.game
    }

    pub fn is_closed(&self) -> bool {
        self.game.end_signalled()
    }

    /// Every action that would pass validation right now
    pub fn available_actions(&self) -> Vec<PlayerAction> {
        if self.is_closed() {
            return Vec::new();
        }
        candidate_actions(self.game, self.player)
            .into_iter()
            .filter(|action| validate_action(self.game, self.player, action).is_ok())
            .collect()
    }

    /// Validate and execute one action, then settle the board
    pub fn perform(&mut self, action: PlayerAction) -> Result<()> {
        if self.is_closed() {
            return Err(GameError::TurnEnded);
        }
        let result = execute_action(self.game, self.agents, self.player, action);
        settle(self.game, self.agents)?;
        result
    }

    pub fn end_turn(&mut self) -> Result<()> {
        self.perform(PlayerAction::EndTurn)
    }
}

fn candidate_actions(game: &Game, player: PlayerId) -> Vec<PlayerAction> {
    let mut actions = Vec::new();
    let positions = Position::all();
    for card in game.player(player).hand.iter() {
        actions.push(PlayerAction::PlayBasic(card.id));
        actions.push(PlayerAction::PlayTrainer(card.id));
        actions.push(PlayerAction::PlayFossil(card.id));
        for target in positions {
            actions.push(PlayerAction::Evolve { card: card.id, target });
            actions.push(PlayerAction::AttachTool { card: card.id, target });
        }
    }
    for target in positions {
        actions.push(PlayerAction::AttachEnergy(target));
        actions.push(PlayerAction::UseAbility(target));
        actions.push(PlayerAction::Retreat(target));
        actions.push(PlayerAction::DiscardFossil(target));
    }
    if let Some(active) = game.player(player).active() {
        actions.extend((0..active.card.attacks.len()).map(PlayerAction::Attack));
    }
    actions.push(PlayerAction::EndTurn);
    actions
}

fn reject(player: PlayerId, action: &PlayerAction, reason: impl Into<String>) -> GameError {
    GameError::invalid_action(player, action.to_string(), reason)
}

fn hand_card<'g>(game: &'g Game, player: PlayerId, action: &PlayerAction, id: CardId) -> Result<&'g CardRef> {
    game.player(player)
        .hand
        .get(id)
        .ok_or_else(|| reject(player, action, "card not in hand"))
}

fn own_pokemon(game: &Game, player: PlayerId, action: &PlayerAction, position: Position) -> Result<PokemonRef> {
    game.slot_ref(player, position)
        .ok_or_else(|| reject(player, action, format!("no Pokémon at {position}")))
}

/// Slot a newly played Pokémon goes to
fn open_slot(game: &Game, player: PlayerId) -> Option<Position> {
    let me = game.player(player);
    if me.active().is_none() {
        Some(Position::Active)
    } else {
        me.first_empty_bench()
    }
}

fn is_fossil(card: &Card) -> bool {
    card.as_trainer().is_some_and(|t| t.kind == TrainerKind::Fossil && t.fossil.is_some())
}

/// Check an action against the current state without changing anything
pub fn validate_action(game: &Game, player: PlayerId, action: &PlayerAction) -> Result<()> {
    let me = game.player(player);
    match *action {
        PlayerAction::PlayBasic(id) => {
            if !hand_card(game, player, action, id)?.card.is_basic_pokemon() {
                return Err(reject(player, action, "not a Basic Pokémon"));
            }
            open_slot(game, player).ok_or_else(|| reject(player, action, "bench is full"))?;
        }
        PlayerAction::Evolve { card, target } => {
            let evolution = hand_card(game, player, action, card)?
                .card
                .as_pokemon()
                .filter(|p| !p.is_basic())
                .ok_or_else(|| reject(player, action, "not an evolution card"))?;
            let target = own_pokemon(game, player, action, target)?;
            let pokemon = game.pokemon(&target).ok_or_else(|| reject(player, action, "target missing"))?;
            if !pokemon.evolve_ready {
                return Err(reject(player, action, format!("{} can't evolve this turn", pokemon.name())));
            }
            if !evolution.evolves_from_name(pokemon.name()) {
                return Err(reject(player, action, format!("{} doesn't evolve from {}", evolution.name, pokemon.name())));
            }
        }
        PlayerAction::AttachEnergy(target) => {
            if me.available_energy.is_none() {
                return Err(reject(player, action, "no energy available"));
            }
            own_pokemon(game, player, action, target)?;
        }
        PlayerAction::PlayTrainer(id) => {
            let trainer = hand_card(game, player, action, id)?
                .card
                .as_trainer()
                .ok_or_else(|| reject(player, action, "not a Trainer card"))?;
            match trainer.kind {
                TrainerKind::Supporter => {
                    if game.gates.supporter_used {
                        return Err(reject(player, action, "already played a Supporter this turn"));
                    }
                    if game.player_restricted(player, StatusKind::NoSupporters) {
                        return Err(reject(player, action, "Supporter cards are blocked"));
                    }
                }
                TrainerKind::Item => {
                    if game.player_restricted(player, StatusKind::NoItems) {
                        return Err(reject(player, action, "Item cards are blocked"));
                    }
                }
                kind => return Err(reject(player, action, format!("{kind} cards are not played this way"))),
            }
            let source = EffectSource::trainer(player, trainer.name.clone());
            if !trainer.effect.usable(game, &source) {
                return Err(reject(player, action, "conditions not met"));
            }
        }
        PlayerAction::AttachTool { card, target } => {
            let tool = hand_card(game, player, action, card)?
                .card
                .as_trainer()
                .filter(|t| t.kind == TrainerKind::PokemonTool)
                .ok_or_else(|| reject(player, action, "not a Pokémon Tool"))?;
            let target = own_pokemon(game, player, action, target)?;
            if game.pokemon(&target).is_some_and(|p| !p.tools.is_empty()) {
                return Err(reject(player, action, format!("{} already has a tool", tool.name)));
            }
        }
        PlayerAction::PlayFossil(id) => {
            if !is_fossil(&hand_card(game, player, action, id)?.card) {
                return Err(reject(player, action, "not a fossil"));
            }
            open_slot(game, player).ok_or_else(|| reject(player, action, "bench is full"))?;
        }
        PlayerAction::DiscardFossil(target) => {
            let target = own_pokemon(game, player, action, target)?;
            let fossil = game
                .pokemon(&target)
                .and_then(|p| p.cards.first())
                .is_some_and(|c| is_fossil(&c.card));
            if !fossil {
                return Err(reject(player, action, "not a fossil"));
            }
        }
        PlayerAction::Retreat(target) => {
            if game.gates.retreat_used {
                return Err(reject(player, action, "already retreated this turn"));
            }
            if target.is_active() {
                return Err(reject(player, action, "must retreat to a benched Pokémon"));
            }
            own_pokemon(game, player, action, target)?;
            let active = own_pokemon(game, player, action, Position::Active)?;
            let pokemon = game.pokemon(&active).ok_or_else(|| reject(player, action, "no active Pokémon"))?;
            if matches!(pokemon.primary, Some(PrimaryCondition::Asleep | PrimaryCondition::Paralyzed)) {
                return Err(reject(player, action, "active Pokémon is asleep or paralyzed"));
            }
            if game.has_status(&active, StatusKind::CannotRetreat) {
                return Err(reject(player, action, "active Pokémon can't retreat"));
            }
            if (game.effective_energy(&active).total() as usize) < game.retreat_cost(&active) {
                return Err(reject(player, action, "not enough energy to retreat"));
            }
        }
        PlayerAction::UseAbility(target) => {
            let target = own_pokemon(game, player, action, target)?;
            let pokemon = game.pokemon(&target).ok_or_else(|| reject(player, action, "target missing"))?;
            let ability = pokemon
                .card
                .ability
                .as_ref()
                .filter(|a| a.is_manual())
                .ok_or_else(|| reject(player, action, "no usable ability"))?;
            let once = matches!(ability.effect.trigger, Trigger::Manual { once_per_turn: true });
            if once && game.tracking.abilities_used.contains(&target.id) {
                return Err(reject(player, action, format!("{} was already used this turn", ability.name)));
            }
            let source = EffectSource::new(player, Some(target.id), pokemon.name().clone(), Origin::Ability(ability.name.clone()));
            if !ability.effect.usable(game, &source) {
                return Err(reject(player, action, "conditions not met"));
            }
        }
        PlayerAction::Attack(index) => {
            let active = own_pokemon(game, player, action, Position::Active)?;
            let attack = game
                .pokemon(&active)
                .and_then(|p| p.card.attacks.get(index))
                .ok_or_else(|| reject(player, action, "no such attack"))?;
            if let Some(reason) = attack_blocker(game, &active, attack) {
                return Err(reject(player, action, reason));
            }
        }
        PlayerAction::EndTurn => {}
    }
    Ok(())
}

/// Validate and carry out one action
pub fn execute_action(game: &mut Game, agents: Agents<'_>, player: PlayerId, action: PlayerAction) -> Result<()> {
    validate_action(game, player, &action)?;
    match action {
        PlayerAction::PlayBasic(id) => {
            let position = open_slot(game, player).ok_or_else(|| reject(player, &action, "bench is full"))?;
            let card = take_from_hand(game, player, &action, id)?;
            let placed = game.place_pokemon(player, position, card)?;
            enter_play(game, agents, &placed)
        }
        PlayerAction::Evolve { card, target } => evolve(game, agents, player, &action, card, target),
        PlayerAction::AttachEnergy(target) => {
            let target = own_pokemon(game, player, &action, target)?;
            let energy = game
                .player_mut(player)
                .available_energy
                .take()
                .ok_or_else(|| reject(player, &action, "no energy available"))?;
            attach_and_trigger(game, agents, &target, energy)
        }
        PlayerAction::PlayTrainer(id) => {
            let card = take_from_hand(game, player, &action, id)?;
            let trainer = card
                .card
                .as_trainer()
                .cloned()
                .ok_or_else(|| reject(player, &action, "not a Trainer card"))?;
            game.log(GameEvent::TrainerPlayed { player, card: trainer.name.clone(), kind: trainer.kind });
            let source = EffectSource::trainer(player, trainer.name.clone());
            match run_effect(game, agents, &trainer.effect, source, None) {
                Ok(()) => {
                    if trainer.kind == TrainerKind::Supporter {
                        game.gates.supporter_used = true;
                    }
                    game.player_mut(player).discard.add(card);
                    Ok(())
                }
                Err(err) => {
                    // A failed trainer stays playable
                    game.player_mut(player).hand.add(card);
                    Err(err)
                }
            }
        }
        PlayerAction::AttachTool { card, target } => {
            let target = own_pokemon(game, player, &action, target)?;
            let card = take_from_hand(game, player, &action, card)?;
            let tool = card
                .card
                .as_trainer()
                .cloned()
                .ok_or_else(|| reject(player, &action, "not a Pokémon Tool"))?;
            let holder = game
                .pokemon_mut(&target)
                .ok_or_else(|| reject(player, &action, "target missing"))?;
            holder.tools.push(card.clone());
            let holder_name = holder.name().clone();
            game.log(GameEvent::ToolAttached { player, tool: tool.name.clone(), pokemon: holder_name });
            let source = EffectSource::new(player, Some(target.id), tool.name.clone(), Origin::Tool(card.id));
            run_effect(game, agents, &tool.effect, source, None)
        }
        PlayerAction::PlayFossil(id) => {
            let position = open_slot(game, player).ok_or_else(|| reject(player, &action, "bench is full"))?;
            let card = take_from_hand(game, player, &action, id)?;
            let fossil = card
                .card
                .as_trainer()
                .cloned()
                .ok_or_else(|| reject(player, &action, "not a fossil"))?;
            game.log(GameEvent::TrainerPlayed { player, card: fossil.name.clone(), kind: fossil.kind });
            let placed = game.place_pokemon(player, position, card)?;
            let source = EffectSource::new(player, Some(placed.id), fossil.name.clone(), Origin::Trainer);
            run_effect(game, agents, &fossil.effect, source, None)
        }
        PlayerAction::DiscardFossil(target) => {
            let target = own_pokemon(game, player, &action, target)?;
            let name = game.pokemon(&target).map(|p| p.name().clone());
            game.discard_pokemon(&target);
            if let Some(card) = name {
                game.log(GameEvent::CardDiscarded { player, card });
            }
            Ok(())
        }
        PlayerAction::Retreat(target) => retreat(game, player, &action, target),
        PlayerAction::UseAbility(target) => {
            let target = own_pokemon(game, player, &action, target)?;
            let card = game
                .pokemon(&target)
                .map(|p| p.card.clone())
                .ok_or_else(|| reject(player, &action, "target missing"))?;
            let ability = card.ability.as_ref().ok_or_else(|| reject(player, &action, "no ability"))?;
            game.tracking.abilities_used.insert(target.id);
            game.log(GameEvent::AbilityUsed { player, pokemon: card.name.clone(), ability: ability.name.clone() });
            let source = EffectSource::new(player, Some(target.id), card.name.clone(), Origin::Ability(ability.name.clone()));
            run_effect(game, agents, &ability.effect, source, None)
        }
        PlayerAction::Attack(index) => resolve_attack(game, agents, player, index),
        PlayerAction::EndTurn => {
            game.signal_end_of_turn();
            Ok(())
        }
    }
}

fn take_from_hand(game: &mut Game, player: PlayerId, action: &PlayerAction, id: CardId) -> Result<CardRef> {
    game.player_mut(player)
        .hand
        .remove(id)
        .ok_or_else(|| reject(player, action, "card not in hand"))
}

/// Attach one energy and fire the holder's on-attach abilities
pub fn attach_and_trigger(game: &mut Game, agents: Agents<'_>, target: &PokemonRef, energy: EnergyType) -> Result<()> {
    game.attach_energy(target, energy);
    fire_triggers(
        game,
        agents,
        &[*target],
        |trigger| matches!(trigger, Trigger::OnEnergyAttach(filter) if filter.map_or(true, |f| f == energy)),
        None,
    )
}

fn evolve(game: &mut Game, agents: Agents<'_>, player: PlayerId, action: &PlayerAction, card: CardId, target: Position) -> Result<()> {
    let target = own_pokemon(game, player, action, target)?;
    let card = take_from_hand(game, player, action, card)?;
    let into = card
        .card
        .as_pokemon()
        .cloned()
        .ok_or_else(|| reject(player, action, "not an evolution card"))?;
    let pokemon = game
        .pokemon_mut(&target)
        .ok_or_else(|| reject(player, action, "target missing"))?;
    let from = pokemon.name().clone();
    pokemon.evolve(into.clone(), card);
    pokemon.evolve_ready = false;
    game.drop_ability_statuses(target.id);
    game.log(GameEvent::Evolved { player, from, to: into.name.clone(), position: target.position });
    enter_play(game, agents, &target)
}

fn retreat(game: &mut Game, player: PlayerId, action: &PlayerAction, target: Position) -> Result<()> {
    let active = own_pokemon(game, player, action, Position::Active)?;
    let cost = game.retreat_cost(&active);
    let doubled: Vec<EnergyType> = game
        .statuses_of(&active)
        .iter()
        .filter_map(|s| match s.kind {
            StatusKind::DoubleEnergy(energy) => Some(energy),
            _ => None,
        })
        .collect();

    let pokemon = game
        .pokemon_mut(&active)
        .ok_or_else(|| reject(player, action, "no active Pokémon"))?;
    let mut paid = 0;
    let mut discarded = Vec::new();
    while paid < cost {
        let Some(energy) = pokemon.remove_energy(None, 1).pop() else {
            break;
        };
        paid += if doubled.contains(&energy) { 2 } else { 1 };
        discarded.push(energy);
    }
    let from = pokemon.name().clone();
    if !discarded.is_empty() {
        game.log(GameEvent::EnergyDiscarded { player, pokemon: from.clone(), energy: discarded });
    }

    game.recover_all_conditions(&active);
    game.player_mut(player).swap_slots(Position::Active, target);
    game.gates.retreat_used = true;
    let to = game
        .player(player)
        .active()
        .map(|p| p.name().clone())
        .ok_or_else(|| GameError::InvalidState("retreat left the active spot empty".to_string()))?;
    game.log(GameEvent::Retreated { player, from, to });
    Ok(())
}
