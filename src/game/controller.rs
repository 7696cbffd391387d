//! Decision agent trait and game view
//!
//! This module defines the interface between the engine and the agents
//! that make decisions for each player. The engine calls the agent when a
//! choice is needed and validates every answer against what was offered; an
//! answer outside the offered set is a contract violation.

use crate::core::{CardId, CardRef, InPlayPokemon, Player, PlayerId, PokemonRef, Position};
use crate::game::{Game, GameLogger, GameResult, TurnContext};
use crate::{GameError, Result};
use std::fmt;

/// One thing an agent can pick in response to a choice request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOption {
    Pokemon(PokemonRef),
    Card(CardId),
}

impl fmt::Display for ChoiceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceOption::Pokemon(r) => write!(f, "{} {}", r.owner, r.position),
            ChoiceOption::Card(id) => write!(f, "card {id}"),
        }
    }
}

/// Pick exactly one option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRequest {
    pub prompt: String,
    pub options: Vec<ChoiceOption>,
}

/// Split `amount` units among recipients; the answer has one count per recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRequest {
    pub prompt: String,
    pub amount: u32,
    pub recipients: Vec<PokemonRef>,
}

/// Opening placement chosen from the opening hand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupChoice {
    pub active: CardId,
    pub bench: Vec<CardId>,
}

/// Read-only view of the game for one player
pub struct GameView<'a> {
    game: &'a Game,
    player: PlayerId,
}

impl<'a> GameView<'a> {
    pub fn new(game: &'a Game, player: PlayerId) -> Self {
        GameView { game, player }
    }

    /// The player this view belongs to
    pub fn player_id(&self) -> PlayerId {
        self.player
    }

    pub fn game(&self) -> &'a Game {
        self.game
    }

    pub fn me(&self) -> &'a Player {
        self.game.player(self.player)
    }

    pub fn opponent(&self) -> &'a Player {
        self.game.player(self.player.opponent())
    }

    pub fn hand(&self) -> &'a [CardRef] {
        &self.me().hand.cards
    }

    pub fn turn(&self) -> u32 {
        self.game.turn
    }

    pub fn pokemon(&self, target: &PokemonRef) -> Option<&'a InPlayPokemon> {
        self.game.pokemon(target)
    }

    pub fn active(&self) -> Option<&'a InPlayPokemon> {
        self.me().slot(Position::Active)
    }

    pub fn opponent_active(&self) -> Option<&'a InPlayPokemon> {
        self.opponent().slot(Position::Active)
    }

    pub fn log(&self) -> &'a GameLogger {
        &self.game.logger
    }
}

/// Decision agent trait
///
/// Implement this trait to create AI players or connect a front end. Methods
/// take `&self` so that an agent can be asked for a choice while its own
/// turn routine is still running; agents keep mutable state behind a lock.
pub trait DecisionAgent: Send + Sync {
    /// Name used in logs and tournament reports
    fn name(&self) -> &str;

    /// Choose the opening active Pokémon and bench from the opening hand
    fn choose_setup(&self, player: PlayerId, hand: &[CardRef]) -> SetupChoice;

    /// Take a whole main phase through the restricted turn context
    ///
    /// Returning ends the turn. Actions attempted after the turn was ended by
    /// an attack or effect fail with `GameError::TurnEnded`.
    fn play_turn(&self, turn: &mut TurnContext<'_>) -> Result<()>;

    /// Pick a benched Pokémon to replace a knocked-out active
    fn choose_new_active(&self, view: &GameView<'_>, options: &[PokemonRef]) -> PokemonRef;

    fn choose(&self, view: &GameView<'_>, request: &ChoiceRequest) -> ChoiceOption;

    fn distribute(&self, view: &GameView<'_>, request: &DistributionRequest) -> Vec<u32>;

    /// Answer a yes/no question ("you may ...")
    fn confirm(&self, _view: &GameView<'_>, _prompt: &str) -> bool {
        true
    }

    /// Cards were shown to this player
    fn acknowledge(&self, _view: &GameView<'_>, _cards: &[CardRef]) {}

    fn on_game_end(&self, _view: &GameView<'_>, _result: &GameResult) {}
}

/// The two seats' agents, indexed by `PlayerId::index`
pub type Agents<'a> = [&'a dyn DecisionAgent; 2];

/// Ask for one option; single-option requests are answered without asking
pub fn request_choice(
    agent: &dyn DecisionAgent,
    game: &Game,
    player: PlayerId,
    request: &ChoiceRequest,
) -> Result<Option<ChoiceOption>> {
    match request.options.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        options => {
            let answer = agent.choose(&GameView::new(game, player), request);
            if !options.contains(&answer) {
                return Err(GameError::contract(
                    player,
                    request.prompt.clone(),
                    format!("{answer} was not offered"),
                ));
            }
            Ok(Some(answer))
        }
    }
}

pub fn request_new_active(
    agent: &dyn DecisionAgent,
    game: &Game,
    player: PlayerId,
    options: &[PokemonRef],
) -> Result<Option<PokemonRef>> {
    match options {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        _ => {
            let answer = agent.choose_new_active(&GameView::new(game, player), options);
            if !options.contains(&answer) {
                return Err(GameError::contract(
                    player,
                    "new active",
                    format!("{} {} was not offered", answer.owner, answer.position),
                ));
            }
            Ok(Some(answer))
        }
    }
}

pub fn request_distribution(
    agent: &dyn DecisionAgent,
    game: &Game,
    player: PlayerId,
    request: &DistributionRequest,
) -> Result<Vec<u32>> {
    if request.recipients.len() == 1 {
        return Ok(vec![request.amount]);
    }
    let answer = agent.distribute(&GameView::new(game, player), request);
    if answer.len() != request.recipients.len() {
        return Err(GameError::contract(
            player,
            request.prompt.clone(),
            format!("{} counts for {} recipients", answer.len(), request.recipients.len()),
        ));
    }
    let total: u32 = answer.iter().sum();
    if total != request.amount {
        return Err(GameError::contract(
            player,
            request.prompt.clone(),
            format!("distributed {total} of {}", request.amount),
        ));
    }
    Ok(answer)
}

/// Check an opening placement against the hand it was chosen from
pub fn validate_setup(player: PlayerId, hand: &[CardRef], choice: &SetupChoice, bench_slots: usize) -> Result<()> {
    let is_basic_in_hand = |id: &CardId| hand.iter().any(|c| c.id == *id && c.card.is_basic_pokemon());
    if !is_basic_in_hand(&choice.active) {
        return Err(GameError::contract(player, "setup", "active is not a Basic Pokémon in hand"));
    }
    if choice.bench.len() > bench_slots {
        return Err(GameError::contract(
            player,
            "setup",
            format!("{} benched Pokémon for {bench_slots} slots", choice.bench.len()),
        ));
    }
    let mut seen = vec![choice.active];
    for id in &choice.bench {
        if seen.contains(id) || !is_basic_in_hand(id) {
            return Err(GameError::contract(player, "setup", format!("bench card {id} is not a distinct Basic in hand")));
        }
        seen.push(*id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::{basic, card_ref, two_player_game};
    use crate::game::ScriptedAgent;

    #[test]
    fn test_single_option_skips_agent() {
        let game = two_player_game();
        let agent = ScriptedAgent::new().with_choices([ChoiceOption::Card(CardId::new(2))]);
        let request = ChoiceRequest {
            prompt: "pick".into(),
            options: vec![ChoiceOption::Card(CardId::new(1))],
        };
        let answer = request_choice(&agent, &game, PlayerId::FIRST, &request).unwrap();
        assert_eq!(answer, Some(ChoiceOption::Card(CardId::new(1))));

        let empty = ChoiceRequest { prompt: "pick".into(), options: vec![] };
        assert_eq!(request_choice(&agent, &game, PlayerId::FIRST, &empty).unwrap(), None);
        assert_eq!(agent.pending_choices(), 1);
    }

    #[test]
    fn test_out_of_set_choice_is_contract_violation() {
        let game = two_player_game();
        let agent = ScriptedAgent::new().with_choices([ChoiceOption::Card(CardId::new(9))]);
        let request = ChoiceRequest {
            prompt: "pick".into(),
            options: vec![ChoiceOption::Card(CardId::new(1)), ChoiceOption::Card(CardId::new(2))],
        };
        let err = request_choice(&agent, &game, PlayerId::FIRST, &request).unwrap_err();
        assert!(matches!(err, GameError::ContractViolation { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_setup_validation() {
        let mut game = two_player_game();
        let a = card_ref(&mut game, basic("Charmander", 60));
        let b = card_ref(&mut game, basic("Vulpix", 50));
        let hand = vec![a.clone(), b.clone()];

        let ok = SetupChoice { active: a.id, bench: vec![b.id] };
        assert!(validate_setup(PlayerId::FIRST, &hand, &ok, 3).is_ok());

        let duplicate = SetupChoice { active: a.id, bench: vec![a.id] };
        assert!(validate_setup(PlayerId::FIRST, &hand, &duplicate, 3).is_err());

        let missing = SetupChoice { active: CardId::new(999), bench: vec![] };
        assert!(validate_setup(PlayerId::FIRST, &hand, &missing, 3).is_err());
    }
}
