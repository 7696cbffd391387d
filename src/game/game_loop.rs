//! Game loop implementation
//!
//! Runs setup, then turns until a win condition, the turn limit, or an
//! unrecoverable state ends the match.

use crate::core::{CardRef, PlayerId, PokemonRef, Position};
use crate::game::checkup::run_checkup;
use crate::game::context::enter_play;
use crate::game::controller::{validate_setup, Agents, GameView};
use crate::game::{
    Game, GameEvent, OutputFormat, OutputMode, TurnContext, TurnGates, TurnPhase, TurnTracking,
    VerbosityLevel,
};
use crate::{GameError, Result};
use std::fmt;

/// Result of running a game to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// Winner of the game (None on a draw)
    pub winner: Option<PlayerId>,
    /// Total number of turns played
    pub turns_played: u32,
    /// Reason the game ended
    pub end_reason: GameEndReason,
    /// Win conditions met by each player when the game ended
    pub conditions: [u32; 2],
}

/// Reason the game ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEndReason {
    /// Decided by counting win conditions (a tie is a draw)
    Conditions,
    /// Game reached the turn limit
    TurnLimit,
    /// The game could not continue
    InvalidState(String),
}

impl fmt::Display for GameEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEndReason::Conditions => write!(f, "win conditions"),
            GameEndReason::TurnLimit => write!(f, "turn limit"),
            GameEndReason::InvalidState(reason) => write!(f, "invalid state: {reason}"),
        }
    }
}

/// Game loop manager
pub struct GameLoop<'a> {
    /// The game state
    pub game: &'a mut Game,
    agents: Agents<'a>,
}

impl<'a> GameLoop<'a> {
    pub fn new(game: &'a mut Game, agents: Agents<'a>) -> Self {
        GameLoop { game, agents }
    }

    pub fn with_verbosity(self, verbosity: VerbosityLevel) -> Self {
        self.game.logger.set_verbosity(verbosity);
        self
    }

    pub fn with_output_mode(self, mode: OutputMode) -> Self {
        self.game.logger.set_output_mode(mode);
        self
    }

    pub fn with_output_format(self, format: OutputFormat) -> Self {
        self.game.logger.set_output_format(format);
        self
    }

    /// Run setup and then turns until the game ends
    ///
    /// An invalid state ends the match as a draw; a contract violation by an
    /// agent is returned as an error.
    pub fn run_game(&mut self) -> Result<GameResult> {
        if self.game.phase == TurnPhase::Setup {
            let setup = self.setup();
            self.absorb_invalid_state(setup)?;
        }
        while !self.game.is_over() {
            let turn = self.run_turn_once();
            self.absorb_invalid_state(turn)?;
        }
        let result = self
            .game
            .result()
            .cloned()
            .ok_or_else(|| GameError::InvalidState("game loop stopped without a result".to_string()))?;
        for player in PlayerId::both() {
            let view = GameView::new(self.game, player);
            self.agents[player.index()].on_game_end(&view, &result);
        }
        Ok(result)
    }

    fn absorb_invalid_state(&mut self, outcome: Result<()>) -> Result<()> {
        match outcome {
            Err(GameError::InvalidState(reason)) => {
                let turns_played = self.game.turn;
                self.game.finish(GameResult {
                    winner: None,
                    turns_played,
                    end_reason: GameEndReason::InvalidState(reason),
                    conditions: [0, 0],
                });
                Ok(())
            }
            other => other,
        }
    }

    /// Deal opening hands, collect both setup choices, decide who goes first
    pub fn setup(&mut self) -> Result<()> {
        for player in PlayerId::both() {
            self.deal_opening_hand(player)?;
        }

        let hands: [Vec<CardRef>; 2] = [
            self.game.player(PlayerId::FIRST).hand.cards.clone(),
            self.game.player(PlayerId::SECOND).hand.cards.clone(),
        ];
        let [first_agent, second_agent] = self.agents;
        let choices = rayon::join(
            || first_agent.choose_setup(PlayerId::FIRST, &hands[0]),
            || second_agent.choose_setup(PlayerId::SECOND, &hands[1]),
        );

        let bench_slots = Position::all().len() - 1;
        let mut placed: [Vec<PokemonRef>; 2] = [Vec::new(), Vec::new()];
        for (player, choice) in [(PlayerId::FIRST, choices.0), (PlayerId::SECOND, choices.1)] {
            validate_setup(player, &hands[player.index()], &choice, bench_slots)?;
            let active = self.take_card(player, choice.active)?;
            let active_name = active.name().clone();
            placed[player.index()].push(self.game.place_pokemon(player, Position::Active, active)?);
            let mut bench = Vec::new();
            for (slot, id) in choice.bench.iter().enumerate() {
                let card = self.take_card(player, *id)?;
                bench.push(card.name().clone());
                placed[player.index()].push(self.game.place_pokemon(player, Position::Bench(slot as u8), card)?);
            }
            self.game.log(GameEvent::SetupPlaced { player, active: active_name, bench });
        }

        let first = if self.game.flip_coin(PlayerId::FIRST) {
            PlayerId::FIRST
        } else {
            PlayerId::SECOND
        };
        self.game.attacking = first;
        let players = [
            self.game.player(PlayerId::FIRST).name.to_string(),
            self.game.player(PlayerId::SECOND).name.to_string(),
        ];
        self.game.log(GameEvent::GameStarted { players, first });

        // Opening Pokémon enter play like any other
        for player in [first, first.opponent()] {
            for target in &placed[player.index()] {
                enter_play(self.game, self.agents, target)?;
            }
        }

        for player in PlayerId::both() {
            let next = self.game.roll_energy(player);
            self.game.player_mut(player).next_energy = next;
        }
        self.game.phase = TurnPhase::Draw;
        Ok(())
    }

    fn take_card(&mut self, player: PlayerId, id: crate::core::CardId) -> Result<CardRef> {
        self.game
            .player_mut(player)
            .hand
            .remove(id)
            .ok_or_else(|| GameError::contract(player, "setup", format!("card {id} is not in hand")))
    }

    /// Shuffle and draw until the opening hand holds a Basic Pokémon
    fn deal_opening_hand(&mut self, player: PlayerId) -> Result<()> {
        let has_basic = self.game.player(player).deck.iter().any(|c| c.card.is_basic_pokemon());
        if !has_basic {
            return Err(GameError::InvalidState(format!("{player}'s deck has no Basic Pokémon")));
        }
        let size = self.game.rules.opening_hand;
        loop {
            self.game.shuffle_deck(player);
            self.game.draw_many(player, size);
            if self.game.player(player).hand.iter().any(|c| c.card.is_basic_pokemon()) {
                return Ok(());
            }
            let p = self.game.player_mut(player);
            for card in p.hand.take_all() {
                p.deck.add(card);
            }
        }
    }

    /// Play one full turn for the attacking player
    pub fn run_turn_once(&mut self) -> Result<()> {
        if self.game.is_over() {
            return Ok(());
        }
        self.begin_turn();
        let player = self.game.attacking;

        self.game.draw(player);

        self.game.phase = TurnPhase::Main;
        let agent = self.agents[player.index()];
        let outcome = {
            let mut turn = TurnContext::new(self.game, self.agents, player);
            agent.play_turn(&mut turn)
        };
        match outcome {
            Ok(()) | Err(GameError::TurnEnded) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => self.game.log(GameEvent::TurnError { player, error: err.to_string() }),
        }
        if self.game.is_over() {
            return Ok(());
        }

        self.game.phase = TurnPhase::AttackOrEnd;
        if let Some(energy) = self.game.player_mut(player).available_energy.take() {
            self.game.log(GameEvent::UnusedEnergyDiscarded { player, energy });
        }
        let turn = self.game.turn;
        self.game.log(GameEvent::TurnEnded { turn, player });

        run_checkup(self.game, self.agents)?;

        if !self.game.is_over() && self.game.turn >= self.game.rules.turn_limit {
            self.game.finish(GameResult {
                winner: None,
                turns_played: turn,
                end_reason: GameEndReason::TurnLimit,
                conditions: [0, 0],
            });
        }
        Ok(())
    }

    fn begin_turn(&mut self) {
        if self.game.turn > 0 {
            self.game.attacking = self.game.attacking.opponent();
        }
        self.game.turn += 1;
        self.game.gates = TurnGates::default();
        self.game.tracking = TurnTracking::default();
        self.game.clear_end_signal();
        self.game.logger.begin_turn();
        self.game.phase = TurnPhase::Draw;

        let (turn, player) = (self.game.turn, self.game.attacking);
        self.game.log(GameEvent::TurnStarted { turn, player });

        if turn >= 3 {
            for pokemon in self.game.player_mut(player).field.iter_mut().flatten() {
                pokemon.evolve_ready = true;
            }
        }

        if turn > 1 {
            let next = self.game.roll_energy(player);
            let p = self.game.player_mut(player);
            p.available_energy = p.next_energy.take();
            p.next_energy = next;
            let available = p.available_energy;
            self.game.log(GameEvent::EnergyGenerated { player, available, next });
        }
    }
}
