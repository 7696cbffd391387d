//! Zero agent for testing
//!
//! Always picks the first option. On its turn it attaches energy to the
//! active Pokémon, attacks with the first usable attack, and otherwise ends
//! the turn.

use crate::core::{CardId, CardRef, PlayerId, PokemonRef, Position};
use crate::game::controller::{
    ChoiceOption, ChoiceRequest, DecisionAgent, DistributionRequest, GameView, SetupChoice,
};
use crate::game::{PlayerAction, TurnContext};
use crate::Result;

/// An agent that always chooses the first available option
#[derive(Debug, Clone, Default)]
pub struct ZeroAgent;

impl ZeroAgent {
    pub fn new() -> Self {
        ZeroAgent
    }
}

/// First Basic Pokémon as active, the next ones on the bench
pub(crate) fn first_basics(hand: &[CardRef]) -> SetupChoice {
    let mut basics = hand.iter().filter(|c| c.card.is_basic_pokemon()).map(|c| c.id);
    let active = basics
        .next()
        .or_else(|| hand.first().map(|c| c.id))
        .unwrap_or(CardId::new(0));
    SetupChoice {
        active,
        bench: basics.take(Position::all().len() - 1).collect(),
    }
}

impl DecisionAgent for ZeroAgent {
    fn name(&self) -> &str {
        "zero"
    }

    fn choose_setup(&self, _player: PlayerId, hand: &[CardRef]) -> SetupChoice {
        first_basics(hand)
    }

    fn play_turn(&self, turn: &mut TurnContext<'_>) -> Result<()> {
        let actions = turn.available_actions();
        if actions.contains(&PlayerAction::AttachEnergy(Position::Active)) {
            turn.perform(PlayerAction::AttachEnergy(Position::Active))?;
        }
        let attack = turn
            .available_actions()
            .into_iter()
            .find(|action| matches!(action, PlayerAction::Attack(_)));
        match attack {
            Some(attack) => turn.perform(attack),
            None if turn.is_closed() => Ok(()),
            None => turn.end_turn(),
        }
    }

    fn choose_new_active(&self, _view: &GameView<'_>, options: &[PokemonRef]) -> PokemonRef {
        options[0]
    }

    fn choose(&self, _view: &GameView<'_>, request: &ChoiceRequest) -> ChoiceOption {
        request.options[0]
    }

    fn distribute(&self, _view: &GameView<'_>, request: &DistributionRequest) -> Vec<u32> {
        let mut counts = vec![0; request.recipients.len()];
        if let Some(first) = counts.first_mut() {
            *first = request.amount;
        }
        counts
    }
}
