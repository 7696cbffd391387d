//! Scripted agent for testing
//!
//! Follows predetermined queues: one list of actions per turn, and answers
//! for choices, distributions and confirmations. When a queue runs dry it
//! falls back to the zero agent's answer.

use crate::core::{CardRef, PlayerId, PokemonRef};
use crate::game::controller::{
    ChoiceOption, ChoiceRequest, DecisionAgent, DistributionRequest, GameView, SetupChoice,
};
use crate::game::zero_controller::{first_basics, ZeroAgent};
use crate::game::{PlayerAction, TurnContext};
use crate::Result;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Script {
    setup: Option<SetupChoice>,
    turns: VecDeque<Vec<PlayerAction>>,
    choices: VecDeque<ChoiceOption>,
    distributions: VecDeque<Vec<u32>>,
    confirms: VecDeque<bool>,
    shown: Vec<Vec<CardRef>>,
}

/// An agent that follows a predetermined script
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    script: Mutex<Script>,
    fallback: ZeroAgent,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_setup(self, choice: SetupChoice) -> Self {
        self.script().setup = Some(choice);
        self
    }

    /// Queue the actions for one turn; an `EndTurn` is implied at the end
    pub fn with_turn(self, actions: impl IntoIterator<Item = PlayerAction>) -> Self {
        self.script().turns.push_back(actions.into_iter().collect());
        self
    }

    pub fn with_choices(self, choices: impl IntoIterator<Item = ChoiceOption>) -> Self {
        self.script().choices.extend(choices);
        self
    }

    pub fn with_distribution(self, counts: Vec<u32>) -> Self {
        self.script().distributions.push_back(counts);
        self
    }

    pub fn with_confirms(self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.script().confirms.extend(answers);
        self
    }

    /// Scripted answers not consumed yet
    pub fn pending_choices(&self) -> usize {
        self.script().choices.len()
    }

    /// Every batch of cards this agent was shown
    pub fn shown(&self) -> Vec<Vec<CardRef>> {
        self.script().shown.clone()
    }
}

impl DecisionAgent for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    fn choose_setup(&self, _player: PlayerId, hand: &[CardRef]) -> SetupChoice {
        self.script().setup.take().unwrap_or_else(|| first_basics(hand))
    }

    fn play_turn(&self, turn: &mut TurnContext<'_>) -> Result<()> {
        let actions = self.script().turns.pop_front().unwrap_or_default();
        for action in actions {
            turn.perform(action)?;
        }
        if turn.is_closed() {
            return Ok(());
        }
        turn.end_turn()
    }

    fn choose_new_active(&self, view: &GameView<'_>, options: &[PokemonRef]) -> PokemonRef {
        match self.script().choices.pop_front() {
            Some(ChoiceOption::Pokemon(r)) => r,
            _ => self.fallback.choose_new_active(view, options),
        }
    }

    fn choose(&self, view: &GameView<'_>, request: &ChoiceRequest) -> ChoiceOption {
        let scripted = self.script().choices.pop_front();
        scripted.unwrap_or_else(|| self.fallback.choose(view, request))
    }

    fn distribute(&self, view: &GameView<'_>, request: &DistributionRequest) -> Vec<u32> {
        let scripted = self.script().distributions.pop_front();
        scripted.unwrap_or_else(|| self.fallback.distribute(view, request))
    }

    fn confirm(&self, _view: &GameView<'_>, _prompt: &str) -> bool {
        self.script().confirms.pop_front().unwrap_or(true)
    }

    fn acknowledge(&self, _view: &GameView<'_>, cards: &[CardRef]) {
        self.script().shown.push(cards.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;
    use crate::game::test_support::two_player_game;

    #[test]
    fn test_scripted_choices_then_fallback() {
        let game = two_player_game();
        let view = GameView::new(&game, PlayerId::FIRST);
        let agent = ScriptedAgent::new().with_choices([ChoiceOption::Card(CardId::new(2))]);
        let request = ChoiceRequest {
            prompt: "card".into(),
            options: vec![ChoiceOption::Card(CardId::new(1)), ChoiceOption::Card(CardId::new(2))],
        };
        assert_eq!(agent.choose(&view, &request), ChoiceOption::Card(CardId::new(2)));
        assert_eq!(agent.choose(&view, &request), ChoiceOption::Card(CardId::new(1)));
        assert_eq!(agent.pending_choices(), 0);
    }
}
