//! Random agent for testing and baseline gameplay
//!
//! Makes uniform random choices among whatever is offered. Serves as a
//! baseline for tournaments and as a fuzzer for the engine.

use crate::core::{CardRef, PlayerId, PokemonRef, Position};
use crate::game::controller::{
    ChoiceOption, ChoiceRequest, DecisionAgent, DistributionRequest, GameView, SetupChoice,
};
use crate::game::{PlayerAction, TurnContext};
use crate::Result;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::sync::{Mutex, MutexGuard};

/// Upper bound on actions per turn, so repeatable abilities cannot loop forever
const MAX_ACTIONS_PER_TURN: usize = 64;

/// An agent that makes random choices
pub struct RandomAgent {
    rng: Mutex<ChaCha12Rng>,
}

impl RandomAgent {
    /// Create a random agent with a seeded RNG (for deterministic testing)
    pub fn with_seed(seed: u64) -> Self {
        RandomAgent {
            rng: Mutex::new(ChaCha12Rng::seed_from_u64(seed)),
        }
    }

    fn rng(&self) -> MutexGuard<'_, ChaCha12Rng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DecisionAgent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_setup(&self, _player: PlayerId, hand: &[CardRef]) -> SetupChoice {
        let mut rng = self.rng();
        let mut basics: Vec<_> = hand.iter().filter(|c| c.card.is_basic_pokemon()).map(|c| c.id).collect();
        basics.shuffle(&mut *rng);
        let Some(active) = basics.pop() else {
            return super::zero_controller::first_basics(hand);
        };
        let bench_count = rng.gen_range(0..=basics.len().min(Position::all().len() - 1));
        basics.truncate(bench_count);
        SetupChoice { active, bench: basics }
    }

    fn play_turn(&self, turn: &mut TurnContext<'_>) -> Result<()> {
        for _ in 0..MAX_ACTIONS_PER_TURN {
            let actions = turn.available_actions();
            if actions.is_empty() {
                return Ok(());
            }
            let index = self.rng().gen_range(0..actions.len());
            match turn.perform(actions[index]) {
                Err(err) if err.is_fatal() => return Err(err),
                _ => {}
            }
            if turn.is_closed() {
                return Ok(());
            }
        }
        turn.perform(PlayerAction::EndTurn)
    }

    fn choose_new_active(&self, _view: &GameView<'_>, options: &[PokemonRef]) -> PokemonRef {
        options[self.rng().gen_range(0..options.len())]
    }

    fn choose(&self, _view: &GameView<'_>, request: &ChoiceRequest) -> ChoiceOption {
        request.options[self.rng().gen_range(0..request.options.len())]
    }

    fn distribute(&self, _view: &GameView<'_>, request: &DistributionRequest) -> Vec<u32> {
        let mut counts = vec![0; request.recipients.len()];
        if counts.is_empty() {
            return counts;
        }
        let mut rng = self.rng();
        for _ in 0..request.amount {
            let index = rng.gen_range(0..counts.len());
            counts[index] += 1;
        }
        counts
    }

    fn confirm(&self, _view: &GameView<'_>, _prompt: &str) -> bool {
        self.rng().gen_bool(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::{basic, card_ref, two_player_game};

    #[test]
    fn test_random_setup_is_valid() {
        let mut game = two_player_game();
        let hand: Vec<CardRef> = ["Pikachu", "Abra", "Ekans", "Onix", "Zubat"]
            .into_iter()
            .map(|name| card_ref(&mut game, basic(name, 50)))
            .collect();
        let agent = RandomAgent::with_seed(42);
        for _ in 0..20 {
            let choice = agent.choose_setup(PlayerId::FIRST, &hand);
            crate::game::controller::validate_setup(PlayerId::FIRST, &hand, &choice, 3).unwrap();
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let game = two_player_game();
        let view = GameView::new(&game, PlayerId::FIRST);
        let request = DistributionRequest {
            prompt: "split".into(),
            amount: 5,
            recipients: vec![
                PokemonRef { owner: PlayerId::FIRST, position: Position::Active, id: crate::core::EntityId::new(1) },
                PokemonRef { owner: PlayerId::FIRST, position: Position::Bench(0), id: crate::core::EntityId::new(2) },
            ],
        };
        let a = RandomAgent::with_seed(9).distribute(&view, &request);
        let b = RandomAgent::with_seed(9).distribute(&view, &request);
        assert_eq!(a, b);
        assert_eq!(a.iter().sum::<u32>(), 5);
    }
}
