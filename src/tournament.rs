//! Tournament mode for running many games in parallel and collecting statistics
//!
//! Games are independent, so they run on rayon's pool. Every game draws its
//! decks and seeds from a per-game xoshiro stream derived from the master
//! seed, which makes a tournament reproducible regardless of scheduling.

use crate::game::{DecisionAgent, Game, GameLoop, GameResult, RandomAgent, RulesConfig, VerbosityLevel, ZeroAgent};
use crate::loader::DeckSpec;
use crate::{GameError, Result};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Agent type for tournament games
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AgentKind {
    /// Always chooses the first option
    Zero,
    /// Makes seeded random choices
    Random,
}

impl AgentKind {
    pub fn build(self, seed: u64) -> Box<dyn DecisionAgent> {
        match self {
            AgentKind::Zero => Box::new(ZeroAgent::new()),
            AgentKind::Random => Box::new(RandomAgent::with_seed(seed)),
        }
    }
}

/// Win/loss record of one deck across the tournament
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeckRecord {
    pub games: usize,
    pub wins: usize,
}

/// Statistics collected during a tournament
#[derive(Debug, Clone, Default)]
pub struct TourneyReport {
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub draws: usize,
    /// Games that stopped on an error instead of a result
    pub failed: usize,
    pub total_turns: u64,
    pub decks: BTreeMap<String, DeckRecord>,
    pub elapsed: Duration,
}

impl TourneyReport {
    pub fn games_played(&self) -> usize {
        self.p1_wins + self.p2_wins + self.draws
    }

    pub fn average_turns(&self) -> f64 {
        match self.games_played() {
            0 => 0.0,
            n => self.total_turns as f64 / n as f64,
        }
    }

    pub fn games_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.games_played() as f64 / secs
        } else {
            0.0
        }
    }

    fn record(&mut self, decks: [&str; 2], result: &GameResult) {
        for name in decks {
            self.decks.entry(name.to_string()).or_default().games += 1;
        }
        self.total_turns += u64::from(result.turns_played);
        match result.winner {
            Some(winner) => {
                if winner.index() == 0 {
                    self.p1_wins += 1;
                } else {
                    self.p2_wins += 1;
                }
                self.decks.entry(decks[winner.index()].to_string()).or_default().wins += 1;
            }
            None => self.draws += 1,
        }
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

impl fmt::Display for TourneyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.games_played();
        writeln!(f, "=== Tournament Complete ===")?;
        writeln!(f, "Total games played: {total}")?;
        if self.failed > 0 {
            writeln!(f, "Failed games: {}", self.failed)?;
        }
        writeln!(f, "Elapsed time: {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "Games per second: {:.2}", self.games_per_second())?;
        writeln!(f, "Average turns: {:.1}", self.average_turns())?;
        writeln!(f)?;
        writeln!(f, "=== Player Position Statistics ===")?;
        writeln!(f, "P1 wins: {} ({:.1}%)", self.p1_wins, percent(self.p1_wins, total))?;
        writeln!(f, "P2 wins: {} ({:.1}%)", self.p2_wins, percent(self.p2_wins, total))?;
        writeln!(f, "Draws: {} ({:.1}%)", self.draws, percent(self.draws, total))?;
        writeln!(f)?;
        writeln!(f, "=== Deck Win Rates ===")?;
        for (name, record) in &self.decks {
            writeln!(
                f,
                "  {name}: {}/{} ({:.1}%)",
                record.wins,
                record.games,
                percent(record.wins, record.games)
            )?;
        }
        Ok(())
    }
}

/// Play one seeded game between two decks
pub fn play_game(
    decks: [&DeckSpec; 2],
    agents: [AgentKind; 2],
    rules: &RulesConfig,
    seed: u64,
) -> Result<GameResult> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let game_seed: u64 = rng.gen();
    let seats = [
        decks[0].clone().into_seat("Player 1"),
        decks[1].clone().into_seat("Player 2"),
    ];
    let mut game = Game::new(seats, rules.clone(), game_seed);
    let first = agents[0].build(rng.gen());
    let second = agents[1].build(rng.gen());

    let mut game_loop = GameLoop::new(&mut game, [&*first, &*second]).with_verbosity(VerbosityLevel::Silent);
    game_loop.run_game()
}

/// Play `games` matches between random pairings of `decks`
pub fn run_tourney(
    decks: &[DeckSpec],
    games: usize,
    agents: [AgentKind; 2],
    rules: &RulesConfig,
    seed: u64,
) -> Result<TourneyReport> {
    if decks.is_empty() {
        return Err(GameError::DeckError("tournament requires at least one deck".to_string()));
    }
    if games == 0 {
        return Err(GameError::InvalidState("tournament requires at least one game".to_string()));
    }

    let start = Instant::now();
    let outcomes: Vec<_> = (0..games)
        .into_par_iter()
        .map(|game_idx| {
            let mut pairing = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(game_idx as u64));
            let first = pairing.gen_range(0..decks.len());
            let second = pairing.gen_range(0..decks.len());
            let outcome = play_game([&decks[first], &decks[second]], agents, rules, pairing.gen());
            (game_idx, first, second, outcome)
        })
        .collect();

    let mut report = TourneyReport::default();
    for (game_idx, first, second, outcome) in outcomes {
        match outcome {
            Ok(result) => report.record([&decks[first].name, &decks[second].name], &result),
            Err(e) => {
                eprintln!("Warning: Game {game_idx} failed: {e}");
                report.failed += 1;
            }
        }
    }
    report.elapsed = start.elapsed();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, EnergyType};
    use crate::game::test_support::{basic, with_attack};
    use std::sync::Arc;

    fn deck(name: &str) -> DeckSpec {
        let rattata = Card::Pokemon(Arc::new(with_attack(basic("Rattata", 40), "Tackle", &[EnergyType::Colorless], 20)));
        DeckSpec {
            name: name.to_string(),
            energy_types: vec![EnergyType::Lightning],
            cards: vec![rattata; 20],
        }
    }

    #[test]
    fn test_tourney_is_reproducible() {
        let decks = vec![deck("alpha"), deck("beta")];
        let rules = RulesConfig::default();
        let a = run_tourney(&decks, 8, [AgentKind::Random, AgentKind::Random], &rules, 7).unwrap();
        let b = run_tourney(&decks, 8, [AgentKind::Random, AgentKind::Random], &rules, 7).unwrap();

        assert_eq!(a.games_played() + a.failed, 8);
        assert_eq!((a.p1_wins, a.p2_wins, a.draws), (b.p1_wins, b.p2_wins, b.draws));
        assert_eq!(a.total_turns, b.total_turns);
        let seats: usize = a.decks.values().map(|r| r.games).sum();
        assert_eq!(seats, 2 * a.games_played());
    }

    #[test]
    fn test_tourney_needs_decks() {
        let rules = RulesConfig::default();
        assert!(run_tourney(&[], 4, [AgentKind::Zero, AgentKind::Zero], &rules, 1).is_err());
        assert!(run_tourney(&[deck("alpha")], 0, [AgentKind::Zero, AgentKind::Zero], &rules, 1).is_err());
    }
}
