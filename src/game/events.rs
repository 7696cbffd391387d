//! Typed game events
//!
//! Every observable occurrence is one variant. The log is the only way for
//! anything outside the engine to learn what happened.

use crate::core::{CardName, EnergyType, PlayerId, Position, SpecialCondition, TrainerKind};
use crate::game::VerbosityLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a draw did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawSkip {
    DeckEmpty,
    HandFull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        players: [String; 2],
        first: PlayerId,
    },
    SetupPlaced {
        player: PlayerId,
        active: CardName,
        bench: Vec<CardName>,
    },
    TurnStarted {
        turn: u32,
        player: PlayerId,
    },
    EnergyGenerated {
        player: PlayerId,
        available: Option<EnergyType>,
        next: Option<EnergyType>,
    },
    Drew {
        player: PlayerId,
        card: CardName,
    },
    DrawSkipped {
        player: PlayerId,
        reason: DrawSkip,
    },
    DeckShuffled {
        player: PlayerId,
    },
    PokemonPlayed {
        player: PlayerId,
        pokemon: CardName,
        position: Position,
    },
    Evolved {
        player: PlayerId,
        from: CardName,
        to: CardName,
        position: Position,
    },
    EnergyAttached {
        player: PlayerId,
        pokemon: CardName,
        energy: EnergyType,
    },
    EnergyDiscarded {
        player: PlayerId,
        pokemon: CardName,
        energy: Vec<EnergyType>,
    },
    UnusedEnergyDiscarded {
        player: PlayerId,
        energy: EnergyType,
    },
    TrainerPlayed {
        player: PlayerId,
        card: CardName,
        kind: TrainerKind,
    },
    ToolAttached {
        player: PlayerId,
        tool: CardName,
        pokemon: CardName,
    },
    AbilityUsed {
        player: PlayerId,
        pokemon: CardName,
        ability: String,
    },
    Retreated {
        player: PlayerId,
        from: CardName,
        to: CardName,
    },
    Switched {
        player: PlayerId,
        from: Option<CardName>,
        to: CardName,
    },
    AttackDeclared {
        player: PlayerId,
        pokemon: CardName,
        attack: String,
    },
    AttackFailed {
        player: PlayerId,
        pokemon: CardName,
        attack: String,
        reason: String,
    },
    CoinFlipped {
        player: PlayerId,
        heads: bool,
    },
    Damaged {
        player: PlayerId,
        pokemon: CardName,
        amount: i32,
        hp_after: i32,
        by_attack: bool,
    },
    DamagePrevented {
        player: PlayerId,
        pokemon: CardName,
    },
    Healed {
        player: PlayerId,
        pokemon: CardName,
        amount: i32,
    },
    ConditionApplied {
        player: PlayerId,
        pokemon: CardName,
        condition: SpecialCondition,
    },
    ConditionRecovered {
        player: PlayerId,
        pokemon: CardName,
        condition: SpecialCondition,
    },
    StatusGranted {
        player: PlayerId,
        pokemon: Option<CardName>,
        status: String,
    },
    StatusExpired {
        player: PlayerId,
        pokemon: Option<CardName>,
        status: String,
    },
    CardToHand {
        player: PlayerId,
        card: CardName,
    },
    CardDiscarded {
        player: PlayerId,
        card: CardName,
    },
    CardsShown {
        viewer: PlayerId,
        owner: PlayerId,
        cards: Vec<CardName>,
    },
    KnockedOut {
        player: PlayerId,
        pokemon: CardName,
        prize_value: u32,
    },
    PrizeAwarded {
        player: PlayerId,
        points: u32,
        total: u32,
    },
    ActivePromoted {
        player: PlayerId,
        pokemon: CardName,
    },
    UnsupportedEffect {
        player: PlayerId,
        card: CardName,
        text: String,
    },
    TurnError {
        player: PlayerId,
        error: String,
    },
    TurnEnded {
        turn: u32,
        player: PlayerId,
    },
    GameOver {
        winner: Option<PlayerId>,
        reason: String,
    },
}

impl GameEvent {
    /// Lowest verbosity at which the event is echoed
    pub fn level(&self) -> VerbosityLevel {
        match self {
            GameEvent::GameStarted { .. } | GameEvent::GameOver { .. } => VerbosityLevel::Minimal,
            GameEvent::TurnStarted { .. }
            | GameEvent::SetupPlaced { .. }
            | GameEvent::PokemonPlayed { .. }
            | GameEvent::Evolved { .. }
            | GameEvent::EnergyAttached { .. }
            | GameEvent::TrainerPlayed { .. }
            | GameEvent::ToolAttached { .. }
            | GameEvent::AbilityUsed { .. }
            | GameEvent::Retreated { .. }
            | GameEvent::Switched { .. }
            | GameEvent::AttackDeclared { .. }
            | GameEvent::AttackFailed { .. }
            | GameEvent::Damaged { .. }
            | GameEvent::DamagePrevented { .. }
            | GameEvent::Healed { .. }
            | GameEvent::ConditionApplied { .. }
            | GameEvent::KnockedOut { .. }
            | GameEvent::PrizeAwarded { .. }
            | GameEvent::ActivePromoted { .. }
            | GameEvent::TurnError { .. } => VerbosityLevel::Normal,
            _ => VerbosityLevel::Verbose,
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::GameStarted { players, first } => {
                write!(f, "Game start: {} vs {}, {first} goes first", players[0], players[1])
            }
            GameEvent::SetupPlaced { player, active, bench } => {
                write!(f, "{player} sets up {active} active")?;
                if !bench.is_empty() {
                    let names: Vec<&str> = bench.iter().map(|n| n.as_str()).collect();
                    write!(f, ", bench: {}", names.join(", "))?;
                }
                Ok(())
            }
            GameEvent::TurnStarted { turn, player } => write!(f, "--- Turn {turn} ({player}) ---"),
            GameEvent::EnergyGenerated { player, available, next } => {
                let show = |e: &Option<EnergyType>| e.map_or("none".to_string(), |e| e.to_string());
                write!(f, "{player} energy: {} (next {})", show(available), show(next))
            }
            GameEvent::Drew { player, card } => write!(f, "{player} draws {card}"),
            GameEvent::DrawSkipped { player, reason } => write!(f, "{player} skips draw ({reason:?})"),
            GameEvent::DeckShuffled { player } => write!(f, "{player} shuffles their deck"),
            GameEvent::PokemonPlayed { player, pokemon, position } => {
                write!(f, "{player} plays {pokemon} to {position}")
            }
            GameEvent::Evolved { player, from, to, position } => {
                write!(f, "{player} evolves {from} into {to} ({position})")
            }
            GameEvent::EnergyAttached { player, pokemon, energy } => {
                write!(f, "{player} attaches {energy} energy to {pokemon}")
            }
            GameEvent::EnergyDiscarded { player, pokemon, energy } => {
                write!(f, "{player} discards {} energy from {pokemon}", energy.len())
            }
            GameEvent::UnusedEnergyDiscarded { player, energy } => {
                write!(f, "{player} loses unused {energy} energy")
            }
            GameEvent::TrainerPlayed { player, card, kind } => write!(f, "{player} plays {kind} {card}"),
            GameEvent::ToolAttached { player, tool, pokemon } => {
                write!(f, "{player} attaches {tool} to {pokemon}")
            }
            GameEvent::AbilityUsed { player, pokemon, ability } => {
                write!(f, "{player}'s {pokemon} uses {ability}")
            }
            GameEvent::Retreated { player, from, to } => write!(f, "{player} retreats {from} for {to}"),
            GameEvent::Switched { player, from, to } => match from {
                Some(from) => write!(f, "{player} switches {from} out for {to}"),
                None => write!(f, "{player} moves {to} to the active spot"),
            },
            GameEvent::AttackDeclared { player, pokemon, attack } => {
                write!(f, "{player}'s {pokemon} uses {attack}")
            }
            GameEvent::AttackFailed { player, pokemon, attack, reason } => {
                write!(f, "{player}'s {pokemon} fails to use {attack}: {reason}")
            }
            GameEvent::CoinFlipped { player, heads } => {
                write!(f, "{player} flips {}", if *heads { "heads" } else { "tails" })
            }
            GameEvent::Damaged { player, pokemon, amount, hp_after, .. } => {
                write!(f, "{player}'s {pokemon} takes {amount} damage ({hp_after} HP left)")
            }
            GameEvent::DamagePrevented { player, pokemon } => {
                write!(f, "Damage to {player}'s {pokemon} is prevented")
            }
            GameEvent::Healed { player, pokemon, amount } => {
                write!(f, "{player}'s {pokemon} heals {amount} damage")
            }
            GameEvent::ConditionApplied { player, pokemon, condition } => {
                write!(f, "{player}'s {pokemon} is now {condition}")
            }
            GameEvent::ConditionRecovered { player, pokemon, condition } => {
                write!(f, "{player}'s {pokemon} is no longer {condition}")
            }
            GameEvent::StatusGranted { player, pokemon, status } => match pokemon {
                Some(p) => write!(f, "{player}'s {p} gains {status}"),
                None => write!(f, "{player} gains {status}"),
            },
            GameEvent::StatusExpired { player, pokemon, status } => match pokemon {
                Some(p) => write!(f, "{player}'s {p} loses {status}"),
                None => write!(f, "{player} loses {status}"),
            },
            GameEvent::CardToHand { player, card } => write!(f, "{player} puts {card} into their hand"),
            GameEvent::CardDiscarded { player, card } => write!(f, "{player} discards {card}"),
            GameEvent::CardsShown { viewer, owner, cards } => {
                let names: Vec<&str> = cards.iter().map(|n| n.as_str()).collect();
                write!(f, "{viewer} sees {owner}'s cards: {}", names.join(", "))
            }
            GameEvent::KnockedOut { player, pokemon, prize_value } => {
                write!(f, "{player}'s {pokemon} is knocked out (worth {prize_value})")
            }
            GameEvent::PrizeAwarded { player, points, total } => {
                write!(f, "{player} takes {points} point(s), {total} total")
            }
            GameEvent::ActivePromoted { player, pokemon } => {
                write!(f, "{player} promotes {pokemon} to the active spot")
            }
            GameEvent::UnsupportedEffect { player, card, text } => {
                write!(f, "{player}: {card} has no implemented effect for \"{text}\"")
            }
            GameEvent::TurnError { player, error } => write!(f, "{player} turn error: {error}"),
            GameEvent::TurnEnded { turn, player } => write!(f, "Turn {turn} ({player}) ends"),
            GameEvent::GameOver { winner, reason } => match winner {
                Some(w) => write!(f, "=== Game over: {w} wins ({reason}) ==="),
                None => write!(f, "=== Game over: draw ({reason}) ==="),
            },
        }
    }
}
