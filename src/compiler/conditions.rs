//! Condition phrases: the part between "if" and the comma
//!
//! Each phrase compiles into a `Predicate` evaluated against the live game
//! whenever the effect runs or is offered.

use crate::compiler::targeting::parse_names;
use crate::compiler::{count_word, ENERGY};
use crate::core::{
    EffectSource, EnergyType, InPlayPokemon, PokemonRef, Predicate, SecondaryCondition,
    SpecialCondition, Stage, StatusKind,
};
use crate::game::{Game, GameEvent};
use regex::{Captures, Regex};
use std::sync::Arc;

type Build = fn(&Captures<'_>) -> Option<Predicate>;

/// Ordered table of condition phrases
pub struct ConditionGrammar {
    rules: Vec<(Regex, Build)>,
}

impl Default for ConditionGrammar {
    fn default() -> Self {
        Self::new()
    }
}

const DEFENDER: &str = r"(?:your opponent's active pokemon|the defending pokemon)";

impl ConditionGrammar {
    pub fn new() -> Self {
        let table = [
            rule(r"this pokemon has damage on it", |_| Some(on_source(|_, p| p.is_damaged()))),
            rule(r"this pokemon has no damage on it", |_| Some(on_source(|_, p| !p.is_damaged()))),
            rule(r"this pokemon is in the active spot", |_| Some(source_in_active())),
            rule(r"this pokemon is on your bench", |_| {
                Some(Arc::new(|game: &Game, source: &EffectSource| {
                    source_ref(game, source).is_some_and(|r| !r.position.is_active())
                }))
            }),
            rule(r"this pokemon evolved from a pokemon this turn|this pokemon is evolved", |_| {
                Some(on_source(|_, p| p.cards.len() > 1))
            }),
            rule(
                format!(r"this pokemon has (?:at least )?(?P<n>\w+) (?:or more )?(?:(?P<e>{ENERGY}) )?energy attached(?: to it)?"),
                |caps| {
                    let n = count_word(&caps["n"])? as u32;
                    let energy = caps.name("e").and_then(|e| e.as_str().parse::<EnergyType>().ok());
                    Some(Arc::new(move |game: &Game, source: &EffectSource| {
                        source_ref(game, source).is_some_and(|r| {
                            let counts = game.effective_energy(&r);
                            energy.map_or(counts.total(), |e| counts.get(e)) >= n
                        })
                    }))
                },
            ),
            rule(format!(r"{DEFENDER} has damage on it"), |_| Some(on_defender(|_, _, p| p.is_damaged()))),
            rule(format!(r"{DEFENDER} is affected by a special condition"), |_| {
                Some(on_defender(|_, _, p| !p.conditions().is_empty()))
            }),
            rule(format!(r"{DEFENDER} is (?P<c>asleep|paralyzed|confused|poisoned|burned)"), |caps| {
                let condition = SpecialCondition::parse(&caps["c"])?;
                let poisoned = SpecialCondition::Secondary(SecondaryCondition::Poisoned);
                let plus = SpecialCondition::Secondary(SecondaryCondition::PoisonedPlus);
                Some(on_defender(move |_, _, p| {
                    p.has_condition(condition) || (condition == poisoned && p.has_condition(plus))
                }))
            }),
            rule(format!(r"{DEFENDER} is a pokemon ex"), |_| Some(on_defender(|_, _, p| p.card.is_ex))),
            rule(format!(r"{DEFENDER} is a (?P<s>basic|stage 1|stage 2) pokemon"), |caps| {
                let stage = caps["s"].parse::<Stage>().ok()?;
                Some(on_defender(move |_, _, p| p.card.stage == stage))
            }),
            rule(format!(r"{DEFENDER} is a (?P<e>{ENERGY}) pokemon"), |caps| {
                let energy = caps["e"].parse::<EnergyType>().ok()?;
                Some(on_defender(move |_, _, p| p.card.energy_type == energy))
            }),
            rule(format!(r"{DEFENDER} has more remaining hp than this pokemon"), |_| {
                Some(Arc::new(|game: &Game, source: &EffectSource| {
                    let mine = source_ref(game, source).and_then(|r| game.pokemon(&r)).map(|p| p.hp);
                    let theirs = game.active_ref(source.player.opponent()).and_then(|r| game.pokemon(&r)).map(|p| p.hp);
                    matches!((mine, theirs), (Some(m), Some(t)) if t > m)
                }))
            }),
            rule(r"you have (?P<n>\w+) or more (?:benched )?pokemon on your bench", |caps| {
                let n = count_word(&caps["n"])?;
                Some(Arc::new(move |game: &Game, source: &EffectSource| game.bench_refs(source.player).len() >= n))
            }),
            rule(r"you have (?P<names>[^,]+?) in play", |caps| {
                let names = parse_names(&caps["names"])?;
                Some(Arc::new(move |game: &Game, source: &EffectSource| {
                    game.in_play(source.player).iter().any(|r| {
                        game.pokemon(r).is_some_and(|p| names.iter().any(|n| p.name().matches(n)))
                    })
                }))
            }),
            rule(
                r"(?:any of )?your pokemon (?:was|were) knocked out (?:by damage from an attack )?during your opponent's last turn",
                |_| {
                    Some(Arc::new(|game: &Game, source: &EffectSource| {
                        game.logger.previous_turn().iter().any(|entry| {
                            matches!(&entry.event, GameEvent::KnockedOut { player, .. } if *player == source.player)
                        })
                    }))
                },
            ),
            rule(r"your opponent has (?P<n>\w+) or more cards in their hand", |caps| {
                let n = count_word(&caps["n"])?;
                Some(Arc::new(move |game: &Game, source: &EffectSource| {
                    game.player(source.player.opponent()).hand.len() >= n
                }))
            }),
            rule(r"this pokemon can't attack", |_| {
                Some(Arc::new(|game: &Game, source: &EffectSource| {
                    source_ref(game, source).is_some_and(|r| game.has_status(&r, StatusKind::CannotAttack))
                }))
            }),
        ];
        Self::from_table(table)
    }

    fn from_table(table: impl IntoIterator<Item = (String, Build)>) -> Self {
        ConditionGrammar {
            rules: table
                .into_iter()
                .map(|(pattern, build)| {
                    let regex = Regex::new(&format!(r"(?i)^(?:{pattern})$")).expect("condition patterns are valid");
                    (regex, build)
                })
                .collect(),
        }
    }

    /// Compile a condition phrase; `None` when it is not understood
    ///
    /// A phrase that matches a rule whose builder declines falls through to
    /// the later rules.
    pub fn parse(&self, text: &str) -> Option<Predicate> {
        let text = text.trim();
        self.rules
            .iter()
            .find_map(|(regex, build)| regex.captures(text).and_then(|caps| build(&caps)))
    }
}

fn rule(pattern: impl Into<String>, build: Build) -> (String, Build) {
    (pattern.into(), build)
}

fn source_ref(game: &Game, source: &EffectSource) -> Option<PokemonRef> {
    source.pokemon.and_then(|id| game.locate(id))
}

/// True when the source Pokémon sits in its owner's active spot
pub fn source_in_active() -> Predicate {
    Arc::new(|game: &Game, source: &EffectSource| source_ref(game, source).is_some_and(|r| r.position.is_active()))
}

fn on_source(test: fn(&Game, &InPlayPokemon) -> bool) -> Predicate {
    Arc::new(move |game: &Game, source: &EffectSource| {
        source_ref(game, source)
            .and_then(|r| game.pokemon(&r))
            .is_some_and(|p| test(game, p))
    })
}

fn on_defender<F>(test: F) -> Predicate
where
    F: Fn(&Game, &EffectSource, &InPlayPokemon) -> bool + Send + Sync + 'static,
{
    Arc::new(move |game: &Game, source: &EffectSource| {
        game.active_ref(source.player.opponent())
            .and_then(|r| game.pokemon(&r))
            .is_some_and(|p| test(game, source, p))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardName, Origin, PlayerId, Position, PrimaryCondition};
    use crate::game::test_support::{basic, card_ref, two_player_game};

    fn setup() -> (Game, EffectSource, PokemonRef) {
        let mut game = two_player_game();
        let mine = card_ref(&mut game, basic("Pikachu", 60));
        let theirs = card_ref(&mut game, basic("Squirtle", 60));
        let mine = game.place_pokemon(PlayerId::FIRST, Position::Active, mine).unwrap();
        let theirs = game.place_pokemon(PlayerId::SECOND, Position::Active, theirs).unwrap();
        let source = EffectSource::new(PlayerId::FIRST, Some(mine.id), CardName::new("Pikachu"), Origin::Attack);
        (game, source, theirs)
    }

    #[test]
    fn test_defender_damage() {
        let grammar = ConditionGrammar::new();
        let check = grammar.parse("your opponent's Active Pokemon has damage on it").unwrap();
        let (mut game, source, theirs) = setup();
        assert!(!check(&game, &source));
        game.damage_pokemon(&theirs, 10, true);
        assert!(check(&game, &source));
    }

    #[test]
    fn test_defender_condition() {
        let grammar = ConditionGrammar::new();
        let check = grammar.parse("the Defending Pokemon is Asleep").unwrap();
        let (mut game, source, theirs) = setup();
        assert!(!check(&game, &source));
        game.apply_condition(&theirs, SpecialCondition::Primary(PrimaryCondition::Asleep));
        assert!(check(&game, &source));
    }

    #[test]
    fn test_source_in_active() {
        let grammar = ConditionGrammar::new();
        let (game, source, _) = setup();
        assert!(grammar.parse("this Pokemon is in the Active Spot").unwrap()(&game, &source));
        assert!(!grammar.parse("this Pokemon is on your Bench").unwrap()(&game, &source));
    }

    #[test]
    fn test_named_in_play() {
        let grammar = ConditionGrammar::new();
        let (game, source, _) = setup();
        assert!(grammar.parse("you have Pikachu or Raichu in play").unwrap()(&game, &source));
        assert!(!grammar.parse("you have Arceus in play").unwrap()(&game, &source));
    }

    #[test]
    fn test_unknown_condition() {
        assert!(ConditionGrammar::new().parse("the moon is full").is_none());
    }

    #[test]
    fn test_declined_match_falls_through() {
        let grammar = ConditionGrammar::from_table([
            rule(r"you have (?P<n>\w+) cards", |caps| {
                let n = count_word(&caps["n"])?;
                Some(Arc::new(move |game: &Game, source: &EffectSource| game.player(source.player).hand.len() >= n))
            }),
            rule(r"you have .+", |_| Some(Arc::new(|_: &Game, _: &EffectSource| true))),
        ]);
        let (game, source, _) = setup();
        assert!(!grammar.parse("you have two cards").unwrap()(&game, &source));
        assert!(grammar.parse("you have many cards").unwrap()(&game, &source));
    }
}
