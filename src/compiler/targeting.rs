//! Target and card-filter phrases
//!
//! A small nom grammar for the noun phrases that recur across rules text:
//! "1 of your opponent's Benched Pokemon", "each of your Grass Pokemon",
//! "your Moltres, Articuno, or Zapdos", "a random Basic Pokemon". Each phrase
//! compiles into a live filter, so the same value serves bulk application
//! and building the candidate list offered to a choosing player.

use crate::core::{
    Card, Chooser, EnergyType, PlayerId, PokemonFilter, PokemonRef, Selection, Side, Stage,
    TargetSpec, TrainerKind,
};
use crate::game::{EffectCtx, Game};
use crate::Result;
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while1};
use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value, verify};
use nom::multi::{many0, separated_list1};
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::IResult;
use std::fmt;
use std::sync::Arc;

/// Tests a card outside of play (deck searches)
pub type CardFilter = Arc<dyn Fn(&Card) -> bool + Send + Sync>;

/// What a target phrase refers to
#[derive(Clone)]
pub enum Target {
    /// The Pokémon using the attack or ability, or holding the tool
    This,
    /// The Pokémon whose attack set off a reactive ability
    Attacker,
    Spec(TargetSpec),
}

impl Target {
    /// Concrete Pokémon for this phrase right now
    pub fn resolve(&self, ctx: &mut EffectCtx<'_>) -> Result<Vec<PokemonRef>> {
        match self {
            Target::This => Ok(ctx.source_ref().into_iter().collect()),
            Target::Attacker => Ok(ctx.trigger_ref().into_iter().collect()),
            Target::Spec(spec) => ctx.resolve(spec),
        }
    }

    /// The same phrase, with the opponent making the choice
    pub fn chosen_by_opponent(mut self) -> Self {
        if let Target::Spec(spec) = &mut self {
            if let Selection::Choose { count, .. } = spec.selection {
                spec.selection = Selection::Choose { count, chooser: Chooser::Opponent };
            }
        }
        self
    }

    /// The live filter behind the phrase, viewed from its owner
    pub fn filter(&self) -> Option<PokemonFilter> {
        match self {
            Target::Spec(spec) => Some(spec.filter.clone()),
            _ => None,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Target::This => Side::Own,
            Target::Attacker => Side::Opponent,
            Target::Spec(spec) => spec.side,
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::This => write!(f, "This"),
            Target::Attacker => write!(f, "Attacker"),
            Target::Spec(spec) => write!(f, "{spec:?}"),
        }
    }
}

/// Parse a complete target phrase
pub fn parse_target(text: &str) -> Option<Target> {
    let text = text.trim();
    all_consuming(target)(text).ok().map(|(_, mut target)| {
        if let Target::Spec(spec) = &mut target {
            spec.description = text.to_string();
        }
        target
    })
}

/// Parse a complete card phrase, as used by deck searches
pub fn parse_card_filter(text: &str) -> Option<CardFilter> {
    all_consuming(card_phrase)(text.trim()).ok().map(|(_, filter)| filter)
}

/// Split "Moltres, Articuno, or Zapdos" into names
pub fn parse_names(text: &str) -> Option<Vec<String>> {
    all_consuming(name_list)(text.trim()).ok().map(|(_, names)| names)
}

#[derive(Clone, Copy)]
enum Quantity {
    Each,
    Count(usize),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Place {
    Active,
    Bench,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Suffix {
    Damaged,
    AtRandom,
}

/// Everything a quantified phrase can say about the Pokémon it picks
#[derive(Clone, Default)]
struct Criteria {
    place: Option<Place>,
    energy: Option<EnergyType>,
    stage: Option<Stage>,
    ex: bool,
    names: Option<Vec<String>>,
    damaged: bool,
}

impl Criteria {
    fn into_filter(self) -> PokemonFilter {
        Arc::new(move |game: &Game, _viewer: PlayerId, target: &PokemonRef| {
            let Some(pokemon) = game.pokemon(target) else {
                return false;
            };
            let place_ok = match self.place {
                Some(Place::Active) => target.position.is_active(),
                Some(Place::Bench) => !target.position.is_active(),
                None => true,
            };
            place_ok
                && self.energy.map_or(true, |e| pokemon.card.energy_type == e)
                && self.stage.map_or(true, |s| pokemon.card.stage == s)
                && (!self.ex || pokemon.card.is_ex)
                && self
                    .names
                    .as_ref()
                    .map_or(true, |names| names.iter().any(|n| pokemon.name().matches(n)))
                && (!self.damaged || pokemon.is_damaged())
        })
    }
}

fn target(input: &str) -> IResult<&str, Target> {
    alt((
        value(
            Target::This,
            alt((
                tag_no_case("this pokemon"),
                tag_no_case("the pokemon this card is attached to"),
                tag_no_case("itself"),
                tag_no_case("this card"),
            )),
        ),
        value(Target::Attacker, tag_no_case("the attacking pokemon")),
        defending,
        quantified,
    ))(input)
}

fn defending(input: &str) -> IResult<&str, Target> {
    map(
        alt((
            tag_no_case("the defending pokemon"),
            tag_no_case("your opponent's active pokemon"),
        )),
        |_| {
            let criteria = Criteria { place: Some(Place::Active), ..Criteria::default() };
            Target::Spec(TargetSpec::new(Side::Opponent, Selection::All, "", criteria.into_filter()))
        },
    )(input)
}

fn quantified(input: &str) -> IResult<&str, Target> {
    let (rest, (quantity, side, place, stage, energy, noun, suffix)) = tuple((
        opt(quantity),
        owner,
        opt(place),
        opt(stage),
        opt(energy_word),
        noun,
        opt(suffix),
    ))(input)?;
    let (names, ex) = noun;
    let criteria = Criteria {
        place,
        energy,
        stage,
        ex,
        names,
        damaged: suffix == Some(Suffix::Damaged),
    };
    let selection = match (quantity, suffix) {
        (Some(Quantity::Count(n)), Some(Suffix::AtRandom)) => Selection::Random(n),
        (None, Some(Suffix::AtRandom)) => Selection::Random(1),
        (Some(Quantity::Count(n)), _) => Selection::Choose { count: n, chooser: Chooser::Player },
        _ => Selection::All,
    };
    Ok((rest, Target::Spec(TargetSpec::new(side, selection, "", criteria.into_filter()))))
}

fn count(input: &str) -> IResult<&str, usize> {
    alt((
        map_res(digit1, str::parse::<usize>),
        value(1, alt((tag_no_case("one"), tag_no_case("an"), tag_no_case("a")))),
        value(2, tag_no_case("two")),
        value(3, tag_no_case("three")),
    ))(input)
}

fn quantity(input: &str) -> IResult<&str, Quantity> {
    alt((
        value(Quantity::Each, alt((tag_no_case("each of "), tag_no_case("all of ")))),
        map(terminated(count, tag_no_case(" of ")), Quantity::Count),
    ))(input)
}

fn owner(input: &str) -> IResult<&str, Side> {
    alt((
        value(Side::Opponent, tag_no_case("your opponent's ")),
        value(Side::Own, tag_no_case("your ")),
        value(Side::Both, tag_no_case("each player's ")),
    ))(input)
}

fn place(input: &str) -> IResult<&str, Place> {
    alt((
        value(Place::Active, tag_no_case("active ")),
        value(Place::Bench, tag_no_case("benched ")),
    ))(input)
}

fn stage(input: &str) -> IResult<&str, Stage> {
    alt((
        value(Stage::Basic, tag_no_case("basic ")),
        value(Stage::Stage1, tag_no_case("stage 1 ")),
        value(Stage::Stage2, tag_no_case("stage 2 ")),
    ))(input)
}

fn energy_word(input: &str) -> IResult<&str, EnergyType> {
    terminated(
        map_res(
            verify(take_while1(|c: char| c.is_ascii_alphabetic()), |w: &str| w.len() > 1),
            str::parse::<EnergyType>,
        ),
        char(' '),
    )(input)
}

/// "Pokemon", "Pokemon ex" or a list of names
fn noun(input: &str) -> IResult<&str, (Option<Vec<String>>, bool)> {
    alt((
        map(pair(tag_no_case("pokemon"), opt(tag_no_case(" ex"))), |(_, ex)| (None, ex.is_some())),
        map(name_list, |names| (Some(names), false)),
    ))(input)
}

fn suffix(input: &str) -> IResult<&str, Suffix> {
    alt((
        value(Suffix::Damaged, tag_no_case(" that has damage on it")),
        value(Suffix::AtRandom, tag_no_case(" at random")),
    ))(input)
}

fn capitalized(input: &str) -> IResult<&str, &str> {
    verify(
        take_while1(|c: char| c.is_alphanumeric() || c == '\'' || c == '-'),
        |word: &str| {
            word.chars().next().is_some_and(char::is_uppercase) && !word.eq_ignore_ascii_case("pokemon")
        },
    )(input)
}

fn card_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        capitalized,
        many0(preceded(char(' '), alt((capitalized, tag("ex"))))),
    ))(input)
}

fn name_list(input: &str) -> IResult<&str, Vec<String>> {
    map(
        separated_list1(
            alt((tag(", or "), tag(", and "), tag(" or "), tag(" and "), tag(", "))),
            card_name,
        ),
        |names| names.into_iter().map(str::to_string).collect(),
    )(input)
}

fn card_phrase(input: &str) -> IResult<&str, CardFilter> {
    alt((
        map(
            preceded(
                alt((tag_no_case("card that evolves from "), tag_no_case("pokemon that evolves from "))),
                card_name,
            ),
            |from| {
                let from = from.to_string();
                Arc::new(move |card: &Card| card.as_pokemon().is_some_and(|p| p.evolves_from.as_ref().is_some_and(|n| n.matches(&from))))
                    as CardFilter
            },
        ),
        map(
            terminated(pair(opt(stage), opt(energy_word)), tag_no_case("pokemon")),
            |(stage, energy)| {
                Arc::new(move |card: &Card| {
                    card.as_pokemon().is_some_and(|p| {
                        stage.map_or(true, |s| p.stage == s) && energy.map_or(true, |e| p.energy_type == e)
                    })
                }) as CardFilter
            },
        ),
        map(alt((tag_no_case("supporter card"), tag_no_case("supporter"))), |_| trainer_kind(TrainerKind::Supporter)),
        map(alt((tag_no_case("item card"), tag_no_case("item"))), |_| trainer_kind(TrainerKind::Item)),
        map(tag_no_case("card"), |_| Arc::new(|_: &Card| true) as CardFilter),
        map(name_list, |names| {
            Arc::new(move |card: &Card| names.iter().any(|n| card.name().matches(n))) as CardFilter
        }),
    ))(input)
}

fn trainer_kind(kind: TrainerKind) -> CardFilter {
    Arc::new(move |card: &Card| card.as_trainer().is_some_and(|t| t.kind == kind))
}
