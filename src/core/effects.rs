//! Compiled effects
//!
//! Rules text compiles into closures over the live game. Nothing here knows
//! about text; see `compiler` for how these values are produced.

use crate::core::{AttackState, CardId, CardName, EnergyType, PlayerId, PokemonId, PokemonRef, StatusSource};
use crate::game::{EffectCtx, Game};
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// One executable piece of an effect
pub type EffectStep = Arc<dyn Fn(&mut EffectCtx<'_>) -> Result<()> + Send + Sync>;

/// A yes/no question about the game from the point of view of an effect source
pub type Predicate = Arc<dyn Fn(&Game, &EffectSource) -> bool + Send + Sync>;

/// A live test over in-play Pokémon, seen from `viewer`'s side of the table
pub type PokemonFilter = Arc<dyn Fn(&Game, PlayerId, &PokemonRef) -> bool + Send + Sync>;

/// Computes attack damage once coins have been flipped
pub type DamageCalc = Arc<dyn Fn(&Game, &EffectSource, &AttackState) -> i32 + Send + Sync>;

/// What kind of card text produced an effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Attack,
    Ability(String),
    Trainer,
    Tool(CardId),
}

/// Who is executing an effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectSource {
    pub player: PlayerId,
    /// The Pokémon using the attack or ability, or holding the tool
    pub pokemon: Option<PokemonId>,
    pub card: CardName,
    pub origin: Origin,
}

impl EffectSource {
    pub fn new(player: PlayerId, pokemon: Option<PokemonId>, card: CardName, origin: Origin) -> Self {
        EffectSource {
            player,
            pokemon,
            card,
            origin,
        }
    }

    pub fn trainer(player: PlayerId, card: CardName) -> Self {
        Self::new(player, None, card, Origin::Trainer)
    }

    /// Source recorded on statuses this effect grants
    pub fn status_source(&self) -> StatusSource {
        match (&self.origin, self.pokemon) {
            (Origin::Ability(name), Some(pokemon)) => StatusSource::Ability {
                pokemon,
                name: name.clone(),
            },
            (Origin::Tool(card), Some(pokemon)) => StatusSource::Tool { pokemon, card: *card },
            _ => StatusSource::CardEffect(self.card.clone()),
        }
    }
}

/// Whose Pokémon a target phrase draws from, relative to the effect's player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Own,
    Opponent,
    Both,
}

/// Who picks among the candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chooser {
    Player,
    Opponent,
}

/// How many of the candidates are affected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Choose { count: usize, chooser: Chooser },
    Random(usize),
}

/// A compiled target phrase: candidates are every in-play Pokémon on `side`
/// accepted by `filter`
#[derive(Clone)]
pub struct TargetSpec {
    pub side: Side,
    pub filter: PokemonFilter,
    pub selection: Selection,
    pub description: String,
}

impl TargetSpec {
    pub fn new(side: Side, selection: Selection, description: impl Into<String>, filter: PokemonFilter) -> Self {
        TargetSpec {
            side,
            filter,
            selection,
            description: description.into(),
        }
    }

    /// Every in-play Pokémon the phrase could refer to right now
    pub fn candidates(&self, game: &Game, viewer: PlayerId) -> Vec<PokemonRef> {
        let owners = match self.side {
            Side::Own => vec![viewer],
            Side::Opponent => vec![viewer.opponent()],
            Side::Both => vec![viewer, viewer.opponent()],
        };
        owners
            .into_iter()
            .flat_map(|owner| game.in_play(owner))
            .filter(|target| (self.filter)(game, viewer, target))
            .collect()
    }
}

impl fmt::Debug for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetSpec")
            .field("side", &self.side)
            .field("selection", &self.selection)
            .field("description", &self.description)
            .finish()
    }
}

/// When an effect runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Trainer cards: when played from hand
    OnPlay,
    /// Activated by the player during the main phase
    Manual { once_per_turn: bool },
    /// When the Pokémon is played from hand, including by evolving
    OnEnterPlay,
    /// After the Pokémon takes damage from an opponent's attack
    AfterDamaged,
    /// After energy from the energy zone is attached to the Pokémon
    OnEnergyAttach(Option<EnergyType>),
    /// During every checkup while in play
    OnCheckup,
    /// Always on; steps run whenever the Pokémon enters play or evolves
    Passive,
}

/// A compiled ability or trainer effect
#[derive(Clone)]
pub struct Effect {
    pub text: String,
    pub trigger: Trigger,
    pub preconditions: Vec<Predicate>,
    pub steps: Vec<EffectStep>,
    /// Using it ends the turn
    pub ends_turn: bool,
    /// Automatic triggers written with "you may" ask for confirmation
    pub optional: bool,
    /// False when some of the text was not understood
    pub compiled: bool,
}

impl Effect {
    pub fn new(text: impl Into<String>, trigger: Trigger) -> Self {
        Effect {
            text: text.into(),
            trigger,
            preconditions: Vec::new(),
            steps: Vec::new(),
            ends_turn: false,
            optional: false,
            compiled: true,
        }
    }

    /// Whether every precondition holds right now
    pub fn usable(&self, game: &Game, source: &EffectSource) -> bool {
        self.preconditions.iter().all(|check| check(game, source))
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("text", &self.text)
            .field("trigger", &self.trigger)
            .field("preconditions", &self.preconditions.len())
            .field("steps", &self.steps.len())
            .field("ends_turn", &self.ends_turn)
            .field("compiled", &self.compiled)
            .finish()
    }
}

/// A Pokémon's ability
#[derive(Debug, Clone)]
pub struct Ability {
    pub name: String,
    pub effect: Effect,
}

impl Ability {
    pub fn is_manual(&self) -> bool {
        matches!(self.effect.trigger, Trigger::Manual { .. })
    }
}
