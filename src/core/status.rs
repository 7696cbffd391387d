//! Special conditions and transient statuses

use crate::core::{CardId, CardName, EnergyType, PokemonFilter, PokemonId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutually exclusive conditions; applying one replaces the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryCondition {
    Asleep,
    Paralyzed,
    Confused,
}

/// Independent conditions that can coexist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecondaryCondition {
    Poisoned,
    PoisonedPlus,
    Burned,
}

/// Any special condition, as written in rules text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialCondition {
    Primary(PrimaryCondition),
    Secondary(SecondaryCondition),
}

impl SpecialCondition {
    pub fn parse(word: &str) -> Option<Self> {
        use PrimaryCondition::*;
        use SecondaryCondition::*;
        let condition = match word.trim().to_lowercase().as_str() {
            "asleep" => SpecialCondition::Primary(Asleep),
            "paralyzed" => SpecialCondition::Primary(Paralyzed),
            "confused" => SpecialCondition::Primary(Confused),
            "poisoned" => SpecialCondition::Secondary(Poisoned),
            "poisoned+" => SpecialCondition::Secondary(PoisonedPlus),
            "burned" => SpecialCondition::Secondary(Burned),
            _ => return None,
        };
        Some(condition)
    }
}

impl fmt::Display for SpecialCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecialCondition::Primary(c) => write!(f, "{c:?}"),
            SpecialCondition::Secondary(SecondaryCondition::PoisonedPlus) => write!(f, "Poisoned+"),
            SpecialCondition::Secondary(c) => write!(f, "{c:?}"),
        }
    }
}

/// What a transient status does while present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    /// Attacks used by the holder do +N damage
    DamageBoost(i32),
    /// Attacks used by the holder do -N damage
    DamagePenalty(i32),
    /// The holder takes -N damage from attacks
    DamageReduction(i32),
    /// Prevent all damage from attacks done to the holder
    PreventDamage,
    /// Prevent all damage from and effects of attacks done to the holder
    PreventEffects,
    /// When damaged by an attack while active, the attacker takes N damage
    CounterDamage(i32),
    CannotAttack,
    CannotRetreat,
    /// The holder must flip heads before each attack
    FlipToAttack,
    /// Added to the printed retreat cost; negative values reduce it
    RetreatCostDelta(i32),
    /// Each attached energy of this type provides two
    DoubleEnergy(EnergyType),
    MaxHpBonus(i32),
    ConditionImmunity,
    /// The knockout sweep skips the holder while it is present
    KnockoutGuard,
    /// Player-level: no Supporter cards may be played
    NoSupporters,
    /// Player-level: no Item cards may be played
    NoItems,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::DamageBoost(n) => write!(f, "+{n} attack damage"),
            StatusKind::DamagePenalty(n) => write!(f, "-{n} attack damage"),
            StatusKind::DamageReduction(n) => write!(f, "-{n} damage taken"),
            StatusKind::PreventDamage => write!(f, "damage prevention"),
            StatusKind::PreventEffects => write!(f, "attack effect prevention"),
            StatusKind::CounterDamage(n) => write!(f, "{n} counter damage"),
            StatusKind::CannotAttack => write!(f, "can't attack"),
            StatusKind::CannotRetreat => write!(f, "can't retreat"),
            StatusKind::FlipToAttack => write!(f, "flip to attack"),
            StatusKind::RetreatCostDelta(n) => write!(f, "retreat cost {n:+}"),
            StatusKind::DoubleEnergy(t) => write!(f, "double {t} energy"),
            StatusKind::MaxHpBonus(n) => write!(f, "+{n} HP"),
            StatusKind::ConditionImmunity => write!(f, "special condition immunity"),
            StatusKind::KnockoutGuard => write!(f, "knockout guard"),
            StatusKind::NoSupporters => write!(f, "no Supporter cards"),
            StatusKind::NoItems => write!(f, "no Item cards"),
        }
    }
}

/// Where a status came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusSource {
    /// An attack or trainer effect
    CardEffect(CardName),
    /// The innate ability of an in-play Pokémon
    Ability { pokemon: PokemonId, name: String },
    /// A tool attached to an in-play Pokémon
    Tool { pokemon: PokemonId, card: CardId },
    /// Seen on a Pokémon through a player-level status
    Derived(Box<StatusSource>),
}

impl StatusSource {
    /// Whether this source lives on the given Pokémon and dies with it
    pub fn is_anchored_to(&self, id: PokemonId) -> bool {
        match self {
            StatusSource::Ability { pokemon, .. } | StatusSource::Tool { pokemon, .. } => *pokemon == id,
            StatusSource::Derived(inner) => inner.is_anchored_to(id),
            StatusSource::CardEffect(_) => false,
        }
    }
}

/// How long a status lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusDuration {
    /// Until evolution or leaving the field
    UntilRemoved,
    /// Decremented at each checkup, removed at zero
    Checkups(u32),
    /// Kept through the turn after `granted_turn`, dropped at the first
    /// checkup observed past it
    ThroughNextTurn { granted_turn: u32 },
}

impl StatusDuration {
    /// Advance one checkup; false once the status has expired
    pub fn tick(&mut self, turn: u32) -> bool {
        match self {
            StatusDuration::UntilRemoved => true,
            StatusDuration::Checkups(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining > 0
            }
            StatusDuration::ThroughNextTurn { granted_turn } => turn <= *granted_turn,
        }
    }
}

/// A transient status on a Pokémon, or the payload of a player-level status
#[derive(Clone)]
pub struct Status {
    pub kind: StatusKind,
    pub source: StatusSource,
    pub duration: StatusDuration,
    /// Copies sharing this key count once
    pub non_stacking: Option<String>,
    /// The other Pokémon in the exchange (attack target or attacker) must match
    pub counterpart: Option<PokemonFilter>,
}

impl Status {
    pub fn new(kind: StatusKind, source: StatusSource, duration: StatusDuration) -> Self {
        Status {
            kind,
            source,
            duration,
            non_stacking: None,
            counterpart: None,
        }
    }

    pub fn non_stacking(mut self, key: impl Into<String>) -> Self {
        self.non_stacking = Some(key.into());
        self
    }

    pub fn against(mut self, filter: PokemonFilter) -> Self {
        self.counterpart = Some(filter);
        self
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Status")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("duration", &self.duration)
            .field("non_stacking", &self.non_stacking)
            .field("counterpart", &self.counterpart.is_some())
            .finish()
    }
}

/// A status held by a player
///
/// `covers` is a live predicate over that player's in-play Pokémon, evaluated
/// on every query. `None` means the status only restricts the player.
#[derive(Clone)]
pub struct PlayerStatus {
    pub status: Status,
    pub covers: Option<PokemonFilter>,
}

impl fmt::Debug for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerStatus")
            .field("status", &self.status)
            .field("covers", &self.covers.is_some())
            .finish()
    }
}

/// Keep the first status of each non-stacking key
pub fn dedupe_non_stacking(statuses: Vec<Status>) -> Vec<Status> {
    let mut seen: Vec<String> = Vec::new();
    statuses
        .into_iter()
        .filter(|status| match &status.non_stacking {
            Some(key) if seen.contains(key) => false,
            Some(key) => {
                seen.push(key.clone());
                true
            }
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> StatusSource {
        StatusSource::CardEffect(CardName::new("Test"))
    }

    #[test]
    fn test_checkup_counter_expires_after_n_ticks() {
        let mut duration = StatusDuration::Checkups(2);
        assert!(duration.tick(1));
        assert!(!duration.tick(2));
    }

    #[test]
    fn test_through_next_turn() {
        let mut duration = StatusDuration::ThroughNextTurn { granted_turn: 4 };
        assert!(duration.tick(4));
        assert!(!duration.tick(5));
        assert!(StatusDuration::UntilRemoved.tick(99));
    }

    #[test]
    fn test_non_stacking_dedupe() {
        let a = Status::new(StatusKind::DoubleEnergy(EnergyType::Grass), source(), StatusDuration::UntilRemoved)
            .non_stacking("Jungle Totem");
        let b = a.clone();
        let c = Status::new(StatusKind::DamageReduction(10), source(), StatusDuration::UntilRemoved);
        let kept = dedupe_non_stacking(vec![a, b, c]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_condition_parse() {
        assert_eq!(
            SpecialCondition::parse("Poisoned"),
            Some(SpecialCondition::Secondary(SecondaryCondition::Poisoned))
        );
        assert_eq!(
            SpecialCondition::parse("asleep"),
            Some(SpecialCondition::Primary(PrimaryCondition::Asleep))
        );
        assert_eq!(SpecialCondition::parse("frozen"), None);
        assert_eq!(
            SpecialCondition::Secondary(SecondaryCondition::PoisonedPlus).to_string(),
            "Poisoned+"
        );
    }

    #[test]
    fn test_source_anchoring() {
        let id = PokemonId::new(7);
        let ability = StatusSource::Ability { pokemon: id, name: "Shell".into() };
        assert!(ability.is_anchored_to(id));
        assert!(StatusSource::Derived(Box::new(ability)).is_anchored_to(id));
        assert!(!source().is_anchored_to(id));
    }
}
