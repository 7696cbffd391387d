//! Card types and definitions
//!
//! Card definitions are immutable once compiled and shared behind `Arc`;
//! a `CardRef` pairs one with the id of a physical copy in a game.

use crate::core::{Ability, Attack, CardId, CardName, Effect, EnergyType, Stage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A Pokémon card
#[derive(Debug, Clone)]
pub struct PokemonCard {
    /// Catalog identity (e.g. "A1-033")
    pub id: String,
    pub name: CardName,
    pub energy_type: EnergyType,
    pub hp: i32,
    pub stage: Stage,
    pub evolves_from: Option<CardName>,
    pub retreat_cost: u32,
    pub weakness: Option<EnergyType>,
    /// Prize points awarded to the opponent on knockout
    pub prize_value: u32,
    pub is_ex: bool,
    pub attacks: Vec<Attack>,
    pub ability: Option<Ability>,
}

impl PokemonCard {
    pub fn is_basic(&self) -> bool {
        self.stage == Stage::Basic
    }

    /// Whether this card evolves from a Pokémon with the given name
    pub fn evolves_from_name(&self, name: &CardName) -> bool {
        self.evolves_from
            .as_ref()
            .is_some_and(|from| from.key() == name.key())
    }
}

/// Trainer card variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainerKind {
    Item,
    Supporter,
    Fossil,
    PokemonTool,
}

impl fmt::Display for TrainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainerKind::Item => write!(f, "Item"),
            TrainerKind::Supporter => write!(f, "Supporter"),
            TrainerKind::Fossil => write!(f, "Fossil"),
            TrainerKind::PokemonTool => write!(f, "Pokémon Tool"),
        }
    }
}

/// How a fossil behaves once put into play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FossilForm {
    pub hp: i32,
    pub energy_type: EnergyType,
}

/// A trainer card
#[derive(Debug, Clone)]
pub struct TrainerCard {
    pub id: String,
    pub name: CardName,
    pub kind: TrainerKind,
    pub text: String,
    pub effect: Effect,
    pub fossil: Option<FossilForm>,
}

impl TrainerCard {
    /// The Pokémon a fossil pretends to be while in play
    pub fn fossil_pokemon(&self) -> Option<PokemonCard> {
        let form = self.fossil?;
        Some(PokemonCard {
            id: self.id.clone(),
            name: self.name.clone(),
            energy_type: form.energy_type,
            hp: form.hp,
            stage: Stage::Basic,
            evolves_from: None,
            retreat_cost: 0,
            weakness: None,
            prize_value: 1,
            is_ex: false,
            attacks: Vec::new(),
            ability: None,
        })
    }
}

/// A card definition: closed over the two card families
#[derive(Debug, Clone)]
pub enum Card {
    Pokemon(Arc<PokemonCard>),
    Trainer(Arc<TrainerCard>),
}

impl Card {
    pub fn name(&self) -> &CardName {
        match self {
            Card::Pokemon(p) => &p.name,
            Card::Trainer(t) => &t.name,
        }
    }

    pub fn catalog_id(&self) -> &str {
        match self {
            Card::Pokemon(p) => &p.id,
            Card::Trainer(t) => &t.id,
        }
    }

    pub fn as_pokemon(&self) -> Option<&Arc<PokemonCard>> {
        match self {
            Card::Pokemon(p) => Some(p),
            Card::Trainer(_) => None,
        }
    }

    pub fn as_trainer(&self) -> Option<&Arc<TrainerCard>> {
        match self {
            Card::Pokemon(_) => None,
            Card::Trainer(t) => Some(t),
        }
    }

    pub fn is_basic_pokemon(&self) -> bool {
        self.as_pokemon().is_some_and(|p| p.is_basic())
    }
}

/// A physical copy of a card in a game
#[derive(Debug, Clone)]
pub struct CardRef {
    pub id: CardId,
    pub card: Card,
}

impl CardRef {
    pub fn new(id: CardId, card: Card) -> Self {
        CardRef { id, card }
    }

    pub fn name(&self) -> &CardName {
        self.card.name()
    }
}

impl PartialEq for CardRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CardRef {}

impl fmt::Display for CardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Trigger;

    fn pokemon(name: &str, stage: Stage, from: Option<&str>) -> PokemonCard {
        PokemonCard {
            id: "T-001".into(),
            name: CardName::new(name),
            energy_type: EnergyType::Fire,
            hp: 60,
            stage,
            evolves_from: from.map(CardName::new),
            retreat_cost: 1,
            weakness: Some(EnergyType::Water),
            prize_value: 1,
            is_ex: false,
            attacks: Vec::new(),
            ability: None,
        }
    }

    #[test]
    fn test_evolves_from_name() {
        let charmeleon = pokemon("Charmeleon", Stage::Stage1, Some("Charmander"));
        assert!(charmeleon.evolves_from_name(&CardName::new("charmander")));
        assert!(!charmeleon.evolves_from_name(&CardName::new("Squirtle")));
        assert!(!charmeleon.is_basic());
    }

    #[test]
    fn test_card_ref_equality_is_by_id() {
        let card = Card::Pokemon(Arc::new(pokemon("Charmander", Stage::Basic, None)));
        let a = CardRef::new(CardId::new(1), card.clone());
        let b = CardRef::new(CardId::new(2), card);
        assert_ne!(a, b);
        assert!(a.card.is_basic_pokemon());
    }

    #[test]
    fn test_fossil_pokemon() {
        let fossil = TrainerCard {
            id: "T-100".into(),
            name: CardName::new("Helix Fossil"),
            kind: TrainerKind::Fossil,
            text: String::new(),
            effect: Effect::new("", Trigger::OnPlay),
            fossil: Some(FossilForm { hp: 40, energy_type: EnergyType::Colorless }),
        };
        let as_pokemon = fossil.fossil_pokemon().unwrap();
        assert_eq!(as_pokemon.hp, 40);
        assert!(as_pokemon.is_basic());
        assert!(as_pokemon.attacks.is_empty());
    }
}
