//! Live Pokémon on the field

use crate::core::{
    CardName, CardRef, EnergyType, PlayerId, PokemonCard, PokemonId, Position, PrimaryCondition,
    SecondaryCondition, SpecialCondition, Status, StatusSource,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Where an in-play Pokémon sits right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PokemonRef {
    pub owner: PlayerId,
    pub position: Position,
    pub id: PokemonId,
}

/// A Pokémon in an active or bench slot
///
/// Created when a Basic (or fossil) enters play, mutated in place by
/// evolution, and dropped on knockout or when it leaves the field.
#[derive(Debug, Clone)]
pub struct InPlayPokemon {
    pub id: PokemonId,
    /// The top card of the evolution stack
    pub card: Arc<PokemonCard>,
    /// Every physical card making up this Pokémon, bottom first
    pub cards: SmallVec<[CardRef; 3]>,
    pub hp: i32,
    pub max_hp: i32,
    /// Attached energy in attachment order
    pub energy: Vec<EnergyType>,
    pub tools: SmallVec<[CardRef; 1]>,
    pub primary: Option<PrimaryCondition>,
    pub secondary: SmallVec<[SecondaryCondition; 3]>,
    pub statuses: Vec<Status>,
    pub evolve_ready: bool,
}

impl InPlayPokemon {
    pub fn new(id: PokemonId, card: Arc<PokemonCard>, physical: CardRef) -> Self {
        let hp = card.hp;
        InPlayPokemon {
            id,
            card,
            cards: SmallVec::from_elem(physical, 1),
            hp,
            max_hp: hp,
            energy: Vec::new(),
            tools: SmallVec::new(),
            primary: None,
            secondary: SmallVec::new(),
            statuses: Vec::new(),
            evolve_ready: false,
        }
    }

    pub fn name(&self) -> &CardName {
        &self.card.name
    }

    pub fn is_damaged(&self) -> bool {
        self.hp < self.max_hp
    }

    pub fn damage_counters(&self) -> i32 {
        (self.max_hp - self.hp).max(0) / 10
    }

    pub fn is_knocked_out(&self) -> bool {
        self.hp <= 0
    }

    /// Lower HP, never below zero; returns the HP actually lost
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.hp;
        self.hp = (self.hp - amount).max(0);
        before - self.hp
    }

    /// Raise HP up to max; returns the HP actually restored
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 || !self.is_damaged() {
            return 0;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Raise max HP and current HP together (tools, evolution)
    pub fn adjust_max_hp(&mut self, delta: i32) {
        self.max_hp += delta;
        self.hp += delta;
    }

    pub fn attach_energy(&mut self, energy: EnergyType) {
        self.energy.push(energy);
    }

    /// Remove up to `count` matching energy, most recently attached first
    pub fn remove_energy(&mut self, filter: Option<EnergyType>, count: usize) -> Vec<EnergyType> {
        let mut removed = Vec::new();
        let mut index = self.energy.len();
        while index > 0 && removed.len() < count {
            index -= 1;
            if filter.map_or(true, |energy| self.energy[index] == energy) {
                removed.push(self.energy.remove(index));
            }
        }
        removed
    }

    pub fn conditions(&self) -> SmallVec<[SpecialCondition; 4]> {
        let mut all: SmallVec<[SpecialCondition; 4]> = SmallVec::new();
        if let Some(primary) = self.primary {
            all.push(SpecialCondition::Primary(primary));
        }
        all.extend(self.secondary.iter().map(|s| SpecialCondition::Secondary(*s)));
        all
    }

    pub fn has_condition(&self, condition: SpecialCondition) -> bool {
        match condition {
            SpecialCondition::Primary(p) => self.primary == Some(p),
            SpecialCondition::Secondary(s) => self.secondary.contains(&s),
        }
    }

    /// Apply a condition; a primary condition replaces the current one
    pub fn set_condition(&mut self, condition: SpecialCondition) {
        match condition {
            SpecialCondition::Primary(p) => self.primary = Some(p),
            SpecialCondition::Secondary(SecondaryCondition::Poisoned)
                if self.secondary.contains(&SecondaryCondition::PoisonedPlus) => {}
            SpecialCondition::Secondary(s) => {
                if s == SecondaryCondition::PoisonedPlus {
                    self.secondary.retain(|c| *c != SecondaryCondition::Poisoned);
                }
                if !self.secondary.contains(&s) {
                    self.secondary.push(s);
                    self.secondary.sort();
                }
            }
        }
    }

    pub fn remove_condition(&mut self, condition: SpecialCondition) -> bool {
        match condition {
            SpecialCondition::Primary(p) if self.primary == Some(p) => {
                self.primary = None;
                true
            }
            SpecialCondition::Primary(_) => false,
            SpecialCondition::Secondary(s) => {
                let before = self.secondary.len();
                self.secondary.retain(|c| *c != s);
                before != self.secondary.len()
            }
        }
    }

    /// Recover from every special condition, returning what was removed
    pub fn clear_conditions(&mut self) -> SmallVec<[SpecialCondition; 4]> {
        let removed = self.conditions();
        self.primary = None;
        self.secondary.clear();
        removed
    }

    /// Evolve in place: apply the HP delta, recover, drop transient statuses
    ///
    /// Statuses coming from attached tools stay, since the tool stays.
    pub fn evolve(&mut self, into: Arc<PokemonCard>, physical: CardRef) {
        let delta = into.hp - self.card.hp;
        self.adjust_max_hp(delta);
        self.card = into;
        self.cards.push(physical);
        self.evolve_ready = false;
        self.clear_conditions();
        self.statuses
            .retain(|status| matches!(status.source, StatusSource::Tool { .. }));
    }

    /// Every card that goes to the discard pile when this Pokémon leaves play
    pub fn into_cards(self) -> Vec<CardRef> {
        self.cards.into_iter().chain(self.tools).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardId, Stage, StatusDuration, StatusKind};

    fn card(name: &str, hp: i32, stage: Stage) -> Arc<PokemonCard> {
        Arc::new(PokemonCard {
            id: "T-001".into(),
            name: CardName::new(name),
            energy_type: EnergyType::Water,
            hp,
            stage,
            evolves_from: None,
            retreat_cost: 1,
            weakness: Some(EnergyType::Lightning),
            prize_value: 1,
            is_ex: false,
            attacks: Vec::new(),
            ability: None,
        })
    }

    fn in_play(hp: i32) -> InPlayPokemon {
        let c = card("Squirtle", hp, Stage::Basic);
        let physical = CardRef::new(CardId::new(1), Card::Pokemon(c.clone()));
        InPlayPokemon::new(PokemonId::new(10), c, physical)
    }

    #[test]
    fn test_damage_and_heal() {
        let mut p = in_play(60);
        assert_eq!(p.heal(20), 0);
        assert_eq!(p.take_damage(50), 50);
        assert_eq!(p.damage_counters(), 5);
        assert_eq!(p.heal(30), 30);
        assert_eq!(p.take_damage(100), 40);
        assert!(p.is_knocked_out());
        assert_eq!(p.hp, 0);
    }

    #[test]
    fn test_remove_energy_most_recent_first() {
        let mut p = in_play(60);
        p.attach_energy(EnergyType::Water);
        p.attach_energy(EnergyType::Fire);
        p.attach_energy(EnergyType::Water);
        assert_eq!(p.remove_energy(Some(EnergyType::Water), 1), vec![EnergyType::Water]);
        assert_eq!(p.energy, vec![EnergyType::Water, EnergyType::Fire]);
        assert_eq!(p.remove_energy(None, 5), vec![EnergyType::Fire, EnergyType::Water]);
        assert!(p.remove_energy(None, 1).is_empty());
    }

    #[test]
    fn test_primary_conditions_are_exclusive() {
        let mut p = in_play(60);
        p.set_condition(SpecialCondition::Primary(PrimaryCondition::Asleep));
        p.set_condition(SpecialCondition::Primary(PrimaryCondition::Paralyzed));
        p.set_condition(SpecialCondition::Secondary(SecondaryCondition::Burned));
        assert_eq!(p.primary, Some(PrimaryCondition::Paralyzed));
        assert_eq!(p.conditions().len(), 2);
    }

    #[test]
    fn test_poisoned_plus_supersedes_poisoned() {
        let mut p = in_play(60);
        p.set_condition(SpecialCondition::Secondary(SecondaryCondition::Poisoned));
        p.set_condition(SpecialCondition::Secondary(SecondaryCondition::PoisonedPlus));
        p.set_condition(SpecialCondition::Secondary(SecondaryCondition::Poisoned));
        assert_eq!(p.secondary.as_slice(), &[SecondaryCondition::PoisonedPlus]);
    }

    #[test]
    fn test_evolve_applies_delta_and_clears() {
        let mut p = in_play(60);
        p.take_damage(30);
        p.evolve_ready = true;
        p.set_condition(SpecialCondition::Primary(PrimaryCondition::Confused));
        p.statuses.push(Status::new(
            StatusKind::DamageReduction(20),
            StatusSource::CardEffect(CardName::new("Blue")),
            StatusDuration::Checkups(2),
        ));
        p.statuses.push(Status::new(
            StatusKind::MaxHpBonus(20),
            StatusSource::Tool { pokemon: p.id, card: CardId::new(5) },
            StatusDuration::UntilRemoved,
        ));

        let wartortle = card("Wartortle", 90, Stage::Stage1);
        let physical = CardRef::new(CardId::new(2), Card::Pokemon(wartortle.clone()));
        p.evolve(wartortle, physical);

        assert_eq!(p.max_hp, 90);
        assert_eq!(p.hp, 60);
        assert!(!p.evolve_ready);
        assert!(p.primary.is_none());
        assert_eq!(p.statuses.len(), 1);
        assert_eq!(p.cards.len(), 2);
        assert_eq!(p.into_cards().len(), 2);
    }
}
