//! Attacks and their damage shapes

use crate::core::{DamageCalc, EffectStep, EnergyType, Predicate, PokemonId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// How an attack's damage is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageShape {
    /// The attack deals no damage by itself
    None,
    /// Damage known before any coin is flipped
    Predetermined,
    /// Damage is a multiple of the number of heads
    CoinScaled,
    /// Base damage plus a bonus per heads
    CoinAdded,
    /// One flip; tails means the attack does nothing
    FlipOrNothing,
}

/// How many coins an attack flips, decided when it resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinCount {
    Fixed(u32),
    UntilTails,
    /// One coin per energy attached to the attacker, optionally of one type
    PerEnergy(Option<EnergyType>),
}

/// A compiled attack
#[derive(Clone)]
pub struct Attack {
    pub name: String,
    pub cost: SmallVec<[EnergyType; 4]>,
    pub base_damage: i32,
    pub text: String,
    pub shape: DamageShape,
    pub coins: Option<CoinCount>,
    /// Replaces `base_damage` when present
    pub damage: Option<DamageCalc>,
    pub pre_damage: Vec<EffectStep>,
    pub attacking: Vec<EffectStep>,
    pub side: Vec<EffectStep>,
    pub preconditions: Vec<Predicate>,
    /// The final amount depends on coin flips
    pub random_damage: bool,
    pub compiled: bool,
}

impl Attack {
    /// A plain attack: declared damage to the defending Pokémon and nothing else
    pub fn basic(name: impl Into<String>, cost: &[EnergyType], base_damage: i32) -> Self {
        Attack {
            name: name.into(),
            cost: cost.iter().copied().collect(),
            base_damage,
            text: String::new(),
            shape: if base_damage > 0 {
                DamageShape::Predetermined
            } else {
                DamageShape::None
            },
            coins: None,
            damage: None,
            pre_damage: Vec::new(),
            attacking: Vec::new(),
            side: Vec::new(),
            preconditions: Vec::new(),
            random_damage: false,
            compiled: true,
        }
    }
}

impl fmt::Debug for Attack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attack")
            .field("name", &self.name)
            .field("cost", &self.cost)
            .field("base_damage", &self.base_damage)
            .field("shape", &self.shape)
            .field("coins", &self.coins)
            .field("random_damage", &self.random_damage)
            .field(
                "effects",
                &(self.pre_damage.len(), self.attacking.len(), self.side.len()),
            )
            .field("compiled", &self.compiled)
            .finish()
    }
}

/// Bookkeeping for the attack being resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackState {
    pub attacker: PokemonId,
    pub defender: PokemonId,
    pub attack_name: String,
    pub base_damage: i32,
    pub coins_flipped: u32,
    pub heads: u32,
    /// A count remembered by an earlier effect ("for each energy discarded in this way")
    pub remembered: i32,
    /// Pokémon that took nonzero attack damage, in order
    pub damaged: SmallVec<[PokemonId; 4]>,
}

impl AttackState {
    pub fn new(attacker: PokemonId, defender: PokemonId, attack: &Attack) -> Self {
        AttackState {
            attacker,
            defender,
            attack_name: attack.name.clone(),
            base_damage: attack.base_damage,
            coins_flipped: 0,
            heads: 0,
            remembered: 0,
            damaged: SmallVec::new(),
        }
    }

    pub fn record_damage(&mut self, pokemon: PokemonId) {
        if !self.damaged.contains(&pokemon) {
            self.damaged.push(pokemon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_attack_shape() {
        let attack = Attack::basic("Ember", &[EnergyType::Fire], 30);
        assert_eq!(attack.shape, DamageShape::Predetermined);
        assert!(!attack.random_damage);

        let status_only = Attack::basic("Growl", &[EnergyType::Colorless], 0);
        assert_eq!(status_only.shape, DamageShape::None);
    }

    #[test]
    fn test_record_damage_is_unique() {
        let attack = Attack::basic("Ember", &[EnergyType::Fire], 30);
        let mut state = AttackState::new(PokemonId::new(1), PokemonId::new(2), &attack);
        state.record_damage(PokemonId::new(2));
        state.record_damage(PokemonId::new(2));
        assert_eq!(state.damaged.len(), 1);
    }
}
