//! Core game types and entities

pub mod attack;
pub mod card;
pub mod effects;
pub mod entity;
pub mod player;
pub mod pokemon;
pub mod status;
pub mod types;

pub use attack::{Attack, AttackState, CoinCount, DamageShape};
pub use card::{Card, CardRef, FossilForm, PokemonCard, TrainerCard, TrainerKind};
pub use effects::{
    Ability, Chooser, DamageCalc, Effect, EffectSource, EffectStep, Origin, PokemonFilter,
    Predicate, Selection, Side, TargetSpec, Trigger,
};
pub use entity::{CardId, EntityAllocator, EntityId, PlayerId, PokemonId};
pub use player::Player;
pub use pokemon::{InPlayPokemon, PokemonRef};
pub use status::{
    dedupe_non_stacking, PlayerStatus, PrimaryCondition, SecondaryCondition, SpecialCondition,
    Status, StatusDuration, StatusKind, StatusSource,
};
pub use types::{name_key, CardName, EnergyCounts, EnergyType, PlayerName, Position, Stage};
