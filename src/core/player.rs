//! Player representation

use crate::core::{EnergyType, InPlayPokemon, PlayerId, PlayerName, PlayerStatus, PokemonId, Position};
use crate::zones::{CardZone, Zone};

/// One side of the table
///
/// The field always has exactly one active and three bench slots; `None`
/// marks an empty slot.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,
    pub deck: CardZone,
    pub hand: CardZone,
    pub discard: CardZone,
    pub field: [Option<InPlayPokemon>; 4],
    /// Types the energy zone rolls from
    pub energy_types: Vec<EnergyType>,
    pub available_energy: Option<EnergyType>,
    pub next_energy: Option<EnergyType>,
    pub statuses: Vec<PlayerStatus>,
    pub prize_points: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>, energy_types: Vec<EnergyType>) -> Self {
        Player {
            id,
            name: name.into(),
            deck: CardZone::new(Zone::Deck, id),
            hand: CardZone::new(Zone::Hand, id),
            discard: CardZone::new(Zone::Discard, id),
            field: [None, None, None, None],
            energy_types,
            available_energy: None,
            next_energy: None,
            statuses: Vec::new(),
            prize_points: 0,
        }
    }

    pub fn slot(&self, position: Position) -> Option<&InPlayPokemon> {
        self.field[position.index()].as_ref()
    }

    pub fn slot_mut(&mut self, position: Position) -> Option<&mut InPlayPokemon> {
        self.field[position.index()].as_mut()
    }

    pub fn active(&self) -> Option<&InPlayPokemon> {
        self.slot(Position::Active)
    }

    /// Occupied positions, active first
    pub fn occupied(&self) -> impl Iterator<Item = (Position, &InPlayPokemon)> {
        Position::all()
            .into_iter()
            .filter_map(move |pos| self.slot(pos).map(|p| (pos, p)))
    }

    pub fn bench(&self) -> impl Iterator<Item = (Position, &InPlayPokemon)> {
        self.occupied().filter(|(pos, _)| !pos.is_active())
    }

    pub fn in_play_count(&self) -> usize {
        self.field.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn first_empty_bench(&self) -> Option<Position> {
        Position::all()
            .into_iter()
            .skip(1)
            .find(|pos| self.slot(*pos).is_none())
    }

    pub fn position_of(&self, id: PokemonId) -> Option<Position> {
        self.occupied().find(|(_, p)| p.id == id).map(|(pos, _)| pos)
    }

    pub fn find(&self, id: PokemonId) -> Option<&InPlayPokemon> {
        self.occupied().find(|(_, p)| p.id == id).map(|(_, p)| p)
    }

    pub fn find_mut(&mut self, id: PokemonId) -> Option<&mut InPlayPokemon> {
        self.field.iter_mut().flatten().find(|p| p.id == id)
    }

    pub fn take_slot(&mut self, position: Position) -> Option<InPlayPokemon> {
        self.field[position.index()].take()
    }

    pub fn put_slot(&mut self, position: Position, pokemon: InPlayPokemon) {
        self.field[position.index()] = Some(pokemon);
    }

    /// Exchange the occupants of two slots
    pub fn swap_slots(&mut self, a: Position, b: Position) {
        self.field.swap(a.index(), b.index());
    }
}
