//! Main game state structure

use crate::core::{
    dedupe_non_stacking, Card, CardId, CardRef, EnergyCounts, EnergyType, EntityAllocator,
    InPlayPokemon, Player, PlayerId, PlayerName, PlayerStatus, PokemonId, PokemonRef, Position,
    SpecialCondition, Status, StatusKind, StatusSource,
};
use crate::game::{DrawSkip, GameEvent, GameLogger, GameResult, RulesConfig, TurnPhase};
use crate::{GameError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// What a player brings to the table
#[derive(Debug, Clone)]
pub struct Seat {
    pub name: PlayerName,
    pub energy_types: Vec<EnergyType>,
    pub deck: Vec<Card>,
}

impl Seat {
    pub fn new(name: impl Into<PlayerName>, energy_types: Vec<EnergyType>, deck: Vec<Card>) -> Self {
        Seat {
            name: name.into(),
            energy_types,
            deck,
        }
    }
}

/// One-shot permissions that reset on every turn transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnGates {
    pub retreat_used: bool,
    pub supporter_used: bool,
}

/// Things that happened this turn, for once-per-turn rules and look-ups
#[derive(Debug, Clone, Default)]
pub struct TurnTracking {
    pub abilities_used: FxHashSet<PokemonId>,
    pub damaged: FxHashSet<PokemonId>,
    pub knocked_out: Vec<PokemonId>,
}

/// Complete game state
pub struct Game {
    pub players: [Player; 2],
    /// The player whose turn it is
    pub attacking: PlayerId,
    pub turn: u32,
    pub phase: TurnPhase,
    pub rules: RulesConfig,
    pub gates: TurnGates,
    pub tracking: TurnTracking,
    pub logger: GameLogger,
    rng: ChaCha12Rng,
    queued_flips: VecDeque<bool>,
    ids: EntityAllocator,
    end_signal: bool,
    result: Option<GameResult>,
    /// Sum of prize values of every Pokémon knocked out so far
    knocked_out_value: u32,
}

impl Game {
    /// Create a game with shuffled-later decks; nothing is in play yet
    pub fn new(seats: [Seat; 2], rules: RulesConfig, seed: u64) -> Self {
        let mut ids = EntityAllocator::new();
        let [first, second] = seats;
        let players = [
            Self::seat_player(PlayerId::FIRST, first, &mut ids),
            Self::seat_player(PlayerId::SECOND, second, &mut ids),
        ];
        Game {
            players,
            attacking: PlayerId::FIRST,
            turn: 0,
            phase: TurnPhase::Setup,
            rules,
            gates: TurnGates::default(),
            tracking: TurnTracking::default(),
            logger: GameLogger::new(),
            rng: ChaCha12Rng::seed_from_u64(seed),
            queued_flips: VecDeque::new(),
            ids,
            end_signal: false,
            result: None,
            knocked_out_value: 0,
        }
    }

    fn seat_player(id: PlayerId, seat: Seat, ids: &mut EntityAllocator) -> Player {
        let mut player = Player::new(id, seat.name, seat.energy_types);
        for card in seat.deck {
            player.deck.add(CardRef::new(ids.next_id(), card));
        }
        player
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    pub fn defending(&self) -> PlayerId {
        self.attacking.opponent()
    }

    pub fn next_card_id(&mut self) -> CardId {
        self.ids.next_id()
    }

    /// Append an event to the log for the current turn
    pub fn log(&mut self, event: GameEvent) {
        self.logger.record(self.turn, event);
    }

    // ------------------------------------------------------------------
    // Randomness
    // ------------------------------------------------------------------

    /// Queue coin results to be used before the RNG is consulted
    pub fn queue_coin_flips(&mut self, results: impl IntoIterator<Item = bool>) {
        self.queued_flips.extend(results);
    }

    pub fn flip_coin(&mut self, player: PlayerId) -> bool {
        let heads = match self.queued_flips.pop_front() {
            Some(result) => result,
            None => self.rng.gen_bool(0.5),
        };
        self.log(GameEvent::CoinFlipped { player, heads });
        heads
    }

    /// Uniform index below `len`; `len` must be positive
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }

    pub fn roll_energy(&mut self, player: PlayerId) -> Option<EnergyType> {
        let count = self.player(player).energy_types.len();
        if count == 0 {
            return None;
        }
        let index = self.rng.gen_range(0..count);
        Some(self.player(player).energy_types[index])
    }

    pub fn shuffle_deck(&mut self, player: PlayerId) {
        self.players[player.index()].deck.shuffle(&mut self.rng);
        self.log(GameEvent::DeckShuffled { player });
    }

    // ------------------------------------------------------------------
    // Locating Pokémon
    // ------------------------------------------------------------------

    pub fn pokemon(&self, target: &PokemonRef) -> Option<&InPlayPokemon> {
        self.player(target.owner)
            .slot(target.position)
            .filter(|p| p.id == target.id)
    }

    pub fn pokemon_mut(&mut self, target: &PokemonRef) -> Option<&mut InPlayPokemon> {
        self.player_mut(target.owner)
            .slot_mut(target.position)
            .filter(|p| p.id == target.id)
    }

    /// Current position of a Pokémon by id
    pub fn locate(&self, id: PokemonId) -> Option<PokemonRef> {
        PlayerId::both().into_iter().find_map(|owner| {
            self.player(owner)
                .position_of(id)
                .map(|position| PokemonRef { owner, position, id })
        })
    }

    pub fn slot_ref(&self, owner: PlayerId, position: Position) -> Option<PokemonRef> {
        self.player(owner)
            .slot(position)
            .map(|p| PokemonRef { owner, position, id: p.id })
    }

    pub fn active_ref(&self, owner: PlayerId) -> Option<PokemonRef> {
        self.slot_ref(owner, Position::Active)
    }

    /// In-play Pokémon of one player, active first
    pub fn in_play(&self, owner: PlayerId) -> Vec<PokemonRef> {
        self.player(owner)
            .occupied()
            .map(|(position, p)| PokemonRef { owner, position, id: p.id })
            .collect()
    }

    pub fn bench_refs(&self, owner: PlayerId) -> Vec<PokemonRef> {
        self.in_play(owner)
            .into_iter()
            .filter(|r| !r.position.is_active())
            .collect()
    }

    // ------------------------------------------------------------------
    // Status queries
    // ------------------------------------------------------------------

    /// Statuses in force on a Pokémon: its own plus every player-level
    /// status whose live predicate covers it right now
    pub fn statuses_of(&self, target: &PokemonRef) -> Vec<Status> {
        let Some(pokemon) = self.pokemon(target) else {
            return Vec::new();
        };
        let mut all = pokemon.statuses.clone();
        for player_status in &self.player(target.owner).statuses {
            let Some(covers) = &player_status.covers else {
                continue;
            };
            if covers(self, target.owner, target) {
                let mut status = player_status.status.clone();
                status.source = StatusSource::Derived(Box::new(status.source.clone()));
                all.push(status);
            }
        }
        dedupe_non_stacking(all)
    }

    pub fn has_status(&self, target: &PokemonRef, kind: StatusKind) -> bool {
        self.statuses_of(target).iter().any(|s| s.kind == kind)
    }

    /// Player-level restriction check (no Pokémon coverage involved)
    pub fn player_restricted(&self, player: PlayerId, kind: StatusKind) -> bool {
        self.player(player)
            .statuses
            .iter()
            .any(|s| s.covers.is_none() && s.status.kind == kind)
    }

    /// Attached energy after doubling statuses
    pub fn effective_energy(&self, target: &PokemonRef) -> EnergyCounts {
        let mut counts = EnergyCounts::new();
        let Some(pokemon) = self.pokemon(target) else {
            return counts;
        };
        let doubled: Vec<EnergyType> = self
            .statuses_of(target)
            .iter()
            .filter_map(|s| match s.kind {
                StatusKind::DoubleEnergy(energy) => Some(energy),
                _ => None,
            })
            .collect();
        for energy in &pokemon.energy {
            counts.add(*energy, if doubled.contains(energy) { 2 } else { 1 });
        }
        counts
    }

    /// Printed retreat cost adjusted by statuses, floored at zero
    pub fn retreat_cost(&self, target: &PokemonRef) -> usize {
        let Some(pokemon) = self.pokemon(target) else {
            return 0;
        };
        let delta: i32 = self
            .statuses_of(target)
            .iter()
            .filter_map(|s| match s.kind {
                StatusKind::RetreatCostDelta(n) => Some(n),
                _ => None,
            })
            .sum();
        (pokemon.card.retreat_cost as i32 + delta).max(0) as usize
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Draw one card; a no-op when the deck is empty or the hand is full
    pub fn draw(&mut self, player: PlayerId) -> Option<CardRef> {
        if self.player(player).hand.len() >= self.rules.max_hand_size {
            self.log(GameEvent::DrawSkipped { player, reason: DrawSkip::HandFull });
            return None;
        }
        let Some(card) = self.player_mut(player).deck.draw_top() else {
            self.log(GameEvent::DrawSkipped { player, reason: DrawSkip::DeckEmpty });
            return None;
        };
        self.log(GameEvent::Drew { player, card: card.name().clone() });
        self.player_mut(player).hand.add(card.clone());
        Some(card)
    }

    pub fn draw_many(&mut self, player: PlayerId, count: usize) -> usize {
        (0..count).filter(|_| self.draw(player).is_some()).count()
    }

    /// Put a Basic Pokémon or fossil card into an empty slot
    pub fn place_pokemon(&mut self, owner: PlayerId, position: Position, card: CardRef) -> Result<PokemonRef> {
        if self.player(owner).slot(position).is_some() {
            return Err(GameError::invalid_action(
                owner,
                format!("place {}", card.name()),
                format!("{position} is occupied"),
            ));
        }
        let pokemon = match &card.card {
            Card::Pokemon(p) if p.is_basic() => p.clone(),
            Card::Trainer(t) => match t.fossil_pokemon() {
                Some(p) => std::sync::Arc::new(p),
                None => {
                    return Err(GameError::invalid_action(
                        owner,
                        format!("place {}", card.name()),
                        "not a Pokémon",
                    ))
                }
            },
            Card::Pokemon(_) => {
                return Err(GameError::invalid_action(
                    owner,
                    format!("place {}", card.name()),
                    "not a Basic Pokémon",
                ))
            }
        };
        let id = self.ids.next_id();
        let name = pokemon.name.clone();
        let in_play = InPlayPokemon::new(id, pokemon, card);
        self.player_mut(owner).put_slot(position, in_play);
        self.log(GameEvent::PokemonPlayed { player: owner, pokemon: name, position });
        Ok(PokemonRef { owner, position, id })
    }

    /// Take a Pokémon off the field, dropping every status anchored to it
    pub fn remove_pokemon(&mut self, target: &PokemonRef) -> Option<InPlayPokemon> {
        self.pokemon(target)?;
        let pokemon = self.player_mut(target.owner).take_slot(target.position)?;
        for player in self.players.iter_mut() {
            player
                .statuses
                .retain(|s| !s.status.source.is_anchored_to(pokemon.id));
        }
        Some(pokemon)
    }

    /// Drop player-level statuses granted by the ability of a Pokémon that
    /// no longer has it
    pub fn drop_ability_statuses(&mut self, id: PokemonId) {
        for player in self.players.iter_mut() {
            player
                .statuses
                .retain(|s| !matches!(&s.status.source, StatusSource::Ability { pokemon, .. } if *pokemon == id));
        }
    }

    /// Remove a Pokémon and put all of its cards in the discard pile
    pub fn discard_pokemon(&mut self, target: &PokemonRef) -> Option<u32> {
        let pokemon = self.remove_pokemon(target)?;
        let prize_value = pokemon.card.prize_value;
        for card in pokemon.into_cards() {
            self.player_mut(target.owner).discard.add(card);
        }
        Some(prize_value)
    }

    /// Lower a Pokémon's HP and log it; returns the amount dealt
    pub fn damage_pokemon(&mut self, target: &PokemonRef, amount: i32, by_attack: bool) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let Some(pokemon) = self.pokemon_mut(target) else {
            return 0;
        };
        pokemon.take_damage(amount);
        let (name, hp_after) = (pokemon.name().clone(), pokemon.hp);
        self.tracking.damaged.insert(target.id);
        self.log(GameEvent::Damaged {
            player: target.owner,
            pokemon: name,
            amount,
            hp_after,
            by_attack,
        });
        amount
    }

    /// Heal and log; healing an undamaged Pokémon is a no-op
    pub fn heal_pokemon(&mut self, target: &PokemonRef, amount: i32) -> i32 {
        let Some(pokemon) = self.pokemon_mut(target) else {
            return 0;
        };
        let healed = pokemon.heal(amount);
        if healed == 0 {
            return 0;
        }
        let name = pokemon.name().clone();
        self.log(GameEvent::Healed { player: target.owner, pokemon: name, amount: healed });
        healed
    }

    /// Apply a special condition unless the Pokémon is immune
    pub fn apply_condition(&mut self, target: &PokemonRef, condition: SpecialCondition) -> bool {
        if self.pokemon(target).is_none() || self.has_status(target, StatusKind::ConditionImmunity) {
            return false;
        }
        let Some(pokemon) = self.pokemon_mut(target) else {
            return false;
        };
        pokemon.set_condition(condition);
        let name = pokemon.name().clone();
        self.log(GameEvent::ConditionApplied { player: target.owner, pokemon: name, condition });
        true
    }

    pub fn recover_condition(&mut self, target: &PokemonRef, condition: SpecialCondition) -> bool {
        let Some(pokemon) = self.pokemon_mut(target) else {
            return false;
        };
        if !pokemon.remove_condition(condition) {
            return false;
        }
        let name = pokemon.name().clone();
        self.log(GameEvent::ConditionRecovered { player: target.owner, pokemon: name, condition });
        true
    }

    pub fn recover_all_conditions(&mut self, target: &PokemonRef) {
        let Some(pokemon) = self.pokemon_mut(target) else {
            return;
        };
        let name = pokemon.name().clone();
        for condition in pokemon.clear_conditions() {
            self.log(GameEvent::ConditionRecovered {
                player: target.owner,
                pokemon: name.clone(),
                condition,
            });
        }
    }

    pub fn grant_status(&mut self, target: &PokemonRef, status: Status) {
        let Some(pokemon) = self.pokemon_mut(target) else {
            return;
        };
        if let StatusKind::MaxHpBonus(bonus) = status.kind {
            pokemon.adjust_max_hp(bonus);
        }
        let description = status.kind.to_string();
        let name = pokemon.name().clone();
        pokemon.statuses.push(status);
        self.log(GameEvent::StatusGranted {
            player: target.owner,
            pokemon: Some(name),
            status: description,
        });
    }

    pub fn grant_player_status(&mut self, player: PlayerId, status: PlayerStatus) {
        let description = status.status.kind.to_string();
        self.player_mut(player).statuses.push(status);
        self.log(GameEvent::StatusGranted { player, pokemon: None, status: description });
    }

    pub fn attach_energy(&mut self, target: &PokemonRef, energy: EnergyType) -> bool {
        let Some(pokemon) = self.pokemon_mut(target) else {
            return false;
        };
        pokemon.attach_energy(energy);
        let name = pokemon.name().clone();
        self.log(GameEvent::EnergyAttached { player: target.owner, pokemon: name, energy });
        true
    }

    /// Discard attached energy, most recent first; discarding none is a no-op
    pub fn discard_energy(&mut self, target: &PokemonRef, filter: Option<EnergyType>, count: usize) -> Vec<EnergyType> {
        if count == 0 {
            return Vec::new();
        }
        let Some(pokemon) = self.pokemon_mut(target) else {
            return Vec::new();
        };
        let removed = pokemon.remove_energy(filter, count);
        if removed.is_empty() {
            return removed;
        }
        let name = pokemon.name().clone();
        self.log(GameEvent::EnergyDiscarded {
            player: target.owner,
            pokemon: name,
            energy: removed.clone(),
        });
        removed
    }

    /// Count down every status once; drop and log the expired ones
    pub fn expire_statuses(&mut self) {
        let turn = self.turn;
        let mut expired: Vec<(PlayerId, Option<crate::core::CardName>, String)> = Vec::new();
        for player in self.players.iter_mut() {
            let owner = player.id;
            for pokemon in player.field.iter_mut().flatten() {
                let name = pokemon.name().clone();
                pokemon.statuses.retain_mut(|status| {
                    let alive = status.duration.tick(turn);
                    if !alive {
                        expired.push((owner, Some(name.clone()), status.kind.to_string()));
                    }
                    alive
                });
            }
            player.statuses.retain_mut(|status| {
                let alive = status.status.duration.tick(turn);
                if !alive {
                    expired.push((owner, None, status.status.kind.to_string()));
                }
                alive
            });
        }
        for (player, pokemon, status) in expired {
            self.log(GameEvent::StatusExpired { player, pokemon, status });
        }
    }

    /// Award prize points for a knockout
    pub fn award_prize(&mut self, player: PlayerId, points: u32) {
        self.knocked_out_value += points;
        let total = {
            let p = self.player_mut(player);
            p.prize_points += points;
            p.prize_points
        };
        self.log(GameEvent::PrizeAwarded { player, points, total });
    }

    /// Prize points can only come from knockouts
    pub fn check_prize_ledger(&self) -> Result<()> {
        let awarded: u32 = self.players.iter().map(|p| p.prize_points).sum();
        if awarded > self.knocked_out_value {
            return Err(GameError::InvalidState(format!(
                "{awarded} prize points awarded for {} points of knockouts",
                self.knocked_out_value
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Turn signals and outcome
    // ------------------------------------------------------------------

    /// Ask for the current turn to end after the action in progress
    pub fn signal_end_of_turn(&mut self) {
        self.end_signal = true;
    }

    pub fn end_signalled(&self) -> bool {
        self.end_signal || self.result.is_some()
    }

    pub(crate) fn clear_end_signal(&mut self) {
        self.end_signal = false;
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    pub(crate) fn finish(&mut self, result: GameResult) {
        if self.result.is_some() {
            return;
        }
        self.phase = TurnPhase::GameOver;
        self.log(GameEvent::GameOver {
            winner: result.winner,
            reason: result.end_reason.to_string(),
        });
        self.result = Some(result);
    }
}
