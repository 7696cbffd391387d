//! Effect execution context
//!
//! Compiled steps run against an `EffectCtx`: the live game, both agents,
//! the source of the effect and, during an attack, the attack bookkeeping.
//! Every primitive a rule handler can emit lives here so that rules stay
//! small closures.

use crate::core::{
    AttackState, Card, CardId, CardRef, Chooser, CoinCount, Effect, EffectSource, EffectStep,
    EnergyType, Origin, PlayerId, PlayerStatus, PokemonId, PokemonRef, Position, Selection,
    SpecialCondition, Status, StatusKind, TargetSpec, Trigger,
};
use crate::game::controller::{request_choice, request_distribution, Agents, DecisionAgent};
use crate::game::{combat, ChoiceOption, ChoiceRequest, DistributionRequest, Game, GameEvent, GameView};
use crate::{GameError, Result};
use smallvec::SmallVec;

pub struct EffectCtx<'a> {
    pub game: &'a mut Game,
    agents: Agents<'a>,
    pub source: EffectSource,
    /// Present while an attack resolves
    pub attack: Option<AttackState>,
    /// The Pokémon that set off a reactive trigger (the attacker, for after-damaged)
    pub trigger_pokemon: Option<PokemonId>,
    /// Heads counted by earlier flips of this effect, by slot
    coin_slots: SmallVec<[u32; 4]>,
    flips: u32,
}

impl<'a> EffectCtx<'a> {
    pub fn new(game: &'a mut Game, agents: Agents<'a>, source: EffectSource) -> Self {
        EffectCtx {
            game,
            agents,
            source,
            attack: None,
            trigger_pokemon: None,
            coin_slots: SmallVec::new(),
            flips: 0,
        }
    }

    pub fn with_attack(mut self, state: AttackState) -> Self {
        self.attack = Some(state);
        self
    }

    pub fn with_trigger(mut self, pokemon: Option<PokemonId>) -> Self {
        self.trigger_pokemon = pokemon;
        self
    }

    /// The player executing the effect
    pub fn player(&self) -> PlayerId {
        self.source.player
    }

    pub fn opponent(&self) -> PlayerId {
        self.source.player.opponent()
    }

    pub fn agent(&self, player: PlayerId) -> &'a dyn DecisionAgent {
        self.agents[player.index()]
    }

    pub fn agents(&self) -> Agents<'a> {
        self.agents
    }

    pub fn source_ref(&self) -> Option<PokemonRef> {
        self.source.pokemon.and_then(|id| self.game.locate(id))
    }

    /// The defending Pokémon of the attack in progress, else the opponent's active
    pub fn defender_ref(&self) -> Option<PokemonRef> {
        match &self.attack {
            Some(state) => self.game.locate(state.defender),
            None => self.game.active_ref(self.opponent()),
        }
    }

    pub fn trigger_ref(&self) -> Option<PokemonRef> {
        self.trigger_pokemon.and_then(|id| self.game.locate(id))
    }

    // ------------------------------------------------------------------
    // Coins
    // ------------------------------------------------------------------

    pub fn flip(&mut self) -> bool {
        self.flips += 1;
        self.game.flip_coin(self.source.player)
    }

    /// Coins flipped so far by this effect
    pub fn flips(&self) -> u32 {
        self.flips
    }

    /// Flip according to a count provider and return the number of heads
    pub fn flip_coins(&mut self, count: CoinCount) -> u32 {
        match count {
            CoinCount::Fixed(n) => (0..n).filter(|_| self.flip()).count() as u32,
            CoinCount::UntilTails => {
                let mut heads = 0;
                while self.flip() {
                    heads += 1;
                }
                heads
            }
            CoinCount::PerEnergy(filter) => {
                let flips = self
                    .source_ref()
                    .map(|r| {
                        let energy = self.game.effective_energy(&r);
                        match filter {
                            Some(energy_type) => energy.get(energy_type),
                            None => energy.total(),
                        }
                    })
                    .unwrap_or(0);
                (0..flips).filter(|_| self.flip()).count() as u32
            }
        }
    }

    pub fn set_coin_slot(&mut self, slot: usize, heads: u32) {
        if self.coin_slots.len() <= slot {
            self.coin_slots.resize(slot + 1, 0);
        }
        self.coin_slots[slot] = heads;
    }

    pub fn coin_slot(&self, slot: usize) -> u32 {
        self.coin_slots.get(slot).copied().unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Choices
    // ------------------------------------------------------------------

    pub fn choose(&mut self, player: PlayerId, prompt: &str, options: Vec<ChoiceOption>) -> Result<Option<ChoiceOption>> {
        let request = ChoiceRequest { prompt: prompt.to_string(), options };
        request_choice(self.agent(player), self.game, player, &request)
    }

    pub fn choose_pokemon(&mut self, player: PlayerId, prompt: &str, candidates: &[PokemonRef]) -> Result<Option<PokemonRef>> {
        let options = candidates.iter().map(|r| ChoiceOption::Pokemon(*r)).collect();
        match self.choose(player, prompt, options)? {
            Some(ChoiceOption::Pokemon(r)) => Ok(Some(r)),
            Some(other) => Err(GameError::contract(player, prompt, format!("{other} is not a Pokémon"))),
            None => Ok(None),
        }
    }

    pub fn choose_card(&mut self, player: PlayerId, prompt: &str, cards: &[CardRef]) -> Result<Option<CardId>> {
        let options = cards.iter().map(|c| ChoiceOption::Card(c.id)).collect();
        match self.choose(player, prompt, options)? {
            Some(ChoiceOption::Card(id)) => Ok(Some(id)),
            Some(other) => Err(GameError::contract(player, prompt, format!("{other} is not a card"))),
            None => Ok(None),
        }
    }

    pub fn confirm(&self, player: PlayerId, prompt: &str) -> bool {
        self.agent(player).confirm(&GameView::new(&*self.game, player), prompt)
    }

    /// Show cards to a player and log it
    pub fn show(&mut self, viewer: PlayerId, owner: PlayerId, cards: Vec<CardRef>) {
        self.game.log(GameEvent::CardsShown {
            viewer,
            owner,
            cards: cards.iter().map(|c| c.name().clone()).collect(),
        });
        self.agent(viewer).acknowledge(&GameView::new(self.game, viewer), &cards);
    }

    // ------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------

    /// Turn a target phrase into concrete Pokémon, asking for a choice when
    /// the phrase says so
    pub fn resolve(&mut self, spec: &TargetSpec) -> Result<Vec<PokemonRef>> {
        let candidates = spec.candidates(self.game, self.player());
        match spec.selection {
            Selection::All => Ok(candidates),
            Selection::Random(count) => {
                let mut pool = candidates;
                let mut picked = Vec::new();
                while picked.len() < count && !pool.is_empty() {
                    let index = self.game.random_index(pool.len());
                    picked.push(pool.remove(index));
                }
                Ok(picked)
            }
            Selection::Choose { count, chooser } => {
                let chooser = match chooser {
                    Chooser::Player => self.player(),
                    Chooser::Opponent => self.opponent(),
                };
                let mut pool = candidates;
                let mut picked = Vec::new();
                while picked.len() < count {
                    let Some(choice) = self.choose_pokemon(chooser, &spec.description, &pool)? else {
                        break;
                    };
                    pool.retain(|r| *r != choice);
                    picked.push(choice);
                }
                Ok(picked)
            }
        }
    }

    /// An attack's effects do not reach an opposing Pokémon protected from them
    pub fn shielded(&self, target: &PokemonRef) -> bool {
        self.attack.is_some()
            && target.owner != self.player()
            && self.game.has_status(target, StatusKind::PreventEffects)
    }

    // ------------------------------------------------------------------
    // Damage, healing and conditions
    // ------------------------------------------------------------------

    /// Attack damage through the full damage formula
    pub fn attack_damage(&mut self, target: &PokemonRef, amount: i32) -> i32 {
        combat::deal_attack_damage(self, target, amount)
    }

    /// Damage that ignores weakness and modifiers (self-damage, abilities)
    pub fn direct_damage(&mut self, target: &PokemonRef, amount: i32) -> i32 {
        self.game.damage_pokemon(target, amount, false)
    }

    pub fn heal(&mut self, target: &PokemonRef, amount: i32) -> i32 {
        self.game.heal_pokemon(target, amount)
    }

    pub fn apply_condition(&mut self, target: &PokemonRef, condition: SpecialCondition) -> bool {
        if self.shielded(target) {
            return false;
        }
        self.game.apply_condition(target, condition)
    }

    pub fn grant_status(&mut self, target: &PokemonRef, status: Status) {
        if self.shielded(target) {
            return;
        }
        self.game.grant_status(target, status);
    }

    pub fn grant_player_status(&mut self, player: PlayerId, status: PlayerStatus) {
        self.game.grant_player_status(player, status);
    }

    // ------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------

    pub fn draw(&mut self, player: PlayerId, count: usize) -> usize {
        self.game.draw_many(player, count)
    }

    pub fn discard_from_hand(&mut self, player: PlayerId, card: CardId) -> bool {
        let Some(card) = self.game.player_mut(player).hand.remove(card) else {
            return false;
        };
        self.game.log(GameEvent::CardDiscarded { player, card: card.name().clone() });
        self.game.player_mut(player).discard.add(card);
        true
    }

    pub fn discard_random_from_hand(&mut self, player: PlayerId, count: usize) -> usize {
        let mut discarded = 0;
        while discarded < count && !self.game.player(player).hand.is_empty() {
            let index = self.game.random_index(self.game.player(player).hand.len());
            let id = self.game.player(player).hand.cards[index].id;
            self.discard_from_hand(player, id);
            discarded += 1;
        }
        discarded
    }

    /// Let `player` pick up to `count` matching cards from their deck into
    /// their hand, then shuffle; with `random` the cards are drawn at random
    pub fn search_deck(
        &mut self,
        player: PlayerId,
        count: usize,
        random: bool,
        matches: &dyn Fn(&Game, &Card) -> bool,
    ) -> Result<usize> {
        let mut found = 0;
        while found < count {
            let game: &Game = self.game;
            let pool: Vec<CardRef> = game
                .player(player)
                .deck
                .iter()
                .filter(|c| matches(game, &c.card))
                .cloned()
                .collect();
            if pool.is_empty() {
                break;
            }
            let pick = if random {
                Some(pool[self.game.random_index(pool.len())].id)
            } else {
                self.choose_card(player, "search your deck", &pool)?
            };
            let Some(id) = pick else { break };
            if let Some(card) = self.game.player_mut(player).deck.remove(id) {
                self.game.log(GameEvent::CardToHand { player, card: card.name().clone() });
                self.game.player_mut(player).hand.add(card);
                found += 1;
            }
        }
        self.game.shuffle_deck(player);
        Ok(found)
    }

    pub fn shuffle_hand_into_deck(&mut self, player: PlayerId) -> usize {
        let p = self.game.player_mut(player);
        let cards = p.hand.take_all();
        let count = cards.len();
        for card in cards {
            p.deck.add(card);
        }
        self.game.shuffle_deck(player);
        count
    }

    /// Put a Pokémon and everything attached to it into its owner's hand;
    /// attached energy is discarded
    pub fn return_to_hand(&mut self, target: &PokemonRef) -> bool {
        let Some(pokemon) = self.game.remove_pokemon(target) else {
            return false;
        };
        for card in pokemon.into_cards() {
            self.game.log(GameEvent::CardToHand { player: target.owner, card: card.name().clone() });
            self.game.player_mut(target.owner).hand.add(card);
        }
        true
    }

    pub fn reveal_hand(&mut self, owner: PlayerId, viewer: PlayerId) {
        let cards = self.game.player(owner).hand.cards.clone();
        self.show(viewer, owner, cards);
    }

    pub fn look_at_top(&mut self, owner: PlayerId, viewer: PlayerId, count: usize) {
        let cards = self.game.player(owner).deck.peek_top(count);
        self.show(viewer, owner, cards);
    }

    // ------------------------------------------------------------------
    // Energy
    // ------------------------------------------------------------------

    /// Attach energy generated from the energy zone
    pub fn attach_from_zone(&mut self, target: &PokemonRef, energy: EnergyType, count: usize) -> Result<()> {
        for _ in 0..count {
            self.game.attach_energy(target, energy);
            fire_triggers(
                self.game,
                self.agents,
                &[*target],
                |trigger| matches!(trigger, Trigger::OnEnergyAttach(filter) if filter.map_or(true, |f| f == energy)),
                None,
            )?;
        }
        Ok(())
    }

    pub fn discard_energy(&mut self, target: &PokemonRef, filter: Option<EnergyType>, count: usize) -> usize {
        if self.shielded(target) {
            return 0;
        }
        self.game.discard_energy(target, filter, count).len()
    }

    pub fn move_energy(&mut self, from: &PokemonRef, to: &PokemonRef, filter: Option<EnergyType>, count: usize) -> usize {
        let moved = match self.game.pokemon_mut(from) {
            Some(pokemon) => pokemon.remove_energy(filter, count),
            None => return 0,
        };
        for energy in &moved {
            self.game.attach_energy(to, *energy);
        }
        moved.len()
    }

    /// Split generated energy among recipients as the player decides
    pub fn distribute_energy(&mut self, recipients: &[PokemonRef], energy: &[EnergyType]) -> Result<()> {
        if recipients.is_empty() || energy.is_empty() {
            return Ok(());
        }
        let player = self.player();
        let request = DistributionRequest {
            prompt: format!("distribute {} energy", energy.len()),
            amount: energy.len() as u32,
            recipients: recipients.to_vec(),
        };
        let counts = request_distribution(self.agent(player), self.game, player, &request)?;
        let mut pending = energy.iter();
        for (target, count) in recipients.iter().zip(counts) {
            for energy in pending.by_ref().take(count as usize) {
                self.attach_from_zone(target, *energy, 1)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    /// Swap a benched Pokémon into the active spot
    pub fn switch_in(&mut self, owner: PlayerId, incoming: &PokemonRef) -> bool {
        if incoming.owner != owner || incoming.position.is_active() || self.game.pokemon(incoming).is_none() {
            return false;
        }
        let outgoing = self.game.active_ref(owner);
        if let Some(out) = outgoing {
            self.game.recover_all_conditions(&out);
        }
        self.game.player_mut(owner).swap_slots(Position::Active, incoming.position);
        let from = outgoing.and_then(|r| {
            self.game
                .player(owner)
                .slot(incoming.position)
                .filter(|p| p.id == r.id)
                .map(|p| p.name().clone())
        });
        let to = match self.game.player(owner).active() {
            Some(p) => p.name().clone(),
            None => return false,
        };
        self.game.log(GameEvent::Switched { player: owner, from, to });
        true
    }

    /// Signal that the turn ends once this effect finishes
    pub fn end_turn(&mut self) {
        self.game.signal_end_of_turn();
    }
}

/// Run compiled steps in order
pub fn run_steps(ctx: &mut EffectCtx<'_>, steps: &[EffectStep]) -> Result<()> {
    for step in steps {
        step(ctx)?;
    }
    Ok(())
}

/// Execute a trainer, tool or ability effect
///
/// Effects that failed to compile still run whatever was understood, and
/// log the card as unsupported.
pub fn run_effect(game: &mut Game, agents: Agents<'_>, effect: &Effect, source: EffectSource, trigger: Option<PokemonId>) -> Result<()> {
    if !effect.compiled {
        game.log(GameEvent::UnsupportedEffect {
            player: source.player,
            card: source.card.clone(),
            text: effect.text.clone(),
        });
    }
    let ends_turn = effect.ends_turn;
    let mut ctx = EffectCtx::new(game, agents, source).with_trigger(trigger);
    run_steps(&mut ctx, &effect.steps)?;
    if ends_turn {
        ctx.end_turn();
    }
    Ok(())
}

/// Fire the abilities of `pokemon` whose trigger matches
pub fn fire_triggers(
    game: &mut Game,
    agents: Agents<'_>,
    pokemon: &[PokemonRef],
    matches: impl Fn(&Trigger) -> bool,
    trigger: Option<PokemonId>,
) -> Result<()> {
    for target in pokemon {
        let Some(card) = game.pokemon(target).map(|p| p.card.clone()) else {
            continue;
        };
        let Some(ability) = &card.ability else {
            continue;
        };
        if !matches(&ability.effect.trigger) {
            continue;
        }
        let source = EffectSource::new(
            target.owner,
            Some(target.id),
            card.name.clone(),
            Origin::Ability(ability.name.clone()),
        );
        if !ability.effect.usable(game, &source) {
            continue;
        }
        if ability.effect.optional {
            let view = GameView::new(game, target.owner);
            if !agents[target.owner.index()].confirm(&view, &ability.name) {
                continue;
            }
        }
        if !matches!(ability.effect.trigger, Trigger::Passive) {
            game.log(GameEvent::AbilityUsed {
                player: target.owner,
                pokemon: card.name.clone(),
                ability: ability.name.clone(),
            });
        }
        run_effect(game, agents, &ability.effect, source, trigger)?;
    }
    Ok(())
}

/// Abilities that apply as soon as a Pokémon is played or evolves
pub fn enter_play(game: &mut Game, agents: Agents<'_>, target: &PokemonRef) -> Result<()> {
    fire_triggers(
        game,
        agents,
        &[*target],
        |trigger| matches!(trigger, Trigger::Passive | Trigger::OnEnterPlay),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{name_key, Side};
    use crate::game::test_support::{basic, card_ref, two_player_game};
    use crate::game::ZeroAgent;
    use std::sync::Arc;

    fn source(player: PlayerId) -> EffectSource {
        EffectSource::trainer(player, "Test".into())
    }

    #[test]
    fn test_coin_slots_default_to_zero() {
        let mut game = two_player_game();
        let agent = ZeroAgent::new();
        let mut ctx = EffectCtx::new(&mut game, [&agent, &agent], source(PlayerId::FIRST));
        assert_eq!(ctx.coin_slot(3), 0);
        ctx.set_coin_slot(2, 1);
        assert_eq!(ctx.coin_slot(2), 1);
    }

    #[test]
    fn test_flip_until_tails() {
        let mut game = two_player_game();
        game.queue_coin_flips([true, true, false, true]);
        let agent = ZeroAgent::new();
        let mut ctx = EffectCtx::new(&mut game, [&agent, &agent], source(PlayerId::FIRST));
        assert_eq!(ctx.flip_coins(CoinCount::UntilTails), 2);
        assert_eq!(ctx.flip_coins(CoinCount::Fixed(1)), 1);
    }

    #[test]
    fn test_resolve_all_filters_candidates() {
        let mut game = two_player_game();
        for (name, position) in [("Squirtle", Position::Active), ("Pikachu", Position::Bench(0))] {
            let card = card_ref(&mut game, basic(name, 60));
            game.place_pokemon(PlayerId::SECOND, position, card).unwrap();
        }
        let agent = ZeroAgent::new();
        let mut ctx = EffectCtx::new(&mut game, [&agent, &agent], source(PlayerId::FIRST));
        let benched = TargetSpec::new(
            Side::Opponent,
            Selection::All,
            "each of your opponent's Benched Pokémon",
            Arc::new(|_: &Game, _: PlayerId, r: &PokemonRef| !r.position.is_active()),
        );
        let targets = ctx.resolve(&benched).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].position, Position::Bench(0));
    }

    #[test]
    fn test_switch_in_recovers_outgoing() {
        let mut game = two_player_game();
        let active = card_ref(&mut game, basic("Squirtle", 60));
        let bench = card_ref(&mut game, basic("Pikachu", 60));
        let a = game.place_pokemon(PlayerId::FIRST, Position::Active, active).unwrap();
        let b = game.place_pokemon(PlayerId::FIRST, Position::Bench(1), bench).unwrap();
        game.apply_condition(&a, SpecialCondition::Secondary(crate::core::SecondaryCondition::Poisoned));

        let agent = ZeroAgent::new();
        let mut ctx = EffectCtx::new(&mut game, [&agent, &agent], source(PlayerId::FIRST));
        assert!(ctx.switch_in(PlayerId::FIRST, &b));
        let benched = game.player(PlayerId::FIRST).slot(Position::Bench(1)).unwrap();
        assert_eq!(benched.id, a.id);
        assert!(benched.conditions().is_empty());
        assert_eq!(game.player(PlayerId::FIRST).active().map(|p| p.id), Some(b.id));
    }

    #[test]
    fn test_search_deck_moves_to_hand() {
        let mut game = two_player_game();
        for name in ["Pikachu", "Raichu", "Pikachu"] {
            let card = card_ref(&mut game, basic(name, 60));
            game.player_mut(PlayerId::FIRST).deck.add(card);
        }
        let agent = ZeroAgent::new();
        let mut ctx = EffectCtx::new(&mut game, [&agent, &agent], source(PlayerId::FIRST));
        let found = ctx
            .search_deck(PlayerId::FIRST, 1, true, &|_, card| card.name().key() == name_key("raichu"))
            .unwrap();
        assert_eq!(found, 1);
        assert_eq!(game.player(PlayerId::FIRST).hand.len(), 1);
        assert_eq!(game.player(PlayerId::FIRST).deck.len(), 2);
    }
}
