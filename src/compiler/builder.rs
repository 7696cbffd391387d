//! The effect under construction
//!
//! Rule handlers write into an `EffectBuilder`. Besides the finished parts
//! (damage, effect buckets, trigger, preconditions) it carries clause state
//! that one rule leaves for the next: a coin flip whose outcome clause has
//! not been read yet, and the slot holding the last flip's heads.

use crate::compiler::driver::RuleTable;
use crate::compiler::{count_word, parse_target, Compiled, Target};
use crate::core::{
    Attack, AttackState, CoinCount, DamageCalc, DamageShape, Effect, EffectSource, EffectStep,
    EnergyType, FossilForm, PlayerId, PlayerStatus, PokemonFilter, PokemonRef, Predicate, Side, Status,
    StatusDuration, StatusKind, Trigger,
};
use crate::game::context::run_steps;
use crate::game::{EffectCtx, Game};
use crate::Result;
use std::sync::Arc;

/// A check made inside a running effect
pub type Gate = Arc<dyn Fn(&EffectCtx<'_>) -> bool + Send + Sync>;

/// Which rule table, and so which defaults, a builder serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Attack,
    Ability,
    Trainer,
}

/// The three attack effect lists, run in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    PreDamage,
    Attacking,
    Side,
}

/// How long a granted status lasts, as phrased on cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lasting {
    UntilRemoved,
    /// "during this turn"
    ThisTurn,
    /// "during your opponent's next turn"
    OpponentsNextTurn,
    /// "during your next turn"
    YourNextTurn,
}

impl Lasting {
    pub fn duration(self, turn: u32) -> StatusDuration {
        match self {
            Lasting::UntilRemoved => StatusDuration::UntilRemoved,
            Lasting::ThisTurn => StatusDuration::Checkups(1),
            Lasting::OpponentsNextTurn => StatusDuration::ThroughNextTurn { granted_turn: turn },
            Lasting::YourNextTurn => StatusDuration::ThroughNextTurn { granted_turn: turn + 1 },
        }
    }
}

pub struct EffectBuilder<'t> {
    table: &'t RuleTable,
    pub mode: Mode,
    pub base_damage: i32,
    /// Explicit shape; derived from the damage when unset
    pub shape: Option<DamageShape>,
    pub coins: Option<CoinCount>,
    pub damage: Option<DamageCalc>,
    pub random_damage: bool,
    pub pre_damage: Vec<EffectStep>,
    pub attacking: Vec<EffectStep>,
    pub side: Vec<EffectStep>,
    pub preconditions: Vec<Predicate>,
    pub trigger: Option<Trigger>,
    pub ends_turn: bool,
    pub optional: bool,
    pub fossil: Option<FossilForm>,
    /// A flip announced by "Flip a coin." and not yet consumed
    pub pending_coin: Option<CoinCount>,
    last_coin: Option<(usize, CoinCount)>,
    next_slot: usize,
    failures: Vec<String>,
    unmatched: Vec<String>,
}

impl<'t> EffectBuilder<'t> {
    pub fn new(table: &'t RuleTable, mode: Mode) -> Self {
        EffectBuilder {
            table,
            mode,
            base_damage: 0,
            shape: None,
            coins: None,
            damage: None,
            random_damage: false,
            pre_damage: Vec::new(),
            attacking: Vec::new(),
            side: Vec::new(),
            preconditions: Vec::new(),
            trigger: None,
            ends_turn: false,
            optional: false,
            fossil: None,
            pending_coin: None,
            last_coin: None,
            next_slot: 0,
            failures: Vec::new(),
            unmatched: Vec::new(),
        }
    }

    pub fn table(&self) -> &'t RuleTable {
        self.table
    }

    // ------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------

    /// Outside of attacks there is only one list
    pub fn push(&mut self, bucket: Bucket, step: EffectStep) {
        let list = match (self.mode, bucket) {
            (Mode::Attack, Bucket::PreDamage) => &mut self.pre_damage,
            (Mode::Attack, Bucket::Attacking) => &mut self.attacking,
            _ => &mut self.side,
        };
        list.push(step);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.failures.push(reason.into());
    }

    pub fn unmatched(&mut self, text: impl Into<String>) {
        self.unmatched.push(text.into());
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty() && self.unmatched.is_empty()
    }

    pub fn unmatched_text(&self) -> &[String] {
        &self.unmatched
    }

    /// Unmatched fragments and failure reasons, for the compile report
    fn problems(&self) -> Vec<String> {
        self.unmatched.iter().chain(&self.failures).cloned().collect()
    }

    // ------------------------------------------------------------------
    // Sub-grammars
    // ------------------------------------------------------------------

    pub fn target(&mut self, text: &str) -> Option<Target> {
        let target = parse_target(text);
        if target.is_none() {
            self.fail(format!("unknown target: {text}"));
        }
        target
    }

    pub fn condition(&mut self, text: &str) -> Option<Predicate> {
        let condition = self.table.conditions.parse(text);
        if condition.is_none() {
            self.fail(format!("unknown condition: {text}"));
        }
        condition
    }

    pub fn count(&mut self, word: &str) -> Option<usize> {
        let count = count_word(word);
        if count.is_none() {
            self.fail(format!("unknown count: {word}"));
        }
        count
    }

    pub fn energy(&mut self, word: &str) -> Option<EnergyType> {
        match word.parse() {
            Ok(energy) => Some(energy),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Coins
    // ------------------------------------------------------------------

    /// Announce a flip; the next outcome clause decides what it does
    pub fn flip(&mut self, coins: CoinCount) {
        if self.pending_coin.replace(coins).is_some() {
            self.fail("coin flip with no outcome");
        }
    }

    /// The slot an outcome clause reads its heads from
    ///
    /// Consumes a pending flip by emitting the step that performs it; a
    /// second outcome clause for the same flip reuses the last slot.
    pub fn take_coin_slot(&mut self) -> Option<(usize, CoinCount)> {
        if let Some(coins) = self.pending_coin.take() {
            let slot = self.next_slot;
            self.next_slot += 1;
            self.push(
                Bucket::PreDamage,
                Arc::new(move |ctx: &mut EffectCtx<'_>| {
                    let heads = ctx.flip_coins(coins);
                    ctx.set_coin_slot(slot, heads);
                    Ok(())
                }),
            );
            self.last_coin = Some((slot, coins));
            return self.last_coin;
        }
        if self.last_coin.is_none() {
            self.fail("coin outcome with no flip");
        }
        self.last_coin
    }

    /// The attack's own coins, flipped before any effect runs
    pub fn set_attack_coins(&mut self, coins: CoinCount, shape: DamageShape) {
        if self.coins.replace(coins).is_some() {
            self.fail("attack flips coins twice");
        }
        self.shape = Some(shape);
        self.random_damage = true;
    }

    // ------------------------------------------------------------------
    // Damage
    // ------------------------------------------------------------------

    fn current_damage(&self) -> DamageCalc {
        self.damage
            .clone()
            .unwrap_or_else(|| Arc::new(|_: &Game, _: &EffectSource, state: &AttackState| state.base_damage))
    }

    /// Add to whatever the damage currently is
    pub fn add_damage(&mut self, extra: DamageCalc) {
        let base = self.current_damage();
        self.damage = Some(Arc::new(move |game: &Game, source: &EffectSource, state: &AttackState| {
            base(game, source, state) + extra(game, source, state)
        }));
    }

    /// Replace the damage outright ("this attack does 30 damage for each ...")
    pub fn set_damage(&mut self, calc: DamageCalc) {
        self.damage = Some(calc);
        if self.shape.is_none() {
            self.shape = Some(DamageShape::Predetermined);
        }
    }

    // ------------------------------------------------------------------
    // Nesting
    // ------------------------------------------------------------------

    /// Compile a clause body ("if heads, ...") with the same table
    pub fn nested(&mut self, body: &str) -> EffectBuilder<'t> {
        let table = self.table;
        let mut child = EffectBuilder::new(table, self.mode);
        child.next_slot = self.next_slot;
        table.drive(&mut child, body);
        self.next_slot = child.next_slot;
        child
    }

    /// Take over a child's problems and hand back its buckets
    fn absorb(&mut self, mut child: EffectBuilder<'t>) -> [(Bucket, Vec<EffectStep>); 3] {
        self.failures.append(&mut child.failures);
        self.unmatched.append(&mut child.unmatched);
        if child.damage.is_some() || child.coins.is_some() {
            self.fail("damage change inside a conditional clause");
        }
        if child.trigger.is_some() || !child.preconditions.is_empty() {
            self.fail("trigger inside a conditional clause");
        }
        if child.ends_turn {
            child.side.push(Arc::new(|ctx: &mut EffectCtx<'_>| {
                ctx.end_turn();
                Ok(())
            }));
        }
        [
            (Bucket::PreDamage, child.pre_damage),
            (Bucket::Attacking, child.attacking),
            (Bucket::Side, child.side),
        ]
    }

    /// Run the child's steps only when `gate` holds at that point
    pub fn merge_gated(&mut self, child: EffectBuilder<'t>, gate: Gate) {
        for (bucket, steps) in self.absorb(child) {
            if steps.is_empty() {
                continue;
            }
            let gate = gate.clone();
            self.push(
                bucket,
                Arc::new(move |ctx: &mut EffectCtx<'_>| if gate(&*ctx) { run_steps(ctx, &steps) } else { Ok(()) }),
            );
        }
    }

    /// Run the child's steps once per heads counted in `slot`
    pub fn merge_repeated(&mut self, child: EffectBuilder<'t>, slot: usize) {
        for (bucket, steps) in self.absorb(child) {
            if steps.is_empty() {
                continue;
            }
            self.push(
                bucket,
                Arc::new(move |ctx: &mut EffectCtx<'_>| {
                    for _ in 0..ctx.coin_slot(slot) {
                        run_steps(ctx, &steps)?;
                    }
                    Ok(())
                }),
            );
        }
    }

    // ------------------------------------------------------------------
    // Finishing
    // ------------------------------------------------------------------

    pub fn finish_attack(self, name: &str, cost: &[EnergyType], text: &str) -> Compiled<Attack> {
        let ok = self.is_ok();
        let unmatched = self.problems();
        let shape = self.shape.unwrap_or(if self.base_damage > 0 || self.damage.is_some() {
            DamageShape::Predetermined
        } else {
            DamageShape::None
        });
        let attack = Attack {
            name: name.to_string(),
            cost: cost.iter().copied().collect(),
            base_damage: self.base_damage,
            text: text.to_string(),
            shape,
            coins: self.coins,
            damage: self.damage,
            pre_damage: self.pre_damage,
            attacking: self.attacking,
            side: self.side,
            preconditions: self.preconditions,
            random_damage: self.random_damage,
            compiled: ok,
        };
        Compiled { value: attack, ok, unmatched }
    }

    pub fn finish_effect(self, text: &str, default_trigger: Trigger) -> Compiled<Effect> {
        let ok = self.is_ok();
        let unmatched = self.problems();
        let mut effect = Effect::new(text, self.trigger.unwrap_or(default_trigger));
        effect.preconditions = self.preconditions;
        effect.steps = self.side;
        effect.ends_turn = self.ends_turn;
        effect.optional = self.optional;
        effect.compiled = ok;
        Compiled { value: effect, ok, unmatched }
    }
}

// ----------------------------------------------------------------------
// Step constructors shared by the rule tables
// ----------------------------------------------------------------------

/// Apply `apply` to every Pokémon the target resolves to
pub fn on_targets<F>(target: Target, apply: F) -> EffectStep
where
    F: Fn(&mut EffectCtx<'_>, &PokemonRef) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |ctx: &mut EffectCtx<'_>| {
        for pokemon in target.resolve(ctx)? {
            apply(ctx, &pokemon)?;
        }
        Ok(())
    })
}

/// Grant a Pokémon-level status to every target
pub fn grant_to(target: Target, kind: StatusKind, lasting: Lasting) -> EffectStep {
    on_targets(target, move |ctx, pokemon| {
        let status = Status::new(kind, ctx.source.status_source(), lasting.duration(ctx.game.turn));
        ctx.grant_status(pokemon, status);
        Ok(())
    })
}

/// A player-level status described by a card
#[derive(Clone)]
pub struct PlayerGrant {
    pub whose: Side,
    pub kind: StatusKind,
    pub lasting: Lasting,
    pub covers: Option<PokemonFilter>,
    pub counterpart: Option<PokemonFilter>,
    /// Copies granted under the same card name count once
    pub non_stacking: bool,
}

impl PlayerGrant {
    pub fn new(whose: Side, kind: StatusKind, lasting: Lasting) -> Self {
        PlayerGrant {
            whose,
            kind,
            lasting,
            covers: None,
            counterpart: None,
            non_stacking: false,
        }
    }

    pub fn covering(mut self, filter: PokemonFilter) -> Self {
        self.covers = Some(filter);
        self
    }

    pub fn against(mut self, filter: PokemonFilter) -> Self {
        self.counterpart = Some(filter);
        self
    }

    pub fn non_stacking(mut self) -> Self {
        self.non_stacking = true;
        self
    }

    pub fn step(self) -> EffectStep {
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            let player = match self.whose {
                Side::Opponent => ctx.opponent(),
                _ => ctx.player(),
            };
            let mut status = Status::new(self.kind, ctx.source.status_source(), self.lasting.duration(ctx.game.turn));
            if self.non_stacking {
                status = status.non_stacking(ctx.source.card.key());
            }
            if let Some(counterpart) = &self.counterpart {
                status = status.against(counterpart.clone());
            }
            ctx.grant_player_status(player, PlayerStatus { status, covers: self.covers.clone() });
            Ok(())
        })
    }
}

/// Live filter: the viewer's opponent's active Pokémon
pub fn opponents_active() -> PokemonFilter {
    Arc::new(|_: &Game, viewer: PlayerId, target: &PokemonRef| target.owner != viewer && target.position.is_active())
}

/// Live filter: the viewer's own active Pokémon
pub fn own_active() -> PokemonFilter {
    Arc::new(|_: &Game, viewer: PlayerId, target: &PokemonRef| target.owner == viewer && target.position.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{ConditionGrammar, Rule};
    use crate::game::test_support::two_player_game;
    use crate::game::ZeroAgent;

    fn empty_table() -> RuleTable {
        RuleTable::new(Vec::<Rule>::new(), Arc::new(ConditionGrammar::new()))
    }

    #[test]
    fn test_lasting_durations() {
        assert_eq!(Lasting::ThisTurn.duration(4), StatusDuration::Checkups(1));
        assert_eq!(Lasting::OpponentsNextTurn.duration(4), StatusDuration::ThroughNextTurn { granted_turn: 4 });
        assert_eq!(Lasting::YourNextTurn.duration(4), StatusDuration::ThroughNextTurn { granted_turn: 5 });
    }

    #[test]
    fn test_non_attack_steps_share_one_list() {
        let table = empty_table();
        let mut builder = EffectBuilder::new(&table, Mode::Trainer);
        builder.push(Bucket::PreDamage, Arc::new(|_: &mut EffectCtx<'_>| Ok(())));
        builder.push(Bucket::Attacking, Arc::new(|_: &mut EffectCtx<'_>| Ok(())));
        assert_eq!(builder.side.len(), 2);
        assert!(builder.pre_damage.is_empty());
    }

    #[test]
    fn test_outcome_without_flip_fails() {
        let table = empty_table();
        let mut builder = EffectBuilder::new(&table, Mode::Attack);
        assert!(builder.take_coin_slot().is_none());
        assert!(!builder.is_ok());
    }

    #[test]
    fn test_second_outcome_reuses_slot() {
        let table = empty_table();
        let mut builder = EffectBuilder::new(&table, Mode::Attack);
        builder.flip(CoinCount::Fixed(1));
        let first = builder.take_coin_slot();
        let second = builder.take_coin_slot();
        assert_eq!(first.map(|(slot, _)| slot), Some(0));
        assert_eq!(second.map(|(slot, _)| slot), Some(0));
        assert_eq!(builder.pre_damage.len(), 1);
        assert!(builder.is_ok());
    }

    #[test]
    fn test_gated_merge_runs_on_heads_only() {
        let table = empty_table();
        let mut builder = EffectBuilder::new(&table, Mode::Trainer);
        builder.flip(CoinCount::Fixed(1));
        let (slot, _) = builder.take_coin_slot().unwrap();
        let mut child = EffectBuilder::new(&table, Mode::Trainer);
        child.push(
            Bucket::Side,
            Arc::new(|ctx: &mut EffectCtx<'_>| {
                ctx.draw(PlayerId::FIRST, 1);
                Ok(())
            }),
        );
        builder.merge_gated(child, Arc::new(move |ctx: &EffectCtx<'_>| ctx.coin_slot(slot) > 0));
        let effect = builder.finish_effect("test", Trigger::OnPlay).value;

        for (flip, drawn) in [(true, 1), (false, 0)] {
            let mut game = two_player_game();
            let card = crate::game::test_support::card_ref(&mut game, crate::game::test_support::basic("Pikachu", 60));
            game.player_mut(PlayerId::FIRST).deck.add(card);
            game.queue_coin_flips([flip]);
            let agent = ZeroAgent::new();
            let mut ctx = EffectCtx::new(&mut game, [&agent, &agent], EffectSource::trainer(PlayerId::FIRST, "Test".into()));
            run_steps(&mut ctx, &effect.steps).unwrap();
            assert_eq!(game.player(PlayerId::FIRST).hand.len(), drawn);
        }
    }

    #[test]
    fn test_add_damage_composes() {
        let table = empty_table();
        let mut builder = EffectBuilder::new(&table, Mode::Attack);
        builder.base_damage = 30;
        builder.add_damage(Arc::new(|_: &Game, _: &EffectSource, state: &AttackState| state.heads as i32 * 10));
        builder.add_damage(Arc::new(|_: &Game, _: &EffectSource, _: &AttackState| 5));
        let attack = builder.finish_attack("Test", &[], "").value;
        let calc = attack.damage.clone().unwrap();
        let game = two_player_game();
        let mut state = AttackState::new(crate::core::PokemonId::new(1), crate::core::PokemonId::new(2), &attack);
        state.heads = 2;
        let source = EffectSource::trainer(PlayerId::FIRST, "Test".into());
        assert_eq!(calc(&game, &source, &state), 55);
    }
}
