//! Ability and trainer rule tables, and the clause rules every table shares
//!
//! Shared rules cover coin flips and their outcomes, conditionals, healing,
//! special conditions, card flow, switching and energy. The ability table
//! adds trigger prefixes and passive statuses in front of them; the trainer
//! table adds timed player statuses, tools and fossils.

use crate::compiler::builder::{grant_to, on_targets, opponents_active, own_active, PlayerGrant};
use crate::compiler::conditions::source_in_active;
use crate::compiler::driver::{Rule, RuleTable};
use crate::compiler::{parse_card_filter, Bucket, ConditionGrammar, EffectBuilder, Lasting, Target, COUNT, ENERGY};
use crate::core::{
    Card, CoinCount, EffectSource, EnergyType, FossilForm, PlayerId, PokemonFilter, PokemonRef, Predicate, Side,
    SpecialCondition, Status, StatusKind, Trigger,
};
use crate::game::{EffectCtx, Game};
use regex::Captures;
use std::sync::Arc;

const CONDITION: &str = "asleep|paralyzed|confused|poisoned|burned";

/// Retreat-cost delta that waives any printed cost
const WAIVED_RETREAT_COST: i32 = -99;

/// Rules every table falls back on
pub fn shared_rules() -> Vec<Rule> {
    vec![
        // Coins and their outcomes
        Rule::new("flip-until-tails", r"flip a coin until you get tails\.", flip_until_tails),
        Rule::new("flip-one", r"flip a coin\.", flip_one),
        Rule::new("flip-many", &format!(r"flip (?P<k>{COUNT}) coins\."), flip_many),
        Rule::new("if-heads", r"if heads, (?P<body>[^.]+\.)", if_heads),
        Rule::new("if-tails", r"if tails, (?P<body>[^.]+\.)", if_tails),
        Rule::new("if-both-heads", r"if both of them are heads, (?P<body>[^.]+\.)", if_both_heads),
        Rule::new("for-each-heads", r"for each heads, (?P<body>[^.]+\.)", for_each_heads),
        // Conditions
        Rule::new(
            "only-if",
            r"you can use this (?:attack|card|ability) only if (?P<cond>[^.]+)\.",
            only_if,
        ),
        Rule::new("if-then", r"if (?P<cond>[^,]+), (?P<body>[^.]+\.)", if_then),
        // Healing and special conditions
        Rule::new("heal", r"heal (?P<n>\d+) damage from (?P<t>[^.]+?)\.", heal),
        Rule::new("recover", r"(?P<t>[^.]+?) recovers? from all special conditions\.", recover),
        Rule::new(
            "inflict",
            &format!(r"(?P<t>[^.]+?) is now (?P<c1>{CONDITION})(?:,? and (?P<c2>{CONDITION}))?\."),
            inflict,
        ),
        Rule::new(
            "make-condition",
            &format!(r"make (?P<t>[^.]+?) (?P<c1>{CONDITION})\."),
            inflict,
        ),
        // Cards
        Rule::new("draw", &format!(r"draw (?P<k>{COUNT}) cards?\."), draw),
        Rule::new(
            "discard-opponent-random",
            r"discard a random card from (?:your|the) opponent's hand\.",
            discard_opponent_random,
        ),
        Rule::new(
            "reveal-hand",
            r"(?:your opponent reveals their hand|look at your opponent's hand)\.",
            reveal_hand,
        ),
        Rule::new("look-top", &format!(r"look at the top (?P<k>{COUNT}) cards? of your deck\."), look_top),
        Rule::new(
            "search-random",
            &format!(r"put (?P<k>{COUNT}) random (?P<f>[^.]+?) from your deck into your hand\."),
            search_random,
        ),
        Rule::new(
            "search",
            &format!(r"put (?P<k>{COUNT}) (?P<f>[^.]+?) from your deck into your hand\."),
            search,
        ),
        Rule::new("shuffle-hand", r"shuffle your hand into your deck\.", shuffle_hand),
        Rule::new(
            "opponent-shuffle-draw",
            &format!(
                r"your opponent shuffles their hand into their deck and draws (?:(?P<k>{COUNT}) cards?|a card for each card they shuffled into their deck)\."
            ),
            opponent_shuffle_draw,
        ),
        Rule::new("return-to-hand", r"put (?P<t>[^.]+?) into your hand\.", return_to_hand),
        // Switching
        Rule::new(
            "gust-opponent-chooses",
            r"switch out your opponent's active pokemon to the bench\. \(your opponent chooses the new active pokemon\.\)",
            gust_opponent_chooses,
        ),
        Rule::new("gust", r"switch in (?P<t>[^.]+?) to the active spot\.", gust),
        Rule::new(
            "switch-own",
            r"switch (?:this pokemon|your active pokemon) with 1 of your benched pokemon\.",
            switch_own,
        ),
        // Energy
        Rule::new(
            "distribute",
            &format!(
                r"take (?P<k>{COUNT}) (?P<e>{ENERGY}) energy from your energy zone and attach (?:it|them) to (?P<t>[^.]+?) in any way you like\."
            ),
            distribute,
        ),
        Rule::new(
            "attach-from-zone",
            &format!(
                r"take (?P<k>{COUNT}) (?P<e>{ENERGY}) energy from your energy zone and attach (?:it|them) to (?P<t>[^.]+?)\."
            ),
            attach_from_zone,
        ),
        Rule::new(
            "move-energy",
            &format!(r"move (?P<q>an|all) (?:(?P<e>{ENERGY}) )?energy from (?P<t>[^.]+?) to your active pokemon\."),
            move_energy,
        ),
        Rule::new(
            "discard-energy",
            &format!(r"discard (?P<k>{COUNT}|all) (?:(?P<e>{ENERGY}) )?energy from (?P<t>[^.]+?)\."),
            discard_energy,
        ),
        Rule::new("direct-damage", r"do (?P<n>\d+) damage to (?P<t>[^.]+?)\.", direct_damage),
        Rule::new("turn-ends", r"your turn ends\.", turn_ends),
    ]
}

pub fn ability_table(conditions: Arc<ConditionGrammar>) -> RuleTable {
    let mut rules = vec![
        // Trigger prefixes
        Rule::new(
            "once-per-turn-active",
            r"once during your turn, if this pokemon is in the active spot, you may ",
            once_per_turn_active,
        ),
        Rule::new(
            "once-per-turn",
            r"once during your turn(?: \(before your attack\))?, you may ",
            once_per_turn,
        ),
        Rule::new(
            "as-often-as-you-like",
            r"as often as you like during your turn(?: \(before your attack\))?, you may ",
            as_often_as_you_like,
        ),
        Rule::new(
            "on-energy-attach",
            &format!(r"whenever you attach an? (?:(?P<e>{ENERGY}) )?energy from your energy zone to this pokemon, "),
            on_energy_attach,
        ),
        Rule::new(
            "after-damaged",
            r"if this pokemon is in the active spot and is damaged by an attack from your opponent's pokemon(?: \(even if this pokemon is knocked out\))?, ",
            after_damaged,
        ),
        Rule::new(
            "checkup-active",
            r"(?:during pokemon checkup|at the end of your turn), if this pokemon is in the active spot, ",
            checkup_active,
        ),
        Rule::new("checkup", r"during pokemon checkup, ", checkup),
        Rule::new(
            "on-evolve",
            r"when you play this pokemon from your hand to evolve (?:1 of )?your pokemon(?: during your turn)?, (?P<may>you may )?",
            on_evolve,
        ),
        Rule::new("active-gate", r"if this pokemon is in the active spot, ", active_gate),
        Rule::new("ability-ends-turn", r"if you use this ability, your turn ends\.", turn_ends),
        // Passive statuses
        Rule::new(
            "takes-less",
            r"this pokemon takes -(?P<n>\d+) damage from attacks\.",
            takes_less,
        ),
        Rule::new(
            "double-energy",
            &format!(
                r"each (?P<e>{ENERGY}) energy attached to your (?P<holder>{ENERGY}) pokemon provides 2 {ENERGY} energy\.(?P<ns> this effect doesn't stack\.)?"
            ),
            double_energy,
        ),
        Rule::new(
            "condition-immunity",
            r"this pokemon can't be affected by any special conditions\.",
            condition_immunity,
        ),
        Rule::new("no-retreat-cost", r"this pokemon has no retreat cost\.", no_retreat_cost),
        Rule::new(
            "active-no-retreat-cost",
            r"your active pokemon has no retreat cost\.",
            active_no_retreat_cost,
        ),
        Rule::new(
            "active-retreat-less",
            r"your active pokemon's retreat cost is (?P<n>\d+) less\.",
            active_retreat_less,
        ),
    ];
    rules.extend(shared_rules());
    RuleTable::new(rules, conditions)
}

pub fn trainer_table(conditions: Arc<ConditionGrammar>) -> RuleTable {
    let mut rules = vec![
        // Timed player statuses
        Rule::new(
            "damage-boost-this-turn",
            r"during this turn, attacks used by (?P<t>[^.]+?) do \+(?P<n>\d+) damage to your opponent's active pokemon\.",
            damage_boost_this_turn,
        ),
        Rule::new(
            "retreat-less-this-turn",
            r"during this turn, your active pokemon's retreat cost is (?P<n>\d+) less\.",
            retreat_less_this_turn,
        ),
        Rule::new(
            "team-takes-less",
            r"during your opponent's next turn, all of your pokemon take -(?P<n>\d+) damage from attacks\.",
            team_takes_less,
        ),
        Rule::new(
            "opponent-restricted",
            r"(?:during your opponent's next turn, they can't play any (?P<a>supporter|item) cards from their hand|your opponent can't (?:play|use) any (?P<b>supporter|item) cards from their hand during their next turn)\.",
            opponent_restricted,
        ),
        // Tools
        Rule::new(
            "tool-hp",
            r"the pokemon this card is attached to gets \+(?P<n>\d+) hp\.",
            tool_hp,
        ),
        Rule::new(
            "tool-counter",
            r"if the pokemon this card is attached to is in the active spot and is damaged by an attack from your opponent's pokemon, do (?P<n>\d+) damage to the attacking pokemon\.",
            tool_counter,
        ),
        Rule::new(
            "tool-takes-less",
            r"the pokemon this card is attached to takes -(?P<n>\d+) damage from attacks\.",
            takes_less,
        ),
        // Fossils
        Rule::new(
            "fossil-form",
            &format!(r"play this card as if it were an? (?P<n>\d+)-hp basic (?P<e>{ENERGY}) pokemon\."),
            fossil_form,
        ),
        Rule::new(
            "fossil-discard",
            r"at any time during your turn, you may discard this card from play\.",
            nothing,
        ),
        Rule::new("cant-retreat", r"this card can't retreat\.", cant_retreat),
    ];
    rules.extend(shared_rules());
    RuleTable::new(rules, conditions)
}

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

fn number(caps: &Captures<'_>, name: &str) -> i32 {
    caps.name(name).and_then(|m| m.as_str().parse().ok()).unwrap_or(0)
}

/// "all" counts as everything
fn amount(b: &mut EffectBuilder<'_>, word: &str) -> Option<usize> {
    if word.eq_ignore_ascii_case("all") {
        return Some(usize::MAX);
    }
    b.count(word)
}

fn optional_energy(b: &mut EffectBuilder<'_>, caps: &Captures<'_>, name: &str) -> Option<EnergyType> {
    caps.name(name).and_then(|m| b.energy(m.as_str()))
}

fn done() -> String {
    String::new()
}

fn nothing(_: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    done()
}

fn holds(predicate: Predicate) -> impl Fn(&EffectCtx<'_>) -> bool + Send + Sync {
    move |ctx: &EffectCtx<'_>| predicate(&*ctx.game, &ctx.source)
}

// ----------------------------------------------------------------------
// Coins and conditions
// ----------------------------------------------------------------------

fn flip_one(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.flip(CoinCount::Fixed(1));
    done()
}

fn flip_many(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(k) = b.count(&caps["k"]) {
        b.flip(CoinCount::Fixed(k as u32));
    }
    done()
}

fn flip_until_tails(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.flip(CoinCount::UntilTails);
    done()
}

/// Compile `body` to run when the last flip's heads pass `test`
fn outcome(b: &mut EffectBuilder<'_>, body: &str, test: fn(u32, CoinCount) -> bool) -> String {
    let Some((slot, coins)) = b.take_coin_slot() else {
        return done();
    };
    let child = b.nested(body);
    b.merge_gated(child, Arc::new(move |ctx: &EffectCtx<'_>| test(ctx.coin_slot(slot), coins)));
    done()
}

fn if_heads(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    outcome(b, &caps["body"], |heads, _| heads > 0)
}

fn if_tails(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    outcome(b, &caps["body"], |heads, coins| match coins {
        CoinCount::Fixed(n) => heads < n,
        _ => heads == 0,
    })
}

fn if_both_heads(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    outcome(b, &caps["body"], |heads, _| heads >= 2)
}

fn for_each_heads(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let Some((slot, _)) = b.take_coin_slot() else {
        return done();
    };
    let child = b.nested(&caps["body"]);
    b.merge_repeated(child, slot);
    done()
}

fn only_if(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(check) = b.condition(&caps["cond"]) {
        b.preconditions.push(check);
    }
    done()
}

fn if_then(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let Some(check) = b.condition(&caps["cond"]) else {
        return done();
    };
    let child = b.nested(&caps["body"]);
    b.merge_gated(child, Arc::new(holds(check)));
    done()
}

// ----------------------------------------------------------------------
// Healing and special conditions
// ----------------------------------------------------------------------

fn heal(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let amount = number(caps, "n");
    if let Some(target) = b.target(&caps["t"]) {
        b.push(
            Bucket::Side,
            on_targets(target, move |ctx, pokemon| {
                ctx.heal(pokemon, amount);
                Ok(())
            }),
        );
    }
    done()
}

fn recover(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(target) = b.target(&caps["t"]) {
        b.push(
            Bucket::Side,
            on_targets(target, |ctx, pokemon| {
                ctx.game.recover_all_conditions(pokemon);
                Ok(())
            }),
        );
    }
    done()
}

fn inflict(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let conditions: Vec<SpecialCondition> = ["c1", "c2"]
        .iter()
        .filter_map(|name| caps.name(name))
        .filter_map(|m| SpecialCondition::parse(m.as_str()))
        .collect();
    if let Some(target) = b.target(&caps["t"]) {
        b.push(
            Bucket::Side,
            on_targets(target, move |ctx, pokemon| {
                for condition in &conditions {
                    ctx.apply_condition(pokemon, *condition);
                }
                Ok(())
            }),
        );
    }
    done()
}

// ----------------------------------------------------------------------
// Cards
// ----------------------------------------------------------------------

fn draw(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(count) = b.count(&caps["k"]) {
        b.push(
            Bucket::Side,
            Arc::new(move |ctx: &mut EffectCtx<'_>| {
                let player = ctx.player();
                ctx.draw(player, count);
                Ok(())
            }),
        );
    }
    done()
}

fn discard_opponent_random(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(
        Bucket::Side,
        Arc::new(|ctx: &mut EffectCtx<'_>| {
            let opponent = ctx.opponent();
            ctx.discard_random_from_hand(opponent, 1);
            Ok(())
        }),
    );
    done()
}

fn reveal_hand(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(
        Bucket::Side,
        Arc::new(|ctx: &mut EffectCtx<'_>| {
            let (owner, viewer) = (ctx.opponent(), ctx.player());
            ctx.reveal_hand(owner, viewer);
            Ok(())
        }),
    );
    done()
}

fn look_top(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(count) = b.count(&caps["k"]) {
        b.push(
            Bucket::Side,
            Arc::new(move |ctx: &mut EffectCtx<'_>| {
                let player = ctx.player();
                ctx.look_at_top(player, player, count);
                Ok(())
            }),
        );
    }
    done()
}

fn search_with(b: &mut EffectBuilder<'_>, caps: &Captures<'_>, random: bool) -> String {
    let Some(count) = b.count(&caps["k"]) else {
        return done();
    };
    let Some(filter) = parse_card_filter(&caps["f"]) else {
        b.fail(format!("unknown card phrase: {}", &caps["f"]));
        return done();
    };
    b.push(
        Bucket::Side,
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            let player = ctx.player();
            ctx.search_deck(player, count, random, &|_: &Game, card: &Card| filter(card))?;
            Ok(())
        }),
    );
    done()
}

fn search_random(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    search_with(b, caps, true)
}

fn search(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    search_with(b, caps, false)
}

fn shuffle_hand(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(
        Bucket::Side,
        Arc::new(|ctx: &mut EffectCtx<'_>| {
            let player = ctx.player();
            ctx.shuffle_hand_into_deck(player);
            Ok(())
        }),
    );
    done()
}

fn opponent_shuffle_draw(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let fixed = match caps.name("k") {
        Some(m) => match b.count(m.as_str()) {
            Some(count) => Some(count),
            None => return done(),
        },
        None => None,
    };
    b.push(
        Bucket::Side,
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            let opponent = ctx.opponent();
            let shuffled = ctx.shuffle_hand_into_deck(opponent);
            ctx.draw(opponent, fixed.unwrap_or(shuffled));
            Ok(())
        }),
    );
    done()
}

fn return_to_hand(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(target) = b.target(&caps["t"]) {
        b.push(
            Bucket::Side,
            on_targets(target, |ctx, pokemon| {
                ctx.return_to_hand(pokemon);
                Ok(())
            }),
        );
    }
    done()
}

// ----------------------------------------------------------------------
// Switching
// ----------------------------------------------------------------------

fn gust_opponent_chooses(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(
        Bucket::Side,
        Arc::new(|ctx: &mut EffectCtx<'_>| {
            if ctx.defender_ref().is_some_and(|defender| ctx.shielded(&defender)) {
                return Ok(());
            }
            let opponent = ctx.opponent();
            let bench = ctx.game.bench_refs(opponent);
            if bench.is_empty() {
                return Ok(());
            }
            if let Some(incoming) = ctx.choose_pokemon(opponent, "choose your new Active Pokémon", &bench)? {
                ctx.switch_in(opponent, &incoming);
            }
            Ok(())
        }),
    );
    done()
}

fn gust(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(target) = b.target(&caps["t"]) {
        b.push(
            Bucket::Side,
            on_targets(target, |ctx, pokemon| {
                ctx.switch_in(pokemon.owner, pokemon);
                Ok(())
            }),
        );
    }
    done()
}

fn switch_own(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(
        Bucket::Side,
        Arc::new(|ctx: &mut EffectCtx<'_>| {
            let player = ctx.player();
            let bench = ctx.game.bench_refs(player);
            if bench.is_empty() {
                return Ok(());
            }
            if let Some(incoming) = ctx.choose_pokemon(player, "choose a Benched Pokémon to switch in", &bench)? {
                ctx.switch_in(player, &incoming);
            }
            Ok(())
        }),
    );
    done()
}

// ----------------------------------------------------------------------
// Energy and damage
// ----------------------------------------------------------------------

fn distribute(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let (Some(count), Some(energy), Some(target)) = (b.count(&caps["k"]), b.energy(&caps["e"]), b.target(&caps["t"])) else {
        return done();
    };
    b.push(
        Bucket::Side,
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            let recipients = target.resolve(ctx)?;
            ctx.distribute_energy(&recipients, &vec![energy; count])
        }),
    );
    done()
}

fn attach_from_zone(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let (Some(count), Some(energy), Some(target)) = (b.count(&caps["k"]), b.energy(&caps["e"]), b.target(&caps["t"])) else {
        return done();
    };
    b.push(Bucket::Side, on_targets(target, move |ctx, pokemon| ctx.attach_from_zone(pokemon, energy, count)));
    done()
}

fn move_energy(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let count = if caps["q"].eq_ignore_ascii_case("all") { usize::MAX } else { 1 };
    let energy = optional_energy(b, caps, "e");
    let Some(target) = b.target(&caps["t"]) else {
        return done();
    };
    b.push(
        Bucket::Side,
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            let player = ctx.player();
            let Some(active) = ctx.game.active_ref(player) else {
                return Ok(());
            };
            for from in target.resolve(ctx)? {
                if from.id != active.id {
                    ctx.move_energy(&from, &active, energy, count);
                }
            }
            Ok(())
        }),
    );
    done()
}

fn discard_energy(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let energy = optional_energy(b, caps, "e");
    let (Some(count), Some(target)) = (amount(b, &caps["k"]), b.target(&caps["t"])) else {
        return done();
    };
    b.push(
        Bucket::Side,
        on_targets(target, move |ctx, pokemon| {
            let discarded = ctx.discard_energy(pokemon, energy, count);
            if let Some(state) = ctx.attack.as_mut() {
                state.remembered += discarded as i32;
            }
            Ok(())
        }),
    );
    done()
}

fn direct_damage(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let amount = number(caps, "n");
    if let Some(target) = b.target(&caps["t"]) {
        b.push(
            Bucket::Side,
            on_targets(target, move |ctx, pokemon| {
                ctx.direct_damage(pokemon, amount);
                Ok(())
            }),
        );
    }
    done()
}

fn turn_ends(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.ends_turn = true;
    done()
}

// ----------------------------------------------------------------------
// Ability triggers
// ----------------------------------------------------------------------

fn set_trigger(b: &mut EffectBuilder<'_>, trigger: Trigger) {
    if b.trigger.replace(trigger).is_some() {
        b.fail("ability has two triggers");
    }
}

fn once_per_turn_active(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    set_trigger(b, Trigger::Manual { once_per_turn: true });
    b.preconditions.push(source_in_active());
    done()
}

fn once_per_turn(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    set_trigger(b, Trigger::Manual { once_per_turn: true });
    done()
}

fn as_often_as_you_like(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    set_trigger(b, Trigger::Manual { once_per_turn: false });
    done()
}

fn on_energy_attach(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let energy = optional_energy(b, caps, "e");
    set_trigger(b, Trigger::OnEnergyAttach(energy));
    done()
}

fn after_damaged(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    set_trigger(b, Trigger::AfterDamaged);
    b.preconditions.push(source_in_active());
    done()
}

fn checkup_active(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    set_trigger(b, Trigger::OnCheckup);
    b.preconditions.push(source_in_active());
    done()
}

fn checkup(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    set_trigger(b, Trigger::OnCheckup);
    done()
}

fn on_evolve(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    set_trigger(b, Trigger::OnEnterPlay);
    b.optional = caps.name("may").is_some();
    b.preconditions.push(Arc::new(|game: &Game, source: &EffectSource| {
        source
            .pokemon
            .and_then(|id| game.locate(id))
            .and_then(|r| game.pokemon(&r))
            .is_some_and(|p| p.cards.len() > 1)
    }));
    done()
}

fn active_gate(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.preconditions.push(source_in_active());
    done()
}

// ----------------------------------------------------------------------
// Passive statuses
// ----------------------------------------------------------------------

fn takes_less(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::DamageReduction(n), Lasting::UntilRemoved));
    done()
}

fn double_energy(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let (Some(energy), Some(holder)) = (b.energy(&caps["e"]), b.energy(&caps["holder"])) else {
        return done();
    };
    let covers: PokemonFilter = Arc::new(move |game: &Game, _: PlayerId, target: &PokemonRef| {
        game.pokemon(target).is_some_and(|p| p.card.energy_type == holder)
    });
    let mut grant =
        PlayerGrant::new(Side::Own, StatusKind::DoubleEnergy(energy), Lasting::UntilRemoved).covering(covers);
    if caps.name("ns").is_some() {
        grant = grant.non_stacking();
    }
    b.push(Bucket::Side, grant.step());
    done()
}

fn condition_immunity(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::ConditionImmunity, Lasting::UntilRemoved));
    done()
}

fn no_retreat_cost(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(
        Bucket::Side,
        on_targets(Target::This, |ctx, pokemon| {
            let printed = ctx.game.pokemon(pokemon).map_or(0, |p| p.card.retreat_cost as i32);
            let status = Status::new(
                StatusKind::RetreatCostDelta(-printed),
                ctx.source.status_source(),
                Lasting::UntilRemoved.duration(ctx.game.turn),
            );
            ctx.grant_status(pokemon, status);
            Ok(())
        }),
    );
    done()
}

fn active_no_retreat_cost(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    let grant = PlayerGrant::new(Side::Own, StatusKind::RetreatCostDelta(WAIVED_RETREAT_COST), Lasting::UntilRemoved)
        .covering(own_active())
        .non_stacking();
    b.push(Bucket::Side, grant.step());
    done()
}

fn active_retreat_less(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    let grant = PlayerGrant::new(Side::Own, StatusKind::RetreatCostDelta(-n), Lasting::UntilRemoved)
        .covering(own_active())
        .non_stacking();
    b.push(Bucket::Side, grant.step());
    done()
}

// ----------------------------------------------------------------------
// Trainer statuses, tools and fossils
// ----------------------------------------------------------------------

fn damage_boost_this_turn(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    let Some(target) = b.target(&caps["t"]) else {
        return done();
    };
    let Some(covers) = target.filter() else {
        b.fail(format!("boost needs a Pokémon phrase: {}", &caps["t"]));
        return done();
    };
    let grant = PlayerGrant::new(Side::Own, StatusKind::DamageBoost(n), Lasting::ThisTurn)
        .covering(covers)
        .against(opponents_active());
    b.push(Bucket::Side, grant.step());
    done()
}

fn retreat_less_this_turn(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    let grant = PlayerGrant::new(Side::Own, StatusKind::RetreatCostDelta(-n), Lasting::ThisTurn).covering(own_active());
    b.push(Bucket::Side, grant.step());
    done()
}

fn team_takes_less(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    let everyone: PokemonFilter = Arc::new(|_: &Game, _: PlayerId, _: &PokemonRef| true);
    let grant =
        PlayerGrant::new(Side::Own, StatusKind::DamageReduction(n), Lasting::OpponentsNextTurn).covering(everyone);
    b.push(Bucket::Side, grant.step());
    done()
}

fn opponent_restricted(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let kind = caps.name("a").or_else(|| caps.name("b")).map(|m| m.as_str().to_lowercase());
    let kind = match kind.as_deref() {
        Some("item") => StatusKind::NoItems,
        _ => StatusKind::NoSupporters,
    };
    b.push(Bucket::Side, PlayerGrant::new(Side::Opponent, kind, Lasting::OpponentsNextTurn).step());
    done()
}

fn tool_hp(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::MaxHpBonus(n), Lasting::UntilRemoved));
    done()
}

fn tool_counter(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::CounterDamage(n), Lasting::UntilRemoved));
    done()
}

fn fossil_form(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let hp = number(caps, "n");
    if let Some(energy_type) = b.energy(&caps["e"]) {
        b.fossil = Some(FossilForm { hp, energy_type });
    }
    done()
}

fn cant_retreat(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::CannotRetreat, Lasting::UntilRemoved));
    done()
}
