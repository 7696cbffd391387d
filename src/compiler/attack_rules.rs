//! Attack rule table
//!
//! Attack text mostly changes how much damage the attack does: coin shapes,
//! per-count scaling, conditional bonuses. Everything else (conditions,
//! energy, switching) falls through to the shared rules.

use crate::compiler::builder::grant_to;
use crate::compiler::driver::{Rule, RuleTable};
use crate::compiler::effect_rules::shared_rules;
use crate::compiler::{Bucket, ConditionGrammar, EffectBuilder, Lasting, Target, COUNT, ENERGY};
use crate::core::{AttackState, CoinCount, DamageCalc, DamageShape, EffectSource, PokemonRef, StatusKind};
use crate::game::{EffectCtx, Game};
use regex::Captures;
use std::sync::Arc;

const WHOSE: &str = r"(?P<w>this pokemon|your opponent's active pokemon|the defending pokemon)";

pub fn table(conditions: Arc<ConditionGrammar>) -> RuleTable {
    let mut rules = vec![
        // Coin shapes
        Rule::new(
            "coins-scaled",
            &format!(r"flip (?P<k>{COUNT}) coins?\. this attack does (?P<d>\d+) damage for each heads\."),
            coins_scaled,
        ),
        Rule::new(
            "until-tails-scaled",
            r"flip a coin until you get tails\. this attack does (?P<d>\d+) damage for each heads\.",
            until_tails_scaled,
        ),
        Rule::new(
            "until-tails-more",
            r"flip a coin until you get tails\. this attack does (?P<d>\d+) more damage for each heads\.",
            until_tails_more,
        ),
        Rule::new(
            "energy-coins-scaled",
            &format!(
                r"flip a coin for each (?:(?P<e>{ENERGY}) )?energy attached to this pokemon\. this attack does (?P<d>\d+) damage for each heads\."
            ),
            energy_coins_scaled,
        ),
        Rule::new(
            "coins-more",
            &format!(r"flip (?P<k>{COUNT}) coins?\. this attack does (?P<d>\d+) more damage for each heads\."),
            coins_more,
        ),
        Rule::new(
            "heads-more",
            r"flip a coin\. if heads, this attack does (?P<d>\d+) more damage\.",
            heads_more,
        ),
        Rule::new(
            "both-heads-more",
            &format!(r"flip (?P<k>{COUNT}) coins\. if both of them are heads, this attack does (?P<d>\d+) more damage\."),
            both_heads_more,
        ),
        Rule::new("tails-nothing", r"flip a coin\. if tails, this attack does nothing\.", tails_nothing),
        // Per-count damage
        Rule::new(
            "per-benched",
            &format!(
                r"this attack does (?P<d>\d+) (?P<more>more )?damage for each of (?P<w>your|your opponent's) benched (?:(?P<e>{ENERGY}) )?pokemon\."
            ),
            per_benched,
        ),
        Rule::new(
            "per-energy",
            &format!(
                r"this attack does (?P<d>\d+) (?P<more>more )?damage for each (?:(?P<e>{ENERGY}) )?energy attached to {WHOSE}\."
            ),
            per_energy,
        ),
        Rule::new(
            "per-damage-counter",
            &format!(r"this attack does (?P<d>\d+) (?P<more>more )?damage for each damage counter on {WHOSE}\."),
            per_damage_counter,
        ),
        Rule::new(
            "discard-for-damage",
            &format!(
                r"discard all (?:(?P<e>{ENERGY}) )?energy from this pokemon\. this attack does (?P<d>\d+) damage for each energy (?:card )?(?:you )?discarded in this way\."
            ),
            discard_for_damage,
        ),
        Rule::new(
            "conditional-more",
            r"if (?P<cond>[^,]+), this attack does (?P<d>\d+) more damage\.",
            conditional_more,
        ),
        // Other targets
        Rule::new(
            "random-hits",
            &format!(
                r"1 of your opponent's pokemon is chosen at random (?P<k>{COUNT}) times\. for each time a pokemon was chosen, do (?P<d>\d+) damage to it\."
            ),
            random_hits,
        ),
        Rule::new(
            "also-hits",
            r"this attack also does (?P<d>\d+) damage to (?P<t>[^.]+?)\.",
            also_hits,
        ),
        Rule::new("hits", r"this attack does (?P<d>\d+) damage to (?P<t>[^.]+?)\.", hits),
        Rule::new(
            "no-bench-weakness",
            r"\(don't apply weakness(?: and resistance)? for benched pokemon\.\)",
            nothing,
        ),
        Rule::new(
            "self-damage",
            r"this pokemon also does (?P<d>\d+) damage to itself\.",
            self_damage,
        ),
        Rule::new(
            "discard-random-defender-energy",
            r"discard a random energy from (?:your opponent's active pokemon|the defending pokemon)\.",
            discard_random_defender_energy,
        ),
        // Statuses lasting into the next turn
        Rule::new(
            "defender-cant",
            r"(?:during your opponent's next turn, the defending pokemon can't (?P<a>attack|retreat)|the defending pokemon can't (?P<b>attack|retreat) during your opponent's next turn)\.",
            defender_cant,
        ),
        Rule::new("self-cant-attack", r"during your next turn, this pokemon can't attack\.", self_cant_attack),
        Rule::new(
            "reduction-next-turn",
            r"during your opponent's next turn, this pokemon takes -(?P<n>\d+) damage from attacks\.",
            reduction_next_turn,
        ),
        Rule::new(
            "reduction-next-turn-trailing",
            r"this pokemon takes -(?P<n>\d+) damage from attacks during your opponent's next turn\.",
            reduction_next_turn,
        ),
        Rule::new(
            "prevent-damage-and-effects",
            r"during your opponent's next turn, prevent all damage from\W+and effects of\W+attacks done to this pokemon\.",
            prevent_damage_and_effects,
        ),
        Rule::new(
            "prevent-damage",
            r"during your opponent's next turn, prevent all damage done to this pokemon by attacks\.",
            prevent_damage,
        ),
        Rule::new(
            "defender-penalty",
            r"during your opponent's next turn, attacks used by the defending pokemon do -(?P<n>\d+) damage\.",
            defender_penalty,
        ),
        Rule::new(
            "defender-flips-to-attack",
            r"during your opponent's next turn, if the defending pokemon tries to use an attack, your opponent flips a coin\. if tails, that attack doesn't happen\.",
            defender_flips_to_attack,
        ),
    ];
    rules.extend(shared_rules());
    RuleTable::new(rules, conditions)
}

fn number(caps: &Captures<'_>, name: &str) -> i32 {
    caps.name(name).and_then(|m| m.as_str().parse().ok()).unwrap_or(0)
}

fn nothing(_: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    String::new()
}

fn heads_times(d: i32) -> DamageCalc {
    Arc::new(move |_: &Game, _: &EffectSource, state: &AttackState| state.heads as i32 * d)
}

/// Either replaces the damage or adds to it, depending on "more"
fn scale(b: &mut EffectBuilder<'_>, caps: &Captures<'_>, calc: DamageCalc) {
    if caps.name("more").is_some() {
        b.add_damage(calc);
    } else {
        b.set_damage(calc);
    }
}

fn pokemon_named(game: &Game, source: &EffectSource, state: &AttackState, whose: &str) -> Option<PokemonRef> {
    if whose.eq_ignore_ascii_case("this pokemon") {
        source.pokemon.and_then(|id| game.locate(id))
    } else {
        game.locate(state.defender)
    }
}

// ----------------------------------------------------------------------
// Coin shapes
// ----------------------------------------------------------------------

fn coins_scaled(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(k) = b.count(&caps["k"]) {
        b.set_attack_coins(CoinCount::Fixed(k as u32), DamageShape::CoinScaled);
        b.set_damage(heads_times(number(caps, "d")));
    }
    String::new()
}

fn until_tails_scaled(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    b.set_attack_coins(CoinCount::UntilTails, DamageShape::CoinScaled);
    b.set_damage(heads_times(number(caps, "d")));
    String::new()
}

fn until_tails_more(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    b.set_attack_coins(CoinCount::UntilTails, DamageShape::CoinAdded);
    b.add_damage(heads_times(number(caps, "d")));
    String::new()
}

fn energy_coins_scaled(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let energy = caps.name("e").and_then(|m| b.energy(m.as_str()));
    b.set_attack_coins(CoinCount::PerEnergy(energy), DamageShape::CoinScaled);
    b.set_damage(heads_times(number(caps, "d")));
    String::new()
}

fn coins_more(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    if let Some(k) = b.count(&caps["k"]) {
        b.set_attack_coins(CoinCount::Fixed(k as u32), DamageShape::CoinAdded);
        b.add_damage(heads_times(number(caps, "d")));
    }
    String::new()
}

fn heads_more(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    b.set_attack_coins(CoinCount::Fixed(1), DamageShape::CoinAdded);
    b.add_damage(heads_times(number(caps, "d")));
    String::new()
}

fn both_heads_more(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let Some(k) = b.count(&caps["k"]) else {
        return String::new();
    };
    let d = number(caps, "d");
    let k = k as u32;
    b.set_attack_coins(CoinCount::Fixed(k), DamageShape::CoinAdded);
    b.add_damage(Arc::new(move |_: &Game, _: &EffectSource, state: &AttackState| {
        if state.heads >= k {
            d
        } else {
            0
        }
    }));
    String::new()
}

fn tails_nothing(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.set_attack_coins(CoinCount::Fixed(1), DamageShape::FlipOrNothing);
    String::new()
}

// ----------------------------------------------------------------------
// Per-count damage
// ----------------------------------------------------------------------

fn per_benched(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let d = number(caps, "d");
    let theirs = caps["w"].eq_ignore_ascii_case("your opponent's");
    let energy = caps.name("e").and_then(|m| b.energy(m.as_str()));
    let calc: DamageCalc = Arc::new(move |game: &Game, source: &EffectSource, _: &AttackState| {
        let player = if theirs { source.player.opponent() } else { source.player };
        let benched = game
            .bench_refs(player)
            .iter()
            .filter(|r| energy.map_or(true, |e| game.pokemon(r).is_some_and(|p| p.card.energy_type == e)))
            .count();
        benched as i32 * d
    });
    scale(b, caps, calc);
    String::new()
}

fn per_energy(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let d = number(caps, "d");
    let energy = caps.name("e").and_then(|m| b.energy(m.as_str()));
    let whose = caps["w"].to_string();
    let calc: DamageCalc = Arc::new(move |game: &Game, source: &EffectSource, state: &AttackState| {
        pokemon_named(game, source, state, &whose).map_or(0, |r| {
            let counts = game.effective_energy(&r);
            energy.map_or(counts.total(), |e| counts.get(e)) as i32 * d
        })
    });
    scale(b, caps, calc);
    String::new()
}

fn per_damage_counter(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let d = number(caps, "d");
    let whose = caps["w"].to_string();
    let calc: DamageCalc = Arc::new(move |game: &Game, source: &EffectSource, state: &AttackState| {
        pokemon_named(game, source, state, &whose)
            .and_then(|r| game.pokemon(&r))
            .map_or(0, |p| p.damage_counters() * d)
    });
    scale(b, caps, calc);
    String::new()
}

fn discard_for_damage(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let energy = caps.name("e").and_then(|m| b.energy(m.as_str()));
    let d = number(caps, "d");
    b.push(
        Bucket::PreDamage,
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            let Some(this) = ctx.source_ref() else {
                return Ok(());
            };
            let discarded = ctx.discard_energy(&this, energy, usize::MAX);
            if let Some(state) = ctx.attack.as_mut() {
                state.remembered += discarded as i32;
            }
            Ok(())
        }),
    );
    b.set_damage(Arc::new(move |_: &Game, _: &EffectSource, state: &AttackState| state.remembered * d));
    String::new()
}

fn conditional_more(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let d = number(caps, "d");
    if let Some(check) = b.condition(&caps["cond"]) {
        b.add_damage(Arc::new(move |game: &Game, source: &EffectSource, _: &AttackState| {
            if check(game, source) {
                d
            } else {
                0
            }
        }));
    }
    String::new()
}

// ----------------------------------------------------------------------
// Other targets
// ----------------------------------------------------------------------

fn random_hits(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let Some(times) = b.count(&caps["k"]) else {
        return String::new();
    };
    let d = number(caps, "d");
    b.shape = Some(DamageShape::None);
    b.random_damage = true;
    b.push(
        Bucket::Attacking,
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            let opponent = ctx.opponent();
            for _ in 0..times {
                let candidates = ctx.game.in_play(opponent);
                if candidates.is_empty() {
                    break;
                }
                let pick = candidates[ctx.game.random_index(candidates.len())];
                ctx.attack_damage(&pick, d);
            }
            Ok(())
        }),
    );
    String::new()
}

fn attack_targets(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) {
    let d = number(caps, "d");
    let Some(target) = b.target(&caps["t"]) else {
        return;
    };
    b.push(
        Bucket::Attacking,
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            for pokemon in target.resolve(ctx)? {
                ctx.attack_damage(&pokemon, d);
            }
            Ok(())
        }),
    );
}

fn also_hits(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    attack_targets(b, caps);
    String::new()
}

fn hits(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    b.shape = Some(DamageShape::None);
    attack_targets(b, caps);
    String::new()
}

fn self_damage(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let d = number(caps, "d");
    b.push(
        Bucket::Attacking,
        Arc::new(move |ctx: &mut EffectCtx<'_>| {
            if let Some(this) = ctx.source_ref() {
                ctx.direct_damage(&this, d);
            }
            Ok(())
        }),
    );
    String::new()
}

fn discard_random_defender_energy(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(
        Bucket::Side,
        Arc::new(|ctx: &mut EffectCtx<'_>| {
            let Some(defender) = ctx.defender_ref() else {
                return Ok(());
            };
            if ctx.shielded(&defender) {
                return Ok(());
            }
            let attached = ctx.game.pokemon(&defender).map(|p| p.energy.clone()).unwrap_or_default();
            if attached.is_empty() {
                return Ok(());
            }
            let energy = attached[ctx.game.random_index(attached.len())];
            ctx.discard_energy(&defender, Some(energy), 1);
            Ok(())
        }),
    );
    String::new()
}

// ----------------------------------------------------------------------
// Statuses
// ----------------------------------------------------------------------

/// Grant `kind` to the defending Pokémon through the opponent's next turn
fn grant_to_defender(b: &mut EffectBuilder<'_>, kind: StatusKind) {
    if let Some(defender) = b.target("the defending pokemon") {
        b.push(Bucket::Side, grant_to(defender, kind, Lasting::OpponentsNextTurn));
    }
}

fn defender_cant(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let what = caps.name("a").or_else(|| caps.name("b")).map(|m| m.as_str().to_lowercase());
    let kind = match what.as_deref() {
        Some("retreat") => StatusKind::CannotRetreat,
        _ => StatusKind::CannotAttack,
    };
    grant_to_defender(b, kind);
    String::new()
}

fn self_cant_attack(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::CannotAttack, Lasting::YourNextTurn));
    String::new()
}

fn reduction_next_turn(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::DamageReduction(n), Lasting::OpponentsNextTurn));
    String::new()
}

fn prevent_damage_and_effects(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::PreventDamage, Lasting::OpponentsNextTurn));
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::PreventEffects, Lasting::OpponentsNextTurn));
    String::new()
}

fn prevent_damage(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    b.push(Bucket::Side, grant_to(Target::This, StatusKind::PreventDamage, Lasting::OpponentsNextTurn));
    String::new()
}

fn defender_penalty(b: &mut EffectBuilder<'_>, caps: &Captures<'_>) -> String {
    let n = number(caps, "n");
    grant_to_defender(b, StatusKind::DamagePenalty(n));
    String::new()
}

fn defender_flips_to_attack(b: &mut EffectBuilder<'_>, _: &Captures<'_>) -> String {
    grant_to_defender(b, StatusKind::FlipToAttack);
    String::new()
}

#[cfg(test)]
mod tests {
    use crate::compiler::Compiler;
    use crate::core::{CoinCount, DamageShape, EnergyType};

    fn attack(base: i32, text: &str) -> crate::compiler::Compiled<crate::core::Attack> {
        Compiler::new().compile_attack("Test", &[EnergyType::Colorless], base, text)
    }

    #[test]
    fn test_coin_shapes() {
        let scaled = attack(0, "Flip 3 coins. This attack does 20 damage for each heads.");
        assert!(scaled.ok, "{:?}", scaled.unmatched);
        assert_eq!(scaled.value.shape, DamageShape::CoinScaled);
        assert_eq!(scaled.value.coins, Some(CoinCount::Fixed(3)));
        assert!(scaled.value.random_damage);

        let added = attack(30, "Flip a coin. If heads, this attack does 30 more damage.");
        assert!(added.ok, "{:?}", added.unmatched);
        assert_eq!(added.value.shape, DamageShape::CoinAdded);

        let nothing = attack(70, "Flip a coin. If tails, this attack does nothing.");
        assert!(nothing.ok);
        assert_eq!(nothing.value.shape, DamageShape::FlipOrNothing);

        let until = attack(0, "Flip a coin until you get tails. This attack does 40 damage for each heads.");
        assert_eq!(until.value.coins, Some(CoinCount::UntilTails));

        let energy = attack(0, "Flip a coin for each Energy attached to this Pokémon. This attack does 50 damage for each heads.");
        assert!(energy.ok, "{:?}", energy.unmatched);
        assert_eq!(energy.value.coins, Some(CoinCount::PerEnergy(None)));
    }

    #[test]
    fn test_status_flip_is_a_side_effect() {
        let compiled = attack(30, "Flip a coin. If heads, your opponent's Active Pokémon is now Paralyzed.");
        assert!(compiled.ok, "{:?}", compiled.unmatched);
        assert_eq!(compiled.value.shape, DamageShape::Predetermined);
        assert!(compiled.value.coins.is_none());
        assert_eq!(compiled.value.pre_damage.len(), 1);
        assert_eq!(compiled.value.side.len(), 1);
    }

    #[test]
    fn test_snipe_has_no_main_hit() {
        let compiled = attack(0, "This attack does 30 damage to 1 of your opponent's Pokémon.");
        assert!(compiled.ok, "{:?}", compiled.unmatched);
        assert_eq!(compiled.value.shape, DamageShape::None);
        assert_eq!(compiled.value.attacking.len(), 1);
    }

    #[test]
    fn test_bench_splash() {
        let compiled = attack(
            50,
            "This attack also does 20 damage to each of your opponent's Benched Pokémon. (Don't apply Weakness and Resistance for Benched Pokémon.)",
        );
        assert!(compiled.ok, "{:?}", compiled.unmatched);
        assert_eq!(compiled.value.shape, DamageShape::Predetermined);
        assert_eq!(compiled.value.attacking.len(), 1);
    }

    #[test]
    fn test_both_clause_orders_for_reduction() {
        for text in [
            "During your opponent's next turn, this Pokémon takes −20 damage from attacks.",
            "This Pokémon takes −20 damage from attacks during your opponent's next turn.",
        ] {
            let compiled = attack(40, text);
            assert!(compiled.ok, "{text}: {:?}", compiled.unmatched);
            assert_eq!(compiled.value.side.len(), 1);
        }
    }

    #[test]
    fn test_prevent_damage_and_effects() {
        let compiled = attack(
            0,
            "Flip a coin. If heads, during your opponent's next turn, prevent all damage from—and effects of—attacks done to this Pokémon.",
        );
        assert!(compiled.ok, "{:?}", compiled.unmatched);
        assert_eq!(compiled.value.shape, DamageShape::None);
    }

    #[test]
    fn test_conditional_bonus() {
        let compiled = attack(40, "If your opponent's Active Pokémon is Poisoned, this attack does 50 more damage.");
        assert!(compiled.ok, "{:?}", compiled.unmatched);
        assert!(compiled.value.damage.is_some());
    }

    #[test]
    fn test_discard_for_damage() {
        let compiled = attack(
            0,
            "Discard all Energy from this Pokémon. This attack does 30 damage for each Energy discarded in this way.",
        );
        assert!(compiled.ok, "{:?}", compiled.unmatched);
        assert_eq!(compiled.value.pre_damage.len(), 1);
        assert_eq!(compiled.value.shape, DamageShape::Predetermined);
    }

    #[test]
    fn test_random_hits() {
        let compiled = attack(
            0,
            "1 of your opponent's Pokémon is chosen at random 4 times. For each time a Pokémon was chosen, do 50 damage to it.",
        );
        assert!(compiled.ok, "{:?}", compiled.unmatched);
        assert!(compiled.value.random_damage);
        assert_eq!(compiled.value.shape, DamageShape::None);
    }
}
