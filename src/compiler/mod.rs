//! Rules-text compiler
//!
//! Card text is compiled once, when the catalog loads, into the closures
//! stored on `Attack` and `Effect`. Compilation never fails hard: text that
//! no rule understands is reported on the `Compiled` wrapper and the card
//! keeps whatever behaviour was understood.

pub mod attack_rules;
pub mod builder;
pub mod conditions;
pub mod driver;
pub mod effect_rules;
pub mod targeting;

pub use builder::{Bucket, EffectBuilder, Lasting, Mode};
pub use conditions::ConditionGrammar;
pub use driver::{Rule, RuleTable};
pub use targeting::{parse_card_filter, parse_names, parse_target, CardFilter, Target};

use crate::core::{Ability, Attack, Effect, EnergyType, FossilForm, TrainerKind, Trigger};
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Regex alternation of every energy type name
pub const ENERGY: &str = "(?:grass|fire|water|lightning|psychic|fighting|darkness|metal|dragon|colorless)";

/// Number words as printed on cards
pub const COUNT: &str = r"(?:a|an|one|two|three|four|five|\d+)";

/// "a", "two", "3" and friends
pub fn count_word(word: &str) -> Option<usize> {
    let word = word.trim();
    match word.to_lowercase().as_str() {
        "a" | "an" | "one" => Some(1),
        "two" | "both" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        _ => word.parse().ok(),
    }
}

/// The result of compiling one piece of card text
#[derive(Debug, Clone)]
pub struct Compiled<T> {
    pub value: T,
    /// False when some of the text was not understood
    pub ok: bool,
    /// Text fragments no rule matched
    pub unmatched: Vec<String>,
}

impl<T> Compiled<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Compiled<U> {
        Compiled {
            value: f(self.value),
            ok: self.ok,
            unmatched: self.unmatched,
        }
    }
}

/// A compiled trainer text: its effect, and for fossils the Pokémon it plays as
#[derive(Debug, Clone)]
pub struct CompiledTrainer {
    pub effect: Effect,
    pub fossil: Option<FossilForm>,
}

/// Canonical form of rules text: ASCII only, energy symbols spelled out,
/// single spaces, ending in a period
pub fn normalize(text: &str) -> String {
    static SYMBOL: OnceLock<Regex> = OnceLock::new();
    let symbol = SYMBOL.get_or_init(|| Regex::new(r"[\{\[]([GRWLPFDMNC])[\}\]]").expect("symbol pattern is valid"));

    let ascii = deunicode::deunicode(text);
    let spelled = symbol.replace_all(&ascii, |caps: &regex::Captures<'_>| {
        caps[1]
            .parse::<EnergyType>()
            .map(|energy| energy.to_string())
            .unwrap_or_else(|_| caps[0].to_string())
    });
    let mut out = spelled.split_whitespace().collect::<Vec<_>>().join(" ");
    if !out.is_empty() && !out.ends_with('.') && !out.ends_with(')') {
        out.push('.');
    }
    out
}

/// The three rule tables, built once and shared by every card
pub struct Compiler {
    attack: RuleTable,
    ability: RuleTable,
    trainer: RuleTable,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        let conditions = Arc::new(ConditionGrammar::new());
        Compiler {
            attack: attack_rules::table(conditions.clone()),
            ability: effect_rules::ability_table(conditions.clone()),
            trainer: effect_rules::trainer_table(conditions),
        }
    }

    /// Compile an attack; without text it only deals its declared damage
    pub fn compile_attack(&self, name: &str, cost: &[EnergyType], base_damage: i32, text: &str) -> Compiled<Attack> {
        let text = normalize(text);
        let mut builder = EffectBuilder::new(&self.attack, Mode::Attack);
        builder.base_damage = base_damage;
        self.attack.drive(&mut builder, &text);
        builder.finish_attack(name, cost, &text)
    }

    /// Compile an ability; abilities with no trigger clause are passive
    pub fn compile_ability(&self, name: &str, text: &str) -> Compiled<Ability> {
        let text = normalize(text);
        let mut builder = EffectBuilder::new(&self.ability, Mode::Ability);
        self.ability.drive(&mut builder, &text);
        builder
            .finish_effect(&text, Trigger::Passive)
            .map(|effect| Ability { name: name.to_string(), effect })
    }

    pub fn compile_trainer(&self, kind: TrainerKind, text: &str) -> Compiled<CompiledTrainer> {
        let text = normalize(text);
        let mut builder = EffectBuilder::new(&self.trainer, Mode::Trainer);
        self.trainer.drive(&mut builder, &text);
        let fossil = match (kind, builder.fossil) {
            (TrainerKind::Fossil, Some(form)) => Some(form),
            _ => None,
        };
        builder
            .finish_effect(&text, Trigger::OnPlay)
            .map(|effect| CompiledTrainer { effect, fossil })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DamageShape;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("Take a {R} Energy from your Energy Zone and attach it to this Pokémon"),
            "Take a Fire Energy from your Energy Zone and attach it to this Pokemon."
        );
        assert_eq!(normalize("  Heal   20 damage.  "), "Heal 20 damage.");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_count_word() {
        assert_eq!(count_word("a"), Some(1));
        assert_eq!(count_word("Three"), Some(3));
        assert_eq!(count_word("12"), Some(12));
        assert_eq!(count_word("many"), None);
    }

    #[test]
    fn test_plain_attack() {
        let compiler = Compiler::new();
        let attack = compiler.compile_attack("Ember", &[EnergyType::Fire], 30, "");
        assert!(attack.ok);
        assert_eq!(attack.value.shape, DamageShape::Predetermined);
        assert!(attack.value.side.is_empty());
    }

    #[test]
    fn test_unknown_text_keeps_base_damage() {
        let compiler = Compiler::new();
        let attack = compiler.compile_attack("Mystery", &[EnergyType::Water], 40, "Something nobody wrote a rule for.");
        assert!(!attack.ok);
        assert!(!attack.value.compiled);
        assert_eq!(attack.value.base_damage, 40);
        assert_eq!(attack.value.shape, DamageShape::Predetermined);
        assert_eq!(attack.unmatched, vec!["Something nobody wrote a rule for.".to_string()]);
    }

    #[test]
    fn test_ability_defaults_to_passive() {
        let compiler = Compiler::new();
        let ability = compiler.compile_ability("Hard Coat", "This Pokémon takes −20 damage from attacks.");
        assert!(ability.ok, "unmatched: {:?}", ability.unmatched);
        assert_eq!(ability.value.effect.trigger, Trigger::Passive);
    }

    #[test]
    fn test_fossil_form() {
        let compiler = Compiler::new();
        let fossil = compiler.compile_trainer(
            TrainerKind::Fossil,
            "Play this card as if it were a 40-HP Basic {C} Pokémon. At any time during your turn, you may discard this card from play. This card can't retreat.",
        );
        assert!(fossil.ok, "unmatched: {:?}", fossil.unmatched);
        assert_eq!(fossil.value.fossil.map(|f| f.hp), Some(40));
    }
}
