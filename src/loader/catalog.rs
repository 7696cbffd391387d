//! Card catalog: JSON card records compiled into playable cards
//!
//! Every record is compiled exactly once, when the catalog loads. Rules text
//! the compiler does not understand never stops the load; it is collected
//! into a `CompileReport` instead, and the card keeps whatever behaviour was
//! understood.

use crate::compiler::Compiler;
use crate::core::{name_key, Ability, Card, CardName, EnergyType, PokemonCard, Stage, TrainerCard, TrainerKind};
use crate::{GameError, Result};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{digit1, multispace0};
use nom::combinator::{all_consuming, map_res, opt};
use nom::sequence::{delimited, terminated};
use nom::IResult;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Card families as written in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pokemon,
    Item,
    Supporter,
    Fossil,
    Tool,
}

impl Category {
    fn trainer_kind(self) -> Option<TrainerKind> {
        match self {
            Category::Pokemon => None,
            Category::Item => Some(TrainerKind::Item),
            Category::Supporter => Some(TrainerKind::Supporter),
            Category::Fossil => Some(TrainerKind::Fossil),
            Category::Tool => Some(TrainerKind::PokemonTool),
        }
    }
}

/// Printed damage: a number, or a string such as "30+" or "20x"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DamageValue {
    Number(i32),
    Text(String),
}

impl Default for DamageValue {
    fn default() -> Self {
        DamageValue::Number(0)
    }
}

impl DamageValue {
    /// The number printed next to the attack; "+" and "x" suffixes are left
    /// to the attack text
    pub fn base(&self) -> Result<i32> {
        match self {
            DamageValue::Number(n) => Ok(*n),
            DamageValue::Text(text) if text.trim().is_empty() => Ok(0),
            DamageValue::Text(text) => all_consuming(printed_damage)(text.as_str())
                .map(|(_, n)| n)
                .map_err(|_| GameError::CatalogError(format!("unreadable damage: {text:?}"))),
        }
    }
}

fn printed_damage(input: &str) -> IResult<&str, i32> {
    delimited(
        multispace0,
        terminated(
            map_res(digit1, str::parse::<i32>),
            opt(alt((tag("+"), tag("x"), tag("×"), tag("-")))),
        ),
        multispace0,
    )(input)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub name: String,
    #[serde(default)]
    pub cost: Vec<EnergyType>,
    #[serde(default)]
    pub damage: DamageValue,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityRecord {
    pub name: String,
    pub text: String,
}

/// One card as stored in a catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default, rename = "type")]
    pub energy_type: Option<EnergyType>,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub evolves_from: Option<String>,
    #[serde(default)]
    pub retreat: u32,
    #[serde(default)]
    pub weakness: Option<EnergyType>,
    #[serde(default)]
    pub ex: bool,
    #[serde(default)]
    pub attacks: Vec<AttackRecord>,
    #[serde(default)]
    pub ability: Option<AbilityRecord>,
    /// Rules text of a trainer card
    #[serde(default)]
    pub text: String,
}

/// A piece of card text that did not compile cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub card_id: String,
    pub card: String,
    /// Attack or ability name, or "text" for trainers
    pub part: String,
    pub problems: Vec<String>,
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]: {}", self.card_id, self.card, self.part, self.problems.join("; "))
    }
}

/// Every soft compile failure seen while loading a catalog
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub compiled: usize,
    pub failures: Vec<CompileFailure>,
}

impl CompileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: CompileReport) {
        self.compiled += other.compiled;
        self.failures.extend(other.failures);
    }
}

/// Compile one record into a card, reporting the text that was not understood
pub fn compile_record(compiler: &Compiler, record: &CatalogRecord) -> Result<(Card, CompileReport)> {
    let mut report = CompileReport { compiled: 1, failures: Vec::new() };
    let mut note = |part: &str, problems: Vec<String>| {
        if !problems.is_empty() {
            report.failures.push(CompileFailure {
                card_id: record.id.clone(),
                card: record.name.clone(),
                part: part.to_string(),
                problems,
            });
        }
    };

    let card = match record.category.trainer_kind() {
        None => {
            let missing = |field: &str| GameError::CatalogError(format!("{} ({}) has no {field}", record.name, record.id));
            let hp = record.hp.ok_or_else(|| missing("hp"))?;
            let energy_type = record.energy_type.ok_or_else(|| missing("type"))?;
            let stage = record.stage.ok_or_else(|| missing("stage"))?;
            if stage != Stage::Basic && record.evolves_from.is_none() {
                return Err(missing("evolves_from"));
            }

            let mut attacks = Vec::with_capacity(record.attacks.len());
            for attack in &record.attacks {
                let compiled = compiler.compile_attack(&attack.name, &attack.cost, attack.damage.base()?, &attack.text);
                note(&attack.name, compiled.unmatched);
                attacks.push(compiled.value);
            }
            let ability: Option<Ability> = record.ability.as_ref().map(|ability| {
                let compiled = compiler.compile_ability(&ability.name, &ability.text);
                note(&ability.name, compiled.unmatched);
                compiled.value
            });

            Card::Pokemon(std::sync::Arc::new(PokemonCard {
                id: record.id.clone(),
                name: CardName::new(record.name.as_str()),
                energy_type,
                hp,
                stage,
                evolves_from: record.evolves_from.as_deref().map(CardName::new),
                retreat_cost: record.retreat,
                weakness: record.weakness,
                prize_value: if record.ex { 2 } else { 1 },
                is_ex: record.ex,
                attacks,
                ability,
            }))
        }
        Some(kind) => {
            let compiled = compiler.compile_trainer(kind, &record.text);
            note("text", compiled.unmatched);
            if kind == TrainerKind::Fossil && compiled.value.fossil.is_none() {
                return Err(GameError::CatalogError(format!(
                    "fossil {} ({}) does not say what it plays as",
                    record.name, record.id
                )));
            }
            Card::Trainer(std::sync::Arc::new(TrainerCard {
                id: record.id.clone(),
                name: CardName::new(record.name.as_str()),
                kind,
                text: record.text.clone(),
                effect: compiled.value.effect,
                fossil: compiled.value.fossil,
            }))
        }
    };
    Ok((card, report))
}

/// Parse a catalog file: a JSON array of records, or a single record
pub fn parse_records(json: &str) -> Result<Vec<CatalogRecord>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<CatalogRecord>),
        One(Box<CatalogRecord>),
    }
    Ok(match serde_json::from_str(json)? {
        OneOrMany::Many(records) => records,
        OneOrMany::One(record) => vec![*record],
    })
}

/// Compiled cards by normalized name
#[derive(Default)]
pub struct CardCatalog {
    cards: FxHashMap<String, Card>,
    report: CompileReport,
}

impl CardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every record with one shared compiler
    pub fn from_records(records: &[CatalogRecord]) -> Result<Self> {
        let compiler = Compiler::new();
        let mut catalog = CardCatalog::new();
        for record in records {
            catalog.insert_record(&compiler, record)?;
        }
        Ok(catalog)
    }

    /// Load one JSON catalog file
    pub fn load_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_records(&parse_records(&json)?)
            .map_err(|e| GameError::CatalogError(format!("{}: {e}", path.display())))
    }

    /// Load every `*.json` file directly inside `dir`, in name order
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let compiler = Compiler::new();
        let mut catalog = CardCatalog::new();
        for path in paths {
            let json = std::fs::read_to_string(&path)?;
            for record in parse_records(&json)? {
                catalog
                    .insert_record(&compiler, &record)
                    .map_err(|e| GameError::CatalogError(format!("{}: {e}", path.display())))?;
            }
        }
        Ok(catalog)
    }

    pub fn insert_record(&mut self, compiler: &Compiler, record: &CatalogRecord) -> Result<()> {
        let (card, report) = compile_record(compiler, record)?;
        self.insert(card, report);
        Ok(())
    }

    /// Add an already compiled card; a later card with the same name wins
    pub fn insert(&mut self, card: Card, report: CompileReport) {
        self.cards.insert(card.name().key(), card);
        self.report.merge(report);
    }

    /// Record compile failures gathered elsewhere
    pub fn insert_report(&mut self, report: CompileReport) {
        self.report.merge(report);
    }

    /// Look up a card by name, ignoring case and accents
    pub fn get(&self, name: &str) -> Option<&Card> {
        self.cards.get(&name_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(&name_key(name))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card names in sorted order
    pub fn names(&self) -> Vec<&CardName> {
        let mut names: Vec<_> = self.cards.values().map(Card::name).collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        names
    }

    pub fn report(&self) -> &CompileReport {
        &self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DamageShape, Trigger};

    const RECORDS: &str = r#"[
        {
            "id": "A1-094", "name": "Pikachu", "category": "pokemon",
            "hp": 60, "type": "lightning", "stage": "basic", "retreat": 1, "weakness": "fighting",
            "attacks": [{ "name": "Gnaw", "cost": ["lightning"], "damage": 20 }]
        },
        {
            "id": "A1-104", "name": "Zapdos ex", "category": "pokemon", "ex": true,
            "hp": 130, "type": "lightning", "stage": "basic", "retreat": 1, "weakness": "fighting",
            "attacks": [{
                "name": "Thundering Hurricane", "cost": ["lightning", "lightning", "lightning", "colorless"],
                "damage": "50x", "text": "Flip 4 coins. This attack does 50 damage for each heads."
            }]
        },
        {
            "id": "PA-005", "name": "Poké Ball", "category": "item",
            "text": "Put 1 random Basic Pokémon from your deck into your hand."
        }
    ]"#;

    #[test]
    fn test_damage_values() {
        assert_eq!(DamageValue::Number(40).base().unwrap(), 40);
        assert_eq!(DamageValue::Text("30+".into()).base().unwrap(), 30);
        assert_eq!(DamageValue::Text("20x".into()).base().unwrap(), 20);
        assert_eq!(DamageValue::Text("".into()).base().unwrap(), 0);
        assert!(DamageValue::Text("lots".into()).base().is_err());
    }

    #[test]
    fn test_compile_catalog() {
        let catalog = CardCatalog::from_records(&parse_records(RECORDS).unwrap()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.report().is_clean(), "{:?}", catalog.report().failures);

        let zapdos = catalog.get("zapdos EX").and_then(Card::as_pokemon).unwrap();
        assert_eq!(zapdos.prize_value, 2);
        assert_eq!(zapdos.attacks[0].shape, DamageShape::CoinScaled);

        let ball = catalog.get("Poke Ball").and_then(Card::as_trainer).unwrap();
        assert_eq!(ball.kind, TrainerKind::Item);
        assert_eq!(ball.effect.trigger, Trigger::OnPlay);
    }

    #[test]
    fn test_soft_failures_are_reported() {
        let records = parse_records(
            r#"{ "id": "X-1", "name": "Oddity", "category": "supporter", "text": "Draw a card. Sing a song." }"#,
        )
        .unwrap();
        let catalog = CardCatalog::from_records(&records).unwrap();
        assert_eq!(catalog.report().failures.len(), 1);
        assert_eq!(catalog.report().failures[0].problems, vec!["Sing a song.".to_string()]);
        let oddity = catalog.get("Oddity").and_then(Card::as_trainer).unwrap();
        assert_eq!(oddity.effect.steps.len(), 1);
        assert!(!oddity.effect.compiled);
    }

    #[test]
    fn test_pokemon_needs_stats() {
        let records = parse_records(r#"{ "id": "X-2", "name": "Ghost", "category": "pokemon", "hp": 50 }"#).unwrap();
        assert!(matches!(CardCatalog::from_records(&records), Err(GameError::CatalogError(_))));
    }
}
