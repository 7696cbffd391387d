//! Strongly-typed wrappers for game concepts
//!
//! Newtypes keep card names, player names and positions from being mixed up
//! with bare strings and integers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Card name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lookup key: ASCII-folded and lowercased, so "Pokémon" and "pokemon" agree
    pub fn key(&self) -> String {
        name_key(&self.0)
    }

    /// Compare against a name written in rules text
    pub fn matches(&self, other: &str) -> bool {
        self.key() == name_key(other)
    }
}

/// Normalize a card name for lookups and comparisons
pub fn name_key(name: &str) -> String {
    deunicode::deunicode(name.trim()).to_lowercase()
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardName {
    fn from(s: String) -> Self {
        CardName(s)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}

/// Player name (distinct from other string types)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerName {
    fn from(s: String) -> Self {
        PlayerName(s)
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        PlayerName(s.to_string())
    }
}

/// Energy (and Pokémon) types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyType {
    Grass,
    Fire,
    Water,
    Lightning,
    Psychic,
    Fighting,
    Darkness,
    Metal,
    Dragon,
    Colorless,
}

impl EnergyType {
    pub const ALL: [EnergyType; 10] = [
        EnergyType::Grass,
        EnergyType::Fire,
        EnergyType::Water,
        EnergyType::Lightning,
        EnergyType::Psychic,
        EnergyType::Fighting,
        EnergyType::Darkness,
        EnergyType::Metal,
        EnergyType::Dragon,
        EnergyType::Colorless,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EnergyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnergyType::Grass => "Grass",
            EnergyType::Fire => "Fire",
            EnergyType::Water => "Water",
            EnergyType::Lightning => "Lightning",
            EnergyType::Psychic => "Psychic",
            EnergyType::Fighting => "Fighting",
            EnergyType::Darkness => "Darkness",
            EnergyType::Metal => "Metal",
            EnergyType::Dragon => "Dragon",
            EnergyType::Colorless => "Colorless",
        };
        write!(f, "{name}")
    }
}

impl FromStr for EnergyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grass" | "g" => Ok(EnergyType::Grass),
            "fire" | "r" => Ok(EnergyType::Fire),
            "water" | "w" => Ok(EnergyType::Water),
            "lightning" | "l" => Ok(EnergyType::Lightning),
            "psychic" | "p" => Ok(EnergyType::Psychic),
            "fighting" | "f" => Ok(EnergyType::Fighting),
            "darkness" | "dark" | "d" => Ok(EnergyType::Darkness),
            "metal" | "m" => Ok(EnergyType::Metal),
            "dragon" | "n" => Ok(EnergyType::Dragon),
            "colorless" | "c" => Ok(EnergyType::Colorless),
            other => Err(format!("Unknown energy type: {other}")),
        }
    }
}

/// Energy counted per type
///
/// Used for effective energy, where one attached card may count twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnergyCounts([u32; 10]);

impl EnergyCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, energy: EnergyType, amount: u32) {
        self.0[energy.index()] += amount;
    }

    pub fn get(&self, energy: EnergyType) -> u32 {
        self.0[energy.index()]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Whether these counts cover a cost; Colorless requirements take any type
    pub fn can_pay(&self, cost: &[EnergyType]) -> bool {
        let mut remaining = self.0;
        let mut colorless = 0u32;
        for energy in cost {
            if *energy == EnergyType::Colorless {
                colorless += 1;
                continue;
            }
            let slot = &mut remaining[energy.index()];
            if *slot == 0 {
                return false;
            }
            *slot -= 1;
        }
        remaining.iter().sum::<u32>() >= colorless
    }
}

/// Evolution stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Basic,
    Stage1,
    Stage2,
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '_', '-'], "").as_str() {
            "basic" => Ok(Stage::Basic),
            "stage1" => Ok(Stage::Stage1),
            "stage2" => Ok(Stage::Stage2),
            other => Err(format!("Unknown stage: {other}")),
        }
    }
}

/// A field position: the active slot or one of the bench slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Active,
    Bench(u8),
}

impl Position {
    pub const BENCH_SLOTS: usize = 3;

    /// Active first, then the bench left to right
    pub fn all() -> [Position; 4] {
        [
            Position::Active,
            Position::Bench(0),
            Position::Bench(1),
            Position::Bench(2),
        ]
    }

    pub fn index(self) -> usize {
        match self {
            Position::Active => 0,
            Position::Bench(slot) => 1 + slot as usize,
        }
    }

    pub fn is_active(self) -> bool {
        self == Position::Active
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Active => write!(f, "active"),
            Position::Bench(slot) => write!(f, "bench {}", slot + 1),
        }
    }
}
