//! Demo records: Pokédex entries read from a JSON array.

use serde::Deserialize;

/// Data file used when neither `--data` nor the config names one.
pub const DEFAULT_DATA_FILE: &str = "data/pokedex.json";

#[derive(Clone, Debug, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: PokemonName,
    pub base: PokemonBase,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PokemonName {
    pub english: String,
    #[serde(default)]
    pub japanese: String,
    #[serde(default)]
    pub chinese: String,
    #[serde(default)]
    pub french: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PokemonBase {
    #[serde(rename = "HP")]
    pub hp: u32,
    #[serde(rename = "Attack")]
    pub attack: u32,
    #[serde(rename = "Defense")]
    pub defense: u32,
    #[serde(rename = "Sp. Attack")]
    pub sp_attack: u32,
    #[serde(rename = "Sp. Defense")]
    pub sp_defense: u32,
    #[serde(rename = "Speed")]
    pub speed: u32,
}

impl PokemonBase {
    pub fn total(&self) -> u32 {
        self.hp + self.attack + self.defense + self.sp_attack + self.sp_defense + self.speed
    }
}
