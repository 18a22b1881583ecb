//! Character sheet envelope types
//!
//! A [`CharacterSheet`] pairs a stable id and owner with a system-specific
//! payload. The payload is a tagged union so each game system keeps its own
//! schema, checked when a sheet is decoded.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::fantasy::FantasyData;
use super::star_wars::StarWarsData;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// Payload could not be decoded
    #[error("Failed to decode character sheet: {0}")]
    Decode(String),

    /// Payload decoded but breaks a sheet invariant
    #[error("Invalid character sheet: {0}")]
    Invalid(String),
}

impl SheetError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Stable sheet identifier (never changes once assigned).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SheetId(pub i64);

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameSystem {
    Fantasy,
    StarWars,
}

impl GameSystem {
    pub fn name(&self) -> &'static str {
        match self {
            GameSystem::Fantasy => "Fantasy",
            GameSystem::StarWars => "Star Wars",
        }
    }
}

/// System-specific sheet payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "system", rename_all = "camelCase")]
pub enum SheetData {
    Fantasy(FantasyData),
    StarWars(StarWarsData),
}

impl SheetData {
    /// Blank payload for a new character of the given system.
    pub fn new(system: GameSystem) -> Self {
        match system {
            GameSystem::Fantasy => SheetData::Fantasy(FantasyData::default()),
            GameSystem::StarWars => SheetData::StarWars(StarWarsData::default()),
        }
    }

    pub fn system(&self) -> GameSystem {
        match self {
            SheetData::Fantasy(_) => GameSystem::Fantasy,
            SheetData::StarWars(_) => GameSystem::StarWars,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SheetData::Fantasy(data) => &data.name,
            SheetData::StarWars(data) => &data.name,
        }
    }

    pub fn player_name(&self) -> &str {
        match self {
            SheetData::Fantasy(data) => &data.player_name,
            SheetData::StarWars(data) => &data.player_name,
        }
    }

    pub fn as_star_wars(&self) -> Option<&StarWarsData> {
        match self {
            SheetData::StarWars(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_fantasy(&self) -> Option<&FantasyData> {
        match self {
            SheetData::Fantasy(data) => Some(data),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), SheetError> {
        match self {
            SheetData::Fantasy(data) => data.validate(),
            SheetData::StarWars(data) => data.validate(),
        }
    }
}

/// Complete character sheet as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub id: SheetId,
    /// Account that owns the sheet.
    pub owner: String,
    pub data: SheetData,
}

impl CharacterSheet {
    pub fn new(id: SheetId, owner: &str, data: SheetData) -> Self {
        Self {
            id,
            owner: owner.to_string(),
            data,
        }
    }

    pub fn summary(&self) -> SheetSummary {
        SheetSummary {
            id: self.id,
            name: self.data.name().to_string(),
            player_name: self.data.player_name().to_string(),
            owner: self.owner.clone(),
            system: self.data.system(),
        }
    }

    /// Decode a sheet from JSON and check its invariants.
    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        let sheet: Self =
            serde_json::from_str(json).map_err(|e| SheetError::Decode(e.to_string()))?;
        sheet.data.validate()?;
        Ok(sheet)
    }

    pub fn to_json(&self) -> Result<String, SheetError> {
        serde_json::to_string(self).map_err(|e| SheetError::Decode(e.to_string()))
    }
}

/// Listing projection: what an outer character list needs to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub id: SheetId,
    pub name: String,
    pub player_name: String,
    pub owner: String,
    pub system: GameSystem,
}
