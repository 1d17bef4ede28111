use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const AXIS_MIN: f64 = -1.0;
pub const AXIS_MAX: f64 = 1.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PartyError {
    #[error("party name cannot be empty")]
    EmptyName,
    #[error("{axis} coordinate must be finite, got {value}")]
    NonFiniteCoordinate { axis: Axis, value: f64 },
    #[error("seat count cannot be negative, got {0}")]
    NegativeSeats(i64),
    #[error("seat count {0} is out of range")]
    SeatsOutOfRange(i64),
    #[error("party {0} appears more than once")]
    DuplicateName(PartyName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Economic,
    Social,
}

impl Display for Axis {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Economic => write!(f, "economic"),
            Self::Social => write!(f, "social"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartyName(String);

impl PartyName {
    pub fn new(raw: impl Into<String>) -> Result<Self, PartyError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PartyError::EmptyName);
        }
        if trimmed.len() == raw.len() {
            Ok(Self(raw))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PartyName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PartyName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for PartyName {
    type Err = PartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PartyName {
    type Error = PartyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartyName> for String {
    fn from(value: PartyName) -> Self {
        value.0
    }
}

/// Point on the (economic, social) plane, always inside `[-1, 1]²`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub economic: f64,
    pub social: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        economic: 0.0,
        social: 0.0,
    };

    pub fn new(economic: f64, social: f64) -> Result<Self, PartyError> {
        Ok(Self {
            economic: clamp_axis(Axis::Economic, economic)?,
            social: clamp_axis(Axis::Social, social)?,
        })
    }

    pub fn is_finite(&self) -> bool {
        self.economic.is_finite() && self.social.is_finite()
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.economic - other.economic).hypot(self.social - other.social)
    }
}

fn clamp_axis(axis: Axis, value: f64) -> Result<f64, PartyError> {
    if !value.is_finite() {
        return Err(PartyError::NonFiniteCoordinate { axis, value });
    }
    Ok(value.clamp(AXIS_MIN, AXIS_MAX))
}

pub fn seats_from_signed(raw: i64) -> Result<u32, PartyError> {
    if raw < 0 {
        return Err(PartyError::NegativeSeats(raw));
    }
    u32::try_from(raw).map_err(|_| PartyError::SeatsOutOfRange(raw))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub name: PartyName,
    pub seats: u32,
    #[serde(flatten)]
    pub position: Position,
    #[serde(default, skip_serializing)]
    pub selected: bool,
}

impl Party {
    pub fn new(name: &str, seats: u32) -> Result<Self, PartyError> {
        Ok(Self {
            name: PartyName::new(name)?,
            seats,
            position: Position::ORIGIN,
            selected: false,
        })
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn set_position(&mut self, economic: f64, social: f64) -> Result<(), PartyError> {
        self.position = Position::new(economic, social)?;
        Ok(())
    }

    pub fn is_viable(&self) -> bool {
        self.seats > 0
    }

    pub fn economic(&self) -> f64 {
        self.position.economic
    }

    pub fn social(&self) -> f64 {
        self.position.social
    }
}

impl PartialEq for Party {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Party {}

impl Hash for Party {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

pub fn ensure_unique_names(parties: &[Party]) -> Result<(), PartyError> {
    let mut seen = std::collections::BTreeSet::new();
    for party in parties {
        if !seen.insert(party.name.as_str()) {
            return Err(PartyError::DuplicateName(party.name.clone()));
        }
    }
    Ok(())
}

pub fn total_seats(parties: &[Party]) -> u32 {
    parties.iter().map(|p| p.seats).sum()
}
