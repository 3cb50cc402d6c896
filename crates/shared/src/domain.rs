use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(HumanBeingId);

/// Declares a fixed wire enumeration with its SCREAMING_SNAKE_CASE spelling.
macro_rules! wire_enum {
    ($name:ident, $label:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let normalized = raw.trim().replace('-', "_").to_ascii_uppercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str() == normalized)
                    .ok_or_else(|| ParseEnumError::new($label, raw))
            }
        }
    };
}

wire_enum!(Mood, "mood", {
    Sadness => "SADNESS",
    Longing => "LONGING",
    Gloom => "GLOOM",
});

wire_enum!(WeaponType, "weapon type", {
    Hammer => "HAMMER",
    Pistol => "PISTOL",
    Knife => "KNIFE",
    MachineGun => "MACHINE_GUN",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub name: String,
    pub cool: bool,
}

/// One "Human Being" record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanBeing {
    pub id: HumanBeingId,
    pub name: String,
    pub coordinates: Coordinates,
    /// Backend-assigned; kept verbatim and only parsed for display.
    pub creation_date: String,
    pub real_hero: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_toothpick: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car: Option<Car>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    pub impact_speed: f64,
    #[serde(default)]
    pub soundtrack_name: String,
    pub weapon_type: WeaponType,
}

impl HumanBeing {
    /// Parses `creation_date` leniently: RFC 3339 first, then a zone-less
    /// ISO local timestamp.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_creation_date(&self.creation_date)
    }

    pub fn to_create_request(&self) -> HumanBeingCreateRequest {
        HumanBeingCreateRequest {
            name: self.name.clone(),
            coordinates: self.coordinates.clone(),
            real_hero: self.real_hero,
            has_toothpick: self.has_toothpick,
            car: self.car.clone(),
            mood: self.mood,
            impact_speed: self.impact_speed,
            soundtrack_name: self.soundtrack_name.clone(),
            weapon_type: self.weapon_type,
        }
    }
}

fn parse_creation_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Record fields a client may supply; id and creation date are backend-owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanBeingCreateRequest {
    pub name: String,
    pub coordinates: Coordinates,
    pub real_hero: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_toothpick: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car: Option<Car>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    pub impact_speed: f64,
    pub soundtrack_name: String,
    pub weapon_type: WeaponType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanBeingUpdateRequest {
    pub id: HumanBeingId,
    #[serde(flatten)]
    pub fields: HumanBeingCreateRequest,
}

impl HumanBeingUpdateRequest {
    pub fn new(id: HumanBeingId, fields: HumanBeingCreateRequest) -> Self {
        Self { id, fields }
    }
}
