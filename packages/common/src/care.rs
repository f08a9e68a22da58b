//! Closed vocabularies used by plant care metadata.
//!
//! With the `sea-orm` feature enabled, every enum here can be used directly as
//! a SeaORM column type and is stored as its lowercase string value.

#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative amount of a resource a plant needs. Used for both light and water.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")
)]
#[serde(rename_all = "snake_case")]
pub enum LightLevel {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "low"))]
    Low,
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "medium"))]
    Medium,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "high"))]
    High,
}

impl LightLevel {
    pub const ALL: &'static [LightLevel] = &[Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// How quickly a plant reaches its mature size.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")
)]
#[serde(rename_all = "snake_case")]
pub enum GrowthRate {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "slow"))]
    Slow,
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "medium"))]
    Medium,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "fast"))]
    Fast,
}

impl GrowthRate {
    pub const ALL: &'static [GrowthRate] = &[Self::Slow, Self::Medium, Self::Fast];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }
}

/// Season in which a plant flowers or fruits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "spring"))]
    Spring,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "summer"))]
    Summer,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "autumn"))]
    Autumn,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "winter"))]
    Winter,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "year_round"))]
    YearRound,
}

impl Season {
    pub const ALL: &'static [Season] = &[
        Self::Spring,
        Self::Summer,
        Self::Autumn,
        Self::Winter,
        Self::YearRound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
            Self::YearRound => "year_round",
        }
    }

    /// Parse an optional season where blank input means "no season".
    pub fn parse_blankable(s: &str) -> Result<Option<Self>, ParseChoiceError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

/// Error when a string is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChoiceError {
    invalid: String,
    allowed: &'static [&'static str],
}

impl ParseChoiceError {
    fn new(invalid: &str, allowed: &'static [&'static str]) -> Self {
        Self {
            invalid: invalid.to_string(),
            allowed,
        }
    }
}

impl fmt::Display for ParseChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" is not a valid choice. Valid values: {}",
            self.invalid,
            self.allowed.join(", ")
        )
    }
}

impl std::error::Error for ParseChoiceError {}

macro_rules! choice_impls {
    ($ty:ty, [$($variant:ident => $value:literal),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($value => Ok(Self::$variant),)+
                    other => Err(ParseChoiceError::new(other, &[$($value),+])),
                }
            }
        }
    };
}

choice_impls!(LightLevel, [Low => "low", Medium => "medium", High => "high"]);
choice_impls!(GrowthRate, [Slow => "slow", Medium => "medium", Fast => "fast"]);
choice_impls!(
    Season,
    [
        Spring => "spring",
        Summer => "summer",
        Autumn => "autumn",
        Winter => "winter",
        YearRound => "year_round",
    ]
);
