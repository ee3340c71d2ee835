use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// Asset class of a tracked instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Crypto,
    Stock,
}

impl AssetKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Stock => "stock",
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "crypto" => Ok(Self::Crypto),
            "stock" => Ok(Self::Stock),
            other => Err(ValidationError::InvalidAssetKind {
                value: other.to_owned(),
            }),
        }
    }
}

/// Canonical dual-currency price observation.
///
/// Both currencies derive from the same quote instant: either the provider
/// returned both natively (crypto path) or the JPY side was computed from
/// the USD side with the rate in effect at fetch time (stock path). A value
/// from one fetch is never combined with a rate from another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetPrice {
    pub price_usd: f64,
    pub price_jpy: f64,
    pub change_24h: f64,
}

impl AssetPrice {
    pub fn new(price_usd: f64, price_jpy: f64, change_24h: f64) -> Result<Self, ValidationError> {
        validate_non_negative("price_usd", price_usd)?;
        validate_non_negative("price_jpy", price_jpy)?;
        if !change_24h.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "change_24h",
            });
        }

        Ok(Self {
            price_usd,
            price_jpy,
            change_24h,
        })
    }
}

/// One point of a historical price series.
///
/// Crypto series carry no volume; equity series do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: UtcDateTime,
    pub price_usd: f64,
    pub price_jpy: f64,
    pub volume: Option<u64>,
}

pub(crate) fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
