//! Type-safe price representation using decimal arithmetic.
//!
//! Trip prices arrive from the booking site as JSON numbers, and occasionally
//! as numeric strings typed into the admin editor. [`Price`] accepts both and
//! always writes a JSON number back.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A trip price in the site's display currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    amount: Decimal,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self { amount }
    }

    /// Create a price from a whole-unit amount.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self {
            amount: Decimal::from(units),
        }
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Format for display in the given currency (e.g., "₹1000").
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        format!("{}{}", currency.symbol(), self.amount.normalize())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount.normalize())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.amount.fract().is_zero()
            && let Some(units) = self.amount.to_i64()
        {
            return serializer.serialize_i64(units);
        }
        let value = self
            .amount
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom("price out of range"))?;
        serializer.serialize_f64(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = match RawAmount::deserialize(deserializer)? {
            RawAmount::Int(n) => Decimal::from(n),
            RawAmount::Float(f) => Decimal::try_from(f).map_err(serde::de::Error::custom)?,
            RawAmount::Text(s) => {
                let cleaned: String = s.chars().filter(|c| *c != ',').collect();
                Decimal::from_str(cleaned.trim()).map_err(serde::de::Error::custom)?
            }
        };
        Ok(Self { amount })
    }
}

/// ISO 4217 currency codes used by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    NPR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::NPR => "Rs ",
        }
    }
}
