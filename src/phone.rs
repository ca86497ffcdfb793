// Phone records and the random field generators shared by both record strategies.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Serialize, Serializer};
use thiserror::Error;

pub const MIN_LAUNCH_YEAR: u16 = 2018;
pub const MAX_YEAR: u16 = 2025;
pub const MIN_PRICE: u64 = 8_000;
pub const MAX_PRICE: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Condition {
    New,
    Used,
    Refurbished,
}

impl Condition {
    pub const ALL: [Condition; 3] = [Condition::New, Condition::Used, Condition::Refurbished];

    pub fn random(rng: &mut dyn RngCore) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&Condition::New)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Condition::New => "New",
            Condition::Used => "Used",
            Condition::Refurbished => "Refurbished",
        };
        f.write_str(s)
    }
}

/// A price in whole rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(pub u64);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid price '{0}'")]
pub struct PriceParseError(pub String);

impl Price {
    pub fn random(rng: &mut dyn RngCore) -> Self {
        Price(rng.gen_range(MIN_PRICE..=MAX_PRICE))
    }

    pub fn rupees(self) -> u64 {
        self.0
    }

    /// Scales the price by `factor`, rounding down to whole rupees.
    pub fn scaled(self, factor: f64) -> Price {
        Price((self.0 as f64 * factor).floor() as u64)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .trim()
            .trim_start_matches('₹')
            .trim()
            .chars()
            .filter(|c| *c != ',')
            .collect();
        digits
            .parse::<u64>()
            .map(Price)
            .map_err(|_| PriceParseError(s.to_string()))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A 15-digit IMEI number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Imei(String);

impl Imei {
    pub fn random(rng: &mut dyn RngCore) -> Self {
        Imei(rng.gen_range(100_000_000_000_000u64..=999_999_999_999_999).to_string())
    }

    /// Accepts exactly 15 ASCII digits.
    pub fn parse(s: &str) -> Option<Imei> {
        (s.len() == 15 && s.chars().all(|c| c.is_ascii_digit())).then(|| Imei(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Imei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneRecord {
    pub make: String,
    pub series: String,
    pub model: String,
    pub launch_year: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased_year: Option<u16>,
    pub condition: Condition,
    pub price: Price,
    pub imei: Imei,
}

impl PhoneRecord {
    /// The details block handed to the language model. The IMEI is held back
    /// so it can be offered as a follow-up.
    pub fn details(&self) -> String {
        format!(
            "Make: {}\nSeries: {}\nModel: {}\nLaunch Year: {}\nCondition: {}\nPrice: {}\n",
            self.make, self.series, self.model, self.launch_year, self.condition, self.price
        )
    }

    /// Every field, for the lookup view.
    pub fn full_details(&self) -> String {
        let mut out = self.details();
        if let Some(year) = self.purchased_year {
            out.push_str(&format!("Purchased Year: {}\n", year));
        }
        out.push_str(&format!("IMEI Number: {}\n", self.imei));
        out
    }
}

pub fn random_launch_year(rng: &mut dyn RngCore) -> u16 {
    rng.gen_range(MIN_LAUNCH_YEAR..=MAX_YEAR)
}

pub fn random_purchased_year(rng: &mut dyn RngCore, launch_year: u16) -> u16 {
    rng.gen_range(launch_year.min(MAX_YEAR)..=MAX_YEAR)
}
