// Selectable assets (players): ids, prices, availability.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::position::Position;

/// Unique asset (player) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team affiliation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// Fixed-point currency amount in tenths of a unit (FPL's `now_cost`).
///
/// Serialized as a decimal number of units, so `100.0` in a config file is
/// `Price(1000)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(pub u32);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid price {0}: must be a finite amount between 0.0 and {max}", max = Price::MAX)]
pub struct InvalidPrice(pub f64);

impl Price {
    pub const ZERO: Price = Price(0);
    pub const MAX: Price = Price(u32::MAX);

    pub fn from_tenths(tenths: u32) -> Self {
        Price(tenths)
    }

    /// Convert a decimal amount of units, rounding to the nearest tenth.
    ///
    /// Amounts that round above [`Price::MAX`] are rejected rather than
    /// clamped.
    pub fn from_units(units: f64) -> Result<Self, InvalidPrice> {
        let tenths = (units * 10.0).round();
        if !tenths.is_finite() || units < 0.0 || tenths > f64::from(u32::MAX) {
            return Err(InvalidPrice(units));
        }
        Ok(Price(tenths as u32))
    }

    pub fn tenths(self) -> u32 {
        self.0
    }

    pub fn units(self) -> f64 {
        self.0 as f64 / 10.0
    }

    pub fn checked_add(self, other: Price) -> Option<Price> {
        self.0.checked_add(other.0).map(Price)
    }

    pub fn saturating_sub(self, other: Price) -> Price {
        Price(self.0.saturating_sub(other.0))
    }
}

impl TryFrom<f64> for Price {
    type Error = InvalidPrice;

    fn try_from(units: f64) -> Result<Self, Self::Error> {
        Price::from_units(units)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> f64 {
        price.units()
    }
}

impl std::ops::Add for Price {
    type Output = Price;

    /// Saturates at [`Price::MAX`]; use [`Price::checked_add`] to detect it.
    fn add(self, rhs: Price) -> Price {
        Price(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::ZERO, |acc, p| acc + p)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Availability state, with FPL's optional chance-of-playing percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Doubtful { chance: Option<u8> },
    Unavailable { chance: Option<u8> },
}

impl Availability {
    /// Parse an FPL status letter.
    ///
    /// `a` is available, `d` doubtful; injured (`i`), suspended (`s`),
    /// unavailable (`u`) and not-in-squad (`n`) all count as unavailable.
    pub fn from_status(status: &str, chance: Option<u8>) -> Option<Self> {
        match status.trim().to_lowercase().as_str() {
            "a" | "available" => Some(Availability::Available),
            "d" | "doubtful" => Some(Availability::Doubtful { chance }),
            "i" | "s" | "u" | "n" | "unavailable" => Some(Availability::Unavailable { chance }),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Availability::Unavailable { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Doubtful { .. } => "doubtful",
            Availability::Unavailable { .. } => "unavailable",
        }
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A selectable player. Immutable input to every solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub position: Position,
    pub team: TeamId,
    pub price: Price,
    pub availability: Availability,
}

impl Asset {
    pub fn new(id: u32, name: &str, position: Position, team: u32, price: Price) -> Self {
        Asset {
            id: AssetId(id),
            name: name.to_string(),
            position,
            team: TeamId(team),
            price,
            availability: Availability::Available,
        }
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_from_units_rounds_to_tenths() {
        assert_eq!(Price::from_units(100.0).unwrap(), Price(1000));
        assert_eq!(Price::from_units(5.5).unwrap(), Price(55));
        assert_eq!(Price::from_units(4.449_999).unwrap(), Price(44));
        assert!(Price::from_units(-0.1).is_err());
        assert!(Price::from_units(f64::NAN).is_err());
    }

    #[test]
    fn price_from_units_rejects_amounts_past_the_range() {
        assert_eq!(Price::from_units(429_496_729.5).unwrap(), Price::MAX);
        let err = Price::from_units(1e12).unwrap_err();
        assert_eq!(err, InvalidPrice(1e12));
        assert!(err.to_string().contains("429496729.5"));
        assert!(Price::from_units(429_496_729.6).is_err());
        assert!(Price::from_units(f64::INFINITY).is_err());
    }

    #[test]
    fn price_addition_never_wraps() {
        assert_eq!(Price(10).checked_add(Price(5)), Some(Price(15)));
        assert_eq!(Price::MAX.checked_add(Price(1)), None);
        assert_eq!(Price::MAX + Price(1), Price::MAX);
        let total: Price = [Price::MAX, Price(5), Price(5)].into_iter().sum();
        assert_eq!(total, Price::MAX);
    }

    #[test]
    fn price_display_and_sum() {
        assert_eq!(Price(55).to_string(), "5.5");
        assert_eq!(Price(1000).to_string(), "100.0");
        let total: Price = [Price(40), Price(55), Price(65)].into_iter().sum();
        assert_eq!(total, Price(160));
        assert_eq!(Price(10).saturating_sub(Price(20)), Price::ZERO);
    }

    #[test]
    fn price_deserializes_from_units() {
        #[derive(Deserialize)]
        struct Wrapper {
            budget: Price,
        }
        let w: Wrapper = toml::from_str("budget = 99.5").unwrap();
        assert_eq!(w.budget, Price(995));
        assert!(toml::from_str::<Wrapper>("budget = -1.0").is_err());
        assert!(toml::from_str::<Wrapper>("budget = 1e12").is_err());
    }

    #[test]
    fn availability_from_fpl_status() {
        assert_eq!(
            Availability::from_status("a", None),
            Some(Availability::Available)
        );
        assert_eq!(
            Availability::from_status("d", Some(75)),
            Some(Availability::Doubtful { chance: Some(75) })
        );
        for s in ["i", "s", "u", "n"] {
            assert!(Availability::from_status(s, Some(0)).unwrap().is_unavailable());
        }
        assert_eq!(Availability::from_status("x", None), None);
    }
}
