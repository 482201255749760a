//! Fixed-point decimal types for prices and volumes
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Both newtypes reject negative values at construction, so non-negativity
//! holds everywhere by type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// A non-negative limit or execution price.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, returning None for negative values.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from an integer number of currency units.
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = Decimal::from_str(s)?;
        Price::try_new(d).ok_or(rust_decimal::Error::LessThanMinimumPossibleValue)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative order or trade volume.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Volume(Decimal);

impl Volume {
    /// Create a volume, returning None for negative values.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from an integer number of units.
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// The smaller of two volumes.
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Subtract, returning None if the result would be negative.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        Self::try_new(self.0 - other.0)
    }
}

impl Add for Volume {
    type Output = Volume;

    fn add(self, rhs: Volume) -> Volume {
        Volume(self.0 + rhs.0)
    }
}

impl FromStr for Volume {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = Decimal::from_str(s)?;
        Volume::try_new(d).ok_or(rust_decimal::Error::LessThanMinimumPossibleValue)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
