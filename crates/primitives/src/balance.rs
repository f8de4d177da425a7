//! Arbitrary-width balances.
//!
//! Storage values come back as `u128`, but deltas are always computed on
//! [`Balance`] so that sums of large amounts never wrap and string-formatted
//! numbers (`"1,000,000"`) compare exactly.

use std::{fmt, str::FromStr};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::PrimitivesError;

/// A token amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Balance(U256);

impl Balance {
    pub const ZERO: Self = Self(U256::ZERO);

    /// `10^exp` whole units, e.g. `Balance::pow10(12)` is one native token.
    pub fn pow10(exp: usize) -> Self {
        Self(U256::from(10u64).pow(U256::from(exp)))
    }

    /// Multiplies by a small scalar, saturating on overflow.
    pub fn times(self, n: u64) -> Self {
        Self(self.0.saturating_mul(U256::from(n)))
    }

    /// `rate` basis points of the amount, rounded down.
    pub fn bps(self, rate: u32) -> Self {
        Self(self.0.saturating_mul(U256::from(rate)) / U256::from(10_000u64))
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn abs_diff(self, rhs: Self) -> Self {
        if self >= rhs {
            Self(self.0 - rhs.0)
        } else {
            Self(rhs.0 - self.0)
        }
    }

    /// Narrows to the runtime's `u128` balance type.
    pub fn to_u128(self) -> Option<u128> {
        u128::try_from(self.0).ok()
    }
}

impl From<u128> for Balance {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl From<u64> for Balance {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for Balance {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl FromStr for Balance {
    type Err = PrimitivesError;

    /// Parses a decimal amount, ignoring `,` and `_` digit separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .trim()
            .chars()
            .filter(|c| *c != ',' && *c != '_')
            .collect();
        if digits.is_empty() {
            return Err(PrimitivesError::InvalidBalance {
                input: s.to_string(),
                reason: "empty".to_string(),
            });
        }
        U256::from_str_radix(&digits, 10)
            .map(Self)
            .map_err(|e| PrimitivesError::InvalidBalance {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Balance {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // TOML integers stop at i64, so large amounts are written as strings.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(u64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Int(n) => Ok(Self::from(n)),
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1,000,000", 1_000_000 ; "comma separated")]
    #[test_case("10_000_000_000_000", 10_000_000_000_000 ; "underscore separated")]
    #[test_case(" 293974317 ", 293_974_317 ; "surrounding whitespace")]
    fn parses_human_formatted_amounts(input: &str, expected: u128) {
        assert_eq!(input.parse::<Balance>().unwrap(), Balance::from(expected));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Balance>().is_err());
        assert!("12a".parse::<Balance>().is_err());
        assert!("-5".parse::<Balance>().is_err());
    }

    #[test]
    fn arithmetic_beyond_u128() {
        let big = Balance::from(u128::MAX);
        let sum = big.saturating_add(Balance::from(1u128));
        assert!(sum.to_u128().is_none());
        assert_eq!(sum.checked_sub(big), Some(Balance::from(1u128)));
        assert_eq!(big.checked_sub(sum), None);
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let a = Balance::from(9_500_000_000_000u128);
        let b = Balance::from(10_000_000_000_000u128);
        assert_eq!(a.abs_diff(b), Balance::from(500_000_000_000u128));
        assert_eq!(b.abs_diff(a), Balance::from(500_000_000_000u128));
    }

    #[test]
    fn pow10_scaling() {
        assert_eq!(Balance::pow10(12).times(100), Balance::from(100_000_000_000_000u128));
        assert_eq!(
            Balance::pow10(20).times(100).to_string(),
            "10000000000000000000000"
        );
    }

    #[test]
    fn basis_points_round_down() {
        let amount = Balance::from(10_000_000_000_000u128);
        assert_eq!(amount.bps(500), Balance::from(500_000_000_000u128));
        assert_eq!(Balance::from(19u64).bps(500), Balance::ZERO);
    }

    #[test]
    fn deserializes_ints_and_strings() {
        #[derive(Deserialize)]
        struct Amounts {
            small: Balance,
            large: Balance,
        }

        let parsed: Amounts =
            toml::from_str("small = 500\nlarge = \"100,000,000,000,000,000,000\"").unwrap();
        assert_eq!(parsed.small, Balance::from(500u64));
        assert_eq!(parsed.large, Balance::pow10(20));
    }
}
