//! Checked token amounts.
//!
//! [`Amount`] wraps a `u128` count of base units. Arithmetic goes through
//! the `checked_*` methods, which turn overflow, underflow and division by
//! zero into [`TokenError::ArithmeticOverflow`] instead of wrapping. The
//! only non-failing subtraction is [`Amount::saturating_sub`], used where a
//! result is defined to clamp at zero.
//!
//! Conversion to and from decimal whole-token strings is exact; no floating
//! point is involved anywhere.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{ParseAmountError, TokenError};

/// A non-negative quantity of base units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(u128);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Largest representable amount.
    pub const MAX: Self = Self(u128::MAX);

    /// Wrap a raw base-unit count.
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// Raw base-unit count.
    pub const fn get(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, TokenError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(TokenError::ArithmeticOverflow)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, TokenError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(TokenError::ArithmeticOverflow)
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self, TokenError> {
        self.0
            .checked_mul(rhs.0)
            .map(Self)
            .ok_or(TokenError::ArithmeticOverflow)
    }

    /// Truncating division. Division by zero is an error.
    pub fn checked_div(self, rhs: Self) -> Result<Self, TokenError> {
        self.0
            .checked_div(rhs.0)
            .map(Self)
            .ok_or(TokenError::ArithmeticOverflow)
    }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// `whole * 10^decimals`, e.g. `from_units(5, 18)` is five tokens.
    pub fn from_units(whole: u64, decimals: u8) -> Result<Self, TokenError> {
        Self::from(whole).checked_mul(scale(decimals)?)
    }

    /// Parse a decimal whole-token string such as `"1.5"` into base units.
    ///
    /// Rejects signs, exponents and more fractional digits than `decimals`.
    pub fn parse_units(s: &str, decimals: u8) -> Result<Self, ParseAmountError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseAmountError::Empty);
        }
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseAmountError::Empty);
        }
        if let Some(c) = int_part
            .chars()
            .chain(frac_part.chars())
            .find(|c| !c.is_ascii_digit())
        {
            return Err(ParseAmountError::InvalidCharacter(c));
        }
        if frac_part.len() > decimals as usize {
            return Err(ParseAmountError::TooPrecise {
                got: frac_part.len(),
                max: decimals,
            });
        }

        let scale = scale(decimals).map_err(|_| ParseAmountError::OutOfRange)?;
        let mut units = Self::ZERO;
        for c in int_part.chars() {
            units = units
                .checked_mul(Self(10))
                .and_then(|u| u.checked_add(Self(digit(c))))
                .map_err(|_| ParseAmountError::OutOfRange)?;
        }
        units = units
            .checked_mul(scale)
            .map_err(|_| ParseAmountError::OutOfRange)?;

        // Fractional digits weigh 10^(decimals-1), 10^(decimals-2), ...
        let mut weight = scale.0;
        for c in frac_part.chars() {
            weight /= 10;
            units = units
                .checked_add(Self(digit(c) * weight))
                .map_err(|_| ParseAmountError::OutOfRange)?;
        }
        Ok(units)
    }

    /// Render as a decimal whole-token string with trailing zeros trimmed.
    pub fn format_units(self, decimals: u8) -> String {
        if decimals == 0 {
            return self.0.to_string();
        }
        let Ok(scale) = scale(decimals) else {
            return self.0.to_string();
        };
        let whole = self.0 / scale.0;
        let frac = self.0 % scale.0;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:0width$}", width = decimals as usize);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }

    /// Whole tokens, truncated.
    pub fn whole_tokens(self, decimals: u8) -> u128 {
        match scale(decimals) {
            Ok(scale) => self.0 / scale.0,
            Err(_) => 0,
        }
    }
}

/// `10^decimals` as an amount.
fn scale(decimals: u8) -> Result<Amount, TokenError> {
    10u128
        .checked_pow(decimals as u32)
        .map(Amount)
        .ok_or(TokenError::ArithmeticOverflow)
}

fn digit(c: char) -> u128 {
    c.to_digit(10).unwrap_or(0) as u128
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units as u128)
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Parse a raw base-unit count (no decimal point).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_units(s, 0)
    }
}

// Serialized as a decimal string: JSON consumers commonly lose precision
// above 2^53.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
