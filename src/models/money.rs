//! Dollar amounts held as integer cents
//!
//! Every boundary rounds to the cent: parsed strings, JSON dollars, scaled
//! floors, and basis-point shares of a deposit. JSON carries decimal dollars
//! because persisted plans and deposit plans are replayed in that shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use thiserror::Error;

use super::routing::TOTAL_BPS;

/// A dollar amount in cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// ```
    /// use envelope_fixit::models::Money;
    /// assert_eq!(Money::from_cents(1050).to_string(), "$10.50");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    /// Round fractional dollars to the nearest cent, half away from zero
    ///
    /// Non-finite input becomes zero.
    ///
    /// ```
    /// use envelope_fixit::models::Money;
    /// assert_eq!(Money::round2(10.005).cents(), 1001);
    /// ```
    pub fn round2(dollars: f64) -> Self {
        if !dollars.is_finite() {
            return Self::zero();
        }
        // 10.005 is stored as 10.00499..; nudge so it rounds up like it reads
        let scaled = dollars * 100.0;
        Self((scaled + scaled.signum() * 1e-7).round() as i64)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Clamp negative amounts to zero
    pub fn non_negative(self) -> Self {
        self.max(Self::zero())
    }

    /// Multiply by a (possibly fractional) month count, rounding to the cent
    pub fn times_months(&self, months: f64) -> Self {
        Self::round2(self.0 as f64 / 100.0 * months)
    }

    /// Even share for each of `deposits` deposits, rounded to the cent
    pub fn per_deposit(&self, deposits: u32) -> Self {
        Self(div_round(self.0, i64::from(deposits.max(1))))
    }

    /// Dollar value of `bps` basis points of this amount
    pub fn bps_share(&self, bps: i64) -> Self {
        Self(div_round(self.0 * bps, TOTAL_BPS))
    }

    /// This amount as basis points of `whole`, rounded; zero when `whole` is not positive
    pub fn as_bps_of(&self, whole: Money) -> i64 {
        if whole.0 <= 0 {
            return 0;
        }
        div_round(self.0 * TOTAL_BPS, whole.0)
    }

    /// Parse a dollar amount as typed by a person or found in a budget sheet
    ///
    /// Accepts "1500", "1,500.00", "$10.5", "-$3", "($45.10)". Digits past
    /// the cent round half away from zero, so "10.999" is $11.00.
    pub fn parse(input: &str) -> Result<Self, MoneyParseError> {
        let invalid = || MoneyParseError::InvalidFormat(input.trim().to_string());
        let mut s = input.trim();

        let mut negative = false;
        if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            negative = true;
            s = inner.trim();
        }
        if let Some(rest) = s.strip_prefix('-') {
            negative = !negative;
            s = rest;
        }
        s = s.strip_prefix('$').unwrap_or(s);

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let mut cents: i64 = 0;
        for c in whole.chars().filter(|c| *c != ',') {
            let digit = c.to_digit(10).ok_or_else(invalid)?;
            cents = cents
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(digit)))
                .ok_or_else(invalid)?;
        }
        cents = cents.checked_mul(100).ok_or_else(invalid)?;

        let mut digits = Vec::new();
        for c in fraction.chars() {
            digits.push(c.to_digit(10).ok_or_else(invalid)?);
        }
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).is_some_and(|d| *d >= 5);
        cents = cents
            .checked_add(i64::from(tenths * 10 + hundredths) + i64::from(round_up))
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -cents } else { cents }))
    }
}

/// Integer division rounding half away from zero
fn div_round(numerator: i64, denominator: i64) -> i64 {
    let (n, d) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };
    if n >= 0 {
        (n + d / 2) / d
    } else {
        -((-n + d / 2) / d)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Money::round2(f64::deserialize(deserializer)?))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|m| m.0).sum())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    #[error("Invalid money format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(Money::round2(1500.0).cents(), 150000);
        assert_eq!(Money::round2(0.015).cents(), 2);
        assert_eq!(Money::round2(-12.345).cents(), -1235);
        assert_eq!(Money::round2(f64::NAN).cents(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "$10.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
        assert_eq!(Money::from_cents(-1050).to_string(), "-$10.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!((b - a).non_negative(), Money::zero());
        assert_eq!([a, b, -b].into_iter().sum::<Money>(), a);
    }

    #[test]
    fn test_months_and_deposits() {
        assert_eq!(Money::from_dollars(300).times_months(1.5), Money::from_dollars(450));
        assert_eq!(Money::from_cents(1000).per_deposit(3).cents(), 333);
        assert_eq!(Money::from_cents(1001).per_deposit(2).cents(), 501);
        assert_eq!(Money::from_cents(500).per_deposit(0).cents(), 500);
    }

    #[test]
    fn test_bps_conversions() {
        let deposit = Money::from_dollars(2500);
        assert_eq!(deposit.bps_share(6000), Money::from_dollars(1500));
        assert_eq!(deposit.bps_share(-120), Money::from_dollars(-30));
        assert_eq!(Money::from_dollars(30).as_bps_of(deposit), 120);
        assert_eq!(Money::from_cents(5).as_bps_of(deposit), 0);
        assert_eq!(Money::from_dollars(30).as_bps_of(Money::zero()), 0);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("$10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-10.50").unwrap().cents(), -1050);
        assert_eq!(Money::parse("-$3").unwrap().cents(), -300);
        assert_eq!(Money::parse(" 10 ").unwrap().cents(), 1000);
        assert_eq!(Money::parse("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse(".05").unwrap().cents(), 5);
        assert_eq!(Money::parse("$1,250.00").unwrap().cents(), 125000);
        assert_eq!(Money::parse("($45.10)").unwrap().cents(), -4510);
        assert!(Money::parse("").is_err());
        assert!(Money::parse("$").is_err());
        assert!(Money::parse(".").is_err());
        assert!(Money::parse("ten").is_err());
        assert!(Money::parse("1.2.3").is_err());
    }

    #[test]
    fn test_parse_rounds_extra_decimals() {
        assert_eq!(Money::parse("10.999").unwrap().cents(), 1100);
        assert_eq!(Money::parse("10.994").unwrap().cents(), 1099);
        assert_eq!(Money::parse("-0.005").unwrap().cents(), -1);
    }

    #[test]
    fn test_parse_rejects_non_ascii_digits() {
        assert!(Money::parse("1.€").is_err());
        assert!(Money::parse("1.5€").is_err());
        assert!(Money::parse("€10").is_err());
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_serializes_as_dollars() {
        let json = serde_json::to_string(&Money::from_cents(1050)).unwrap();
        assert_eq!(json, "10.5");

        let deserialized: Money = serde_json::from_str("1500.004").unwrap();
        assert_eq!(deserialized.cents(), 150000);
    }
}
