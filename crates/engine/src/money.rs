use std::{fmt, str::FromStr};

use crate::EngineError;

/// Signed money amount represented as integer **minor units** (cents).
///
/// Every balance, price and journal amount in the engine is an `i64` number
/// of minor units; `Money` wraps it where amounts are typed or printed.
///
/// ```rust
/// use engine::Money;
///
/// let fare = Money::new(350_00);
/// assert_eq!(fare.to_string(), "350.00");
/// assert_eq!("350".parse::<Money>().unwrap(), fare);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string (`350`, `350.5`, `350,50`, `-12.00`).
    ///
    /// At most 2 fractional digits are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s:?}"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let rest = rest.trim().replace(',', ".");
        if rest.is_empty() {
            return Err(invalid());
        }

        let (major_str, frac_str) = match rest.split_once('.') {
            Some((major, frac)) => (major, frac),
            None => (rest.as_str(), ""),
        };
        if major_str.is_empty()
            || !major_str.chars().all(|c| c.is_ascii_digit())
            || !frac_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let major: i64 = major_str.parse().map_err(|_| overflow())?;
        let frac: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            2 => frac_str.parse::<i64>().map_err(|_| invalid())?,
            _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
        };

        let total = major
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_pads_minor_units() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(5).to_string(), "0.05");
        assert_eq!(Money::new(35_000).to_string(), "350.00");
        assert_eq!(Money::new(-1_050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("350".parse::<Money>().unwrap().minor(), 35_000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1_050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1_050);
        assert_eq!("-0.01".parse::<Money>().unwrap().minor(), -1);
        assert_eq!(" +2.30 ".parse::<Money>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
    }
}
