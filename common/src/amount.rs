//! Fixed-point amounts for quantities, payments and balances.
//!
//! Values cross the store boundary as canonical decimal strings and are held
//! as [`rust_decimal::Decimal`] everywhere else. Only addition and subtraction
//! are performed on them. A sum whose exact value does not fit the 96-bit
//! mantissa is reported as overflow instead of being rounded, so every replica
//! computes the same digits and no fraction is ever lost.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of fractional digits accepted after normalization.
pub const MAX_SCALE: u32 = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("`{0}` is not a decimal number")]
    Malformed(String),

    #[error("`{value}` has {scale} fractional digits, at most {MAX_SCALE} are allowed")]
    TooPrecise { value: String, scale: u32 },

    #[error("`{0}` is negative")]
    Negative(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Parses a signed decimal in `[-]digits[.digits]` form.
    pub fn parse(raw: &str) -> Result<Self, AmountError> {
        let unsigned = raw.strip_prefix('-').unwrap_or(raw);
        if !is_plain_decimal(unsigned) {
            return Err(AmountError::Malformed(raw.to_string()));
        }
        let value = Decimal::from_str_exact(raw)
            .map_err(|_| AmountError::Malformed(raw.to_string()))?
            .normalize();
        if value.scale() > MAX_SCALE {
            return Err(AmountError::TooPrecise {
                value: raw.to_string(),
                scale: value.scale(),
            });
        }
        if value.is_zero() {
            return Ok(Amount::ZERO);
        }
        Ok(Amount(value))
    }

    /// Parses a decimal that must not carry a sign. `-0` is rejected too.
    pub fn parse_non_negative(raw: &str) -> Result<Self, AmountError> {
        if raw.starts_with('-') {
            return Err(AmountError::Negative(raw.to_string()));
        }
        Self::parse(raw)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// `None` on overflow or when the exact sum would need rounding.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.exact(other, self.0.checked_add(other.0)?)
    }

    /// `None` on overflow or when the exact difference would need rounding.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.exact(other, self.0.checked_sub(other.0)?)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// `rust_decimal` sheds fractional digits when the mantissa runs out, so a
    /// result carrying fewer digits than its widest operand was rounded.
    fn exact(self, other: Amount, result: Decimal) -> Option<Amount> {
        if result.scale() < self.0.scale().max(other.0.scale()) {
            return None;
        }
        Some(Amount::canonical(result))
    }

    fn canonical(value: Decimal) -> Amount {
        if value.is_zero() {
            Amount::ZERO
        } else {
            Amount(value.normalize())
        }
    }
}

fn is_plain_decimal(s: &str) -> bool {
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match s.split_once('.') {
        Some((whole, fraction)) => all_digits(whole) && all_digits(fraction),
        None => all_digits(s),
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(raw: &str) -> Amount {
        Amount::parse(raw).unwrap()
    }

    #[test]
    fn test_canonical_form_drops_trailing_zeros() {
        assert_eq!(amount("10.0").to_string(), "10");
        assert_eq!(amount("0.50").to_string(), "0.5");
        assert_eq!(amount("007").to_string(), "7");
        assert_eq!(amount("-0.0").to_string(), "0");
        assert_eq!(amount("-12.340").to_string(), "-12.34");
    }

    #[test]
    fn test_rejects_non_plain_notation() {
        for raw in ["", "1e3", "1_000", "+1", " 1", "1 ", "1.", ".5", "1.2.3", "--1", "NaN", "0x10"] {
            assert!(
                matches!(Amount::parse(raw), Err(AmountError::Malformed(_))),
                "`{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn test_scale_limit() {
        assert_eq!(amount("0.12345678").to_string(), "0.12345678");
        // trailing zeros do not count against the limit
        assert_eq!(amount("1.000000000000").to_string(), "1");
        assert!(matches!(
            Amount::parse("0.123456789"),
            Err(AmountError::TooPrecise { scale: 9, .. })
        ));
    }

    #[test]
    fn test_parse_non_negative() {
        assert_eq!(Amount::parse_non_negative("0").unwrap(), Amount::ZERO);
        assert!(matches!(
            Amount::parse_non_negative("-1"),
            Err(AmountError::Negative(_))
        ));
        assert!(matches!(
            Amount::parse_non_negative("-0"),
            Err(AmountError::Negative(_))
        ));
    }

    #[test]
    fn test_arithmetic_is_exact() {
        assert_eq!(amount("0.1").checked_add(amount("0.2")).unwrap(), amount("0.3"));
        assert_eq!(amount("1.5").checked_add(amount("1.5")).unwrap().to_string(), "3");
        assert_eq!(amount("50").checked_sub(amount("80")).unwrap().to_string(), "-30");
        assert_eq!(amount("80").checked_sub(amount("80")).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_overflow_is_reported() {
        let max = amount("79228162514264337593543950335");
        assert!(max.checked_add(amount("1")).is_none());
        assert!(Amount::parse("79228162514264337593543950336").is_err());
    }

    #[test]
    fn test_inexact_result_is_reported() {
        let large = amount("1000000000000000000000");
        let tick = amount("0.00000001");
        assert_eq!(large.checked_add(tick), None);
        assert_eq!(large.checked_sub(tick), None);
        assert_eq!(tick.checked_sub(large), None);

        // one digit less still fits at full precision
        let fits = amount("100000000000000000000");
        let sum = fits.checked_add(tick).unwrap();
        assert_eq!(sum.to_string(), "100000000000000000000.00000001");
        assert_eq!(sum.checked_sub(fits).unwrap(), tick);
    }

    #[test]
    fn test_sign_predicates() {
        assert!(amount("0.00000001").is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!amount("-3").is_positive());
    }
}
