//! Type-safe price representation using decimal arithmetic.
//!
//! The restaurant only sells in Colombian pesos, so a `Price` is a bare
//! decimal amount. Pesos have no minor unit in practice; amounts are rounded
//! to whole pesos for display.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

/// An amount in Colombian pesos (COP).
///
/// Serializes as a JSON number so it matches the `basePrice`/`total` fields
/// the browser keeps in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero pesos.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount a `NUMERIC(12, 2)` column holds: 9.999.999.999,99.
    pub const MAX_STORED: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2));

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of pesos.
    #[must_use]
    pub fn from_pesos(pesos: i64) -> Self {
        Self(Decimal::from(pesos))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// `self + rhs`, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `self × quantity`, or `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Whether the amount fits the order tables (at most [`Price::MAX_STORED`]).
    #[must_use]
    pub fn fits_stored(&self) -> bool {
        *self <= Self::MAX_STORED
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Format for display, e.g. `$25.000`.
    ///
    /// Uses the Colombian convention of `.` as thousands separator.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let digits = rounded.abs().trunc().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        if rounded.is_sign_negative() && !rounded.is_zero() {
            format!("-${grouped}")
        } else {
            format!("${grouped}")
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

// The operators saturate at `Decimal::MAX`; use the `checked_*` methods to
// detect overflow.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_mul(Decimal::from(rhs)))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_pesos(0).display(), "$0");
        assert_eq!(Price::from_pesos(900).display(), "$900");
        assert_eq!(Price::from_pesos(1_000).display(), "$1.000");
        assert_eq!(Price::from_pesos(25_000).display(), "$25.000");
        assert_eq!(Price::from_pesos(1_234_567).display(), "$1.234.567");
    }

    #[test]
    fn test_display_rounds_fractional_pesos() {
        assert_eq!(Price::new(Decimal::new(2_499_950, 2)).display(), "$25.000");
        assert_eq!(Price::new(Decimal::new(-150_000, 2)).display(), "-$1.500");
    }

    #[test]
    fn test_arithmetic() {
        let burger = Price::from_pesos(22_000);
        let bacon = Price::from_pesos(4_000);
        assert_eq!((burger + bacon) * 2, Price::from_pesos(52_000));

        let total: Price = [burger, bacon].iter().sum();
        assert_eq!(total, Price::from_pesos(26_000));
    }

    #[test]
    fn test_overflow_is_detected_not_panicking() {
        let huge = Price::new(Decimal::from_str_exact("50000000000000000000000000000").unwrap());

        assert_eq!(huge.checked_mul(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(huge * 2, Price::new(Decimal::MAX));
        assert_eq!(huge + huge, Price::new(Decimal::MAX));

        assert_eq!(
            Price::from_pesos(22_000).checked_mul(3),
            Some(Price::from_pesos(66_000))
        );
    }

    #[test]
    fn test_max_stored_matches_numeric_12_2() {
        assert_eq!(Price::MAX_STORED.amount().to_string(), "9999999999.99");
        assert!(Price::MAX_STORED.fits_stored());
        assert!(!Price::from_pesos(10_000_000_000).fits_stored());
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Price::from_pesos(18_500)).unwrap();
        assert_eq!(json, "18500.0");

        let parsed: Price = serde_json::from_str("18500").unwrap();
        assert_eq!(parsed, Price::from_pesos(18_500));
    }

    #[test]
    fn test_is_negative() {
        assert!(Price::from_pesos(-1).is_negative());
        assert!(!Price::ZERO.is_negative());
    }
}
