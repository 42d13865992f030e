//! Type-safe price representation using decimal arithmetic.
//!
//! Book prices and line item price snapshots are `NUMERIC(10, 2)` in the
//! database and [`Price`] in Rust. Order totals may legitimately be zero (an
//! empty cart), so they stay plain [`Decimal`].

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below the one-cent minimum.
    #[error("price must be greater than or equal to {min}")]
    BelowMinimum {
        /// Smallest accepted amount.
        min: Decimal,
    },
    /// The amount has fractional cents.
    #[error("price must have at most two decimal places")]
    TooPrecise,
}

/// A positive price with cent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Smallest accepted price (one cent).
    pub const MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

    /// Create a price, validating the minimum and the precision.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::BelowMinimum`] for amounts under 0.01 and
    /// [`PriceError::TooPrecise`] for fractional cents.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Self::MIN {
            return Err(PriceError::BelowMinimum { min: Self::MIN });
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::BelowMinimum`] if `cents` is less than one.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

/// Format any decimal amount the way prices are displayed.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("${amount:.2}")
}

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
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
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
    fn test_minimum_is_one_cent() {
        assert!(Price::new(Decimal::new(1, 2)).is_ok());
        assert_eq!(
            Price::new(Decimal::ZERO),
            Err(PriceError::BelowMinimum { min: Price::MIN })
        );
        assert!(Price::new(Decimal::new(-999, 2)).is_err());
    }

    #[test]
    fn test_rejects_fractional_cents() {
        assert_eq!(Price::new(Decimal::new(9999, 3)), Err(PriceError::TooPrecise));
        // Trailing zeros are not extra precision
        assert!(Price::new(Decimal::new(9990, 3)).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(999).unwrap().to_string(), "$9.99");
        assert_eq!(Price::from_cents(1500).unwrap().to_string(), "$15.00");
        assert_eq!(format_amount(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_deserialize_from_string() {
        let price: Price = serde_json::from_str("\"9.99\"").unwrap();
        assert_eq!(price.amount(), Decimal::new(999, 2));
        assert!(serde_json::from_str::<Price>("\"0.00\"").is_err());
    }
}
