//! Currency codes and conversions between display amounts and minor units.
//!
//! Amounts are `Decimal` values in the currency's standard unit (rupees,
//! dollars). Payment processors expect the smallest subunit (paise, cents),
//! which is what [`Currency::minor_units`] produces.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when working with currencies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// The currency code is not one the store sells in.
    #[error("unsupported currency code: {0}")]
    Unsupported(String),
    /// The amount cannot be charged (negative or too large for minor units).
    #[error("amount {0} cannot be expressed in minor units")]
    OutOfRange(Decimal),
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl Currency {
    /// ISO 4217 code (e.g., "INR").
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Number of decimal places of the smallest subunit.
    #[must_use]
    pub const fn minor_unit_exponent(self) -> u32 {
        match self {
            Self::INR | Self::USD | Self::EUR | Self::GBP => 2,
        }
    }

    /// Convert an amount to the smallest currency subunit (paise for INR).
    ///
    /// Rounds half away from zero.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::OutOfRange`] if the amount is negative or
    /// does not fit in an `i64` once scaled.
    pub fn minor_units(self, amount: Decimal) -> Result<i64, CurrencyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(CurrencyError::OutOfRange(amount));
        }

        let scale = Decimal::from(10_i64.pow(self.minor_unit_exponent()));
        amount
            .checked_mul(scale)
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|scaled| scaled.to_i64())
            .ok_or(CurrencyError::OutOfRange(amount))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(CurrencyError::Unsupported(s.to_string())),
        }
    }
}

/// Format an amount in whole units for display (e.g., "₹100").
///
/// Rounds half away from zero.
#[must_use]
pub fn format_whole_amount(amount: Decimal, currency: Currency) -> String {
    format!(
        "{}{}",
        currency.symbol(),
        amount
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
    )
}
