//! Type-safe money representation using decimal arithmetic.
//!
//! All cart arithmetic is carried out on full-precision [`Decimal`] values.
//! Rounding to cents happens only at the display boundary via
//! [`round_cents`] or [`Money::rounded`].

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round an amount to whole cents, half away from zero.
///
/// ```
/// use paradise_nursery_core::round_cents;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_cents(Decimal::new(680_076, 4)), Decimal::new(6801, 2));
/// assert_eq!(round_cents(Decimal::new(1_005, 3)), Decimal::new(101, 2));
/// ```
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// An amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a USD amount.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// Returns the same amount rounded to cents.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self::new(round_cents(self.amount), self.currency_code)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = round_cents(self.amount);
        if cents.is_sign_negative() && !cents.is_zero() {
            write!(f, "-{}{:.2}", self.currency_code.symbol(), cents.abs())
        } else {
            write!(f, "{}{:.2}", self.currency_code.symbol(), cents.abs())
        }
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}
