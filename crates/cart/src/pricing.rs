//! Pricing engine.
//!
//! Pure functions over line items and a destination country. Nothing here
//! keeps state between calls, so the cart page and the checkout page always
//! compute identical figures from identical inputs.
//!
//! Amounts are kept at full precision. Round only for display, via
//! [`PriceBreakdown::rounded`] or [`paradise_nursery_core::Money`].
//!
//! Arithmetic saturates at the `Decimal` bounds instead of panicking. Carts
//! built through [`crate::apply`] keep their totals in range, so saturation
//! only shows up with a policy whose rates are themselves extreme.

use std::collections::{BTreeMap, BTreeSet};

use paradise_nursery_core::{CountryCode, round_cents};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::item::LineItem;

/// Sum of price times quantity, full precision.
#[must_use]
pub fn subtotal(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .map(LineItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Shipping tiers and tax table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Subtotals at or above this ship free (domestic and international).
    pub free_shipping_threshold: Decimal,
    /// Flat rate for destinations in `domestic_countries`.
    pub domestic_rate: Decimal,
    /// Flat rate for every other destination.
    pub international_rate: Decimal,
    pub domestic_countries: BTreeSet<CountryCode>,
    /// Tax rate per destination; missing destinations are untaxed.
    pub tax_rates: BTreeMap<CountryCode, Decimal>,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(50, 0),
            domestic_rate: Decimal::new(599, 2),
            international_rate: Decimal::new(1499, 2),
            domestic_countries: BTreeSet::from([CountryCode::us(), CountryCode::ca()]),
            tax_rates: BTreeMap::from([
                (CountryCode::us(), Decimal::new(8, 2)),
                (CountryCode::ca(), Decimal::new(13, 2)),
                (CountryCode::eu(), Decimal::new(20, 2)),
            ]),
        }
    }
}

impl PricingPolicy {
    /// Returns `true` if `country` ships at the domestic rate.
    #[must_use]
    pub fn is_domestic(&self, country: &CountryCode) -> bool {
        self.domestic_countries.contains(country)
    }

    /// Shipping charge for an order of `subtotal` to `country`.
    #[must_use]
    pub fn shipping(&self, subtotal: Decimal, country: &CountryCode) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else if self.is_domestic(country) {
            self.domestic_rate
        } else {
            self.international_rate
        }
    }

    /// Tax rate for `country`, zero when unknown.
    #[must_use]
    pub fn tax_rate(&self, country: &CountryCode) -> Decimal {
        self.tax_rates.get(country).copied().unwrap_or(Decimal::ZERO)
    }

    /// Tax owed on `subtotal` for `country`, full precision.
    #[must_use]
    pub fn tax(&self, subtotal: Decimal, country: &CountryCode) -> Decimal {
        subtotal.saturating_mul(self.tax_rate(country))
    }

    /// Subtotal, shipping, tax and total for `items` shipped to `country`.
    #[must_use]
    pub fn total(&self, items: &[LineItem], country: &CountryCode) -> PriceBreakdown {
        let subtotal = subtotal(items);
        let shipping = self.shipping(subtotal, country);
        let tax = self.tax(subtotal, country);
        PriceBreakdown {
            subtotal,
            shipping,
            tax,
            total: subtotal.saturating_add(shipping).saturating_add(tax),
        }
    }

    /// How much more the customer must spend to ship free, or `None` once the
    /// threshold is met.
    #[must_use]
    pub fn amount_until_free_shipping(&self, subtotal: Decimal) -> Option<Decimal> {
        (subtotal < self.free_shipping_threshold).then(|| self.free_shipping_threshold - subtotal)
    }

    /// Delivery choices offered for an order of `subtotal` to `country`.
    ///
    /// Standard (at the destination's flat rate), express and overnight are
    /// always listed. Free shipping is listed first when the order qualifies
    /// and the destination is domestic.
    #[must_use]
    pub fn shipping_options(
        &self,
        subtotal: Decimal,
        country: &CountryCode,
    ) -> Vec<ShippingOption> {
        let standard_rate = if self.is_domestic(country) {
            self.domestic_rate
        } else {
            self.international_rate
        };
        let mut options = Vec::with_capacity(4);
        if subtotal >= self.free_shipping_threshold && self.is_domestic(country) {
            options.push(ShippingOption {
                id: "free".to_string(),
                name: "Free Shipping".to_string(),
                price: Decimal::ZERO,
                estimated_days: "5-7 business days".to_string(),
            });
        }
        options.extend([
            ShippingOption {
                id: "standard".to_string(),
                name: "Standard Shipping".to_string(),
                price: standard_rate,
                estimated_days: "5-7 business days".to_string(),
            },
            ShippingOption {
                id: "express".to_string(),
                name: "Express Shipping".to_string(),
                price: Decimal::new(1299, 2),
                estimated_days: "2-3 business days".to_string(),
            },
            ShippingOption {
                id: "overnight".to_string(),
                name: "Overnight Shipping".to_string(),
                price: Decimal::new(2499, 2),
                estimated_days: "1 business day".to_string(),
            },
        ]);
        options
    }
}

/// Full-precision figures for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Every figure rounded to cents for display.
    ///
    /// Each field is rounded independently from its full-precision value, so
    /// the rounded parts need not add up to the rounded total.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_cents(self.subtotal),
            shipping: round_cents(self.shipping),
            tax: round_cents(self.tax),
            total: round_cents(self.total),
        }
    }
}

/// A delivery choice shown at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub estimated_days: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::item::Product;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn country(s: &str) -> CountryCode {
        CountryCode::parse(s).unwrap()
    }

    fn line(id: &str, price: &str, quantity: u32) -> LineItem {
        LineItem::from_product(Product::new(id, id, dec(price)), quantity)
    }

    fn scenario_items() -> Vec<LineItem> {
        vec![line("1", "24.99", 2), line("2", "12.99", 1)]
    }

    #[test]
    fn test_subtotal() {
        assert_eq!(subtotal(&scenario_items()), dec("62.97"));
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_free_shipping_boundary() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.shipping(dec("49.99"), &country("US")), dec("5.99"));
        assert_eq!(policy.shipping(dec("50.00"), &country("US")), Decimal::ZERO);
        assert_eq!(policy.shipping(dec("50.00"), &country("FR")), Decimal::ZERO);
    }

    #[test]
    fn test_shipping_tiers() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.shipping(dec("10"), &country("CA")), dec("5.99"));
        assert_eq!(policy.shipping(dec("10"), &country("GB")), dec("14.99"));
    }

    #[test]
    fn test_tax_table() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.tax(dec("100"), &country("US")), dec("8"));
        assert_eq!(policy.tax(dec("100"), &country("CA")), dec("13"));
        assert_eq!(policy.tax(dec("100"), &country("EU")), dec("20"));
        assert_eq!(policy.tax(dec("100"), &country("JP")), Decimal::ZERO);
    }

    #[test]
    fn test_scenario_totals() {
        let breakdown = PricingPolicy::default().total(&scenario_items(), &country("US"));
        assert_eq!(breakdown.subtotal, dec("62.97"));
        assert_eq!(breakdown.shipping, Decimal::ZERO);
        assert_eq!(breakdown.tax, dec("5.0376"));
        assert_eq!(breakdown.total, dec("68.0076"));

        let rounded = breakdown.rounded();
        assert_eq!(rounded.tax, dec("5.04"));
        assert_eq!(rounded.total, dec("68.01"));
    }

    #[test]
    fn test_total_is_pure() {
        let policy = PricingPolicy::default();
        let items = scenario_items();
        let first = policy.total(&items, &country("CA"));
        let _ = policy.total(&[line("9", "1.00", 1)], &country("GB"));
        let second = policy.total(&items, &country("CA"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_amount_until_free_shipping() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.amount_until_free_shipping(dec("42.50")), Some(dec("7.50")));
        assert_eq!(policy.amount_until_free_shipping(dec("50")), None);
    }

    #[test]
    fn test_shipping_options() {
        let policy = PricingPolicy::default();
        let ids = |opts: Vec<ShippingOption>| opts.into_iter().map(|o| o.id).collect::<Vec<_>>();

        assert_eq!(
            ids(policy.shipping_options(dec("60"), &country("US"))),
            ["free", "standard", "express", "overnight"]
        );
        assert_eq!(
            ids(policy.shipping_options(dec("20"), &country("US"))),
            ["standard", "express", "overnight"]
        );
        assert_eq!(
            ids(policy.shipping_options(dec("60"), &country("GB"))),
            ["standard", "express", "overnight"]
        );
    }

    #[test]
    fn test_total_at_decimal_bounds() {
        let policy = PricingPolicy::default();
        let items = [line("1", "79228162514264337593543950335", 1)];
        let breakdown = policy.total(&items, &country("US"));
        assert_eq!(breakdown.subtotal, Decimal::MAX);
        assert_eq!(breakdown.total, Decimal::MAX);

        let oversized = [line("1", "79228162514264337593543950335", 2)];
        assert_eq!(subtotal(&oversized), Decimal::MAX);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy {
            free_shipping_threshold: dec("75"),
            domestic_countries: BTreeSet::from([country("GB")]),
            ..PricingPolicy::default()
        };
        assert_eq!(policy.shipping(dec("60"), &country("GB")), dec("5.99"));
        assert_eq!(policy.shipping(dec("60"), &country("US")), dec("14.99"));
    }
}
