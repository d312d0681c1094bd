//! Pricing and checkout commands.
//!
//! # Usage
//!
//! ```bash
//! # Price the cart for a destination
//! pn-cli quote --country US
//! pn-cli shipping-options --country GB
//!
//! # Place the order
//! pn-cli checkout --email fern@example.com --first-name Rosa --last-name Canina \
//!     --address "12 Greenhouse Way" --city Portland --state OR --postal-code 97201 \
//!     --country US --payment card --card-number 4242424242424242
//! ```

use clap::Args;
use paradise_nursery_cart::{
    CartState, CartStore, CheckoutForm, CheckoutOrchestrator, CustomerIdentity,
    LocalOrderSubmitter, PaymentInput, PricingPolicy, ShippingAddressInput,
};
use paradise_nursery_core::{CountryCode, Email, Money};
use tracing::info;

use super::CommandError;

/// Contact, shipping and payment details for `pn-cli checkout`.
///
/// Every field is optional on the command line so that missing values are
/// reported together by checkout validation.
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Contact email (ignored with --account-email)
    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,

    /// Street address
    #[arg(long, default_value = "")]
    pub address: String,

    #[arg(long, default_value = "")]
    pub city: String,

    /// State, province or region
    #[arg(long, default_value = "")]
    pub state: String,

    #[arg(long, default_value = "")]
    pub postal_code: String,

    /// Two-letter country code
    #[arg(long, default_value = "")]
    pub country: String,

    /// Payment method (`card`, `paypal`)
    #[arg(long, default_value = "card")]
    pub payment: String,

    /// Card number; only the last four digits are kept
    #[arg(long)]
    pub card_number: Option<String>,

    #[arg(long)]
    pub name_on_card: Option<String>,

    /// Check out as a signed-in customer with this account email
    #[arg(long)]
    pub account_email: Option<Email>,

    /// Display name of the signed-in customer
    #[arg(long, requires = "account_email", default_value = "")]
    pub account_name: String,

    /// Print the order as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckoutArgs {
    fn into_parts(self) -> (CheckoutForm, Option<CustomerIdentity>) {
        let mut payment_method = PaymentInput::new(self.payment);
        if let Some(number) = self.card_number {
            payment_method = payment_method.with_card(number, self.name_on_card);
        }
        let form = CheckoutForm {
            email: self.email,
            shipping_address: ShippingAddressInput {
                first_name: self.first_name,
                last_name: self.last_name,
                address: self.address,
                city: self.city,
                state: self.state,
                postal_code: self.postal_code,
                country: self.country,
            },
            payment_method,
        };
        let identity = self.account_email.map(|email| CustomerIdentity {
            email,
            name: self.account_name,
        });
        (form, identity)
    }
}

/// Print subtotal, shipping, tax and total for `country`.
///
/// # Errors
///
/// Returns an error if JSON rendering fails.
#[allow(clippy::print_stdout)]
pub fn quote(
    state: &CartState,
    policy: &PricingPolicy,
    country: &CountryCode,
    json: bool,
) -> Result<(), CommandError> {
    let prices = policy.total(state.items(), country).rounded();
    if json {
        println!("{}", serde_json::to_string_pretty(&prices)?);
        return Ok(());
    }

    println!("Destination: {country}");
    println!("Subtotal: {}", Money::usd(prices.subtotal));
    if prices.shipping.is_zero() {
        println!("Shipping: FREE");
    } else {
        println!("Shipping: {}", Money::usd(prices.shipping));
    }
    println!("Tax: {}", Money::usd(prices.tax));
    println!("Total: {}", Money::usd(prices.total));
    Ok(())
}

/// Print the delivery choices for `country`.
///
/// # Errors
///
/// Returns an error if JSON rendering fails.
#[allow(clippy::print_stdout)]
pub fn shipping_options(
    state: &CartState,
    policy: &PricingPolicy,
    country: &CountryCode,
    json: bool,
) -> Result<(), CommandError> {
    let options = policy.shipping_options(state.total(), country);
    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    for option in &options {
        println!(
            "{:<10} {:<20} {:>8}  {}",
            option.id,
            option.name,
            Money::usd(option.price).to_string(),
            option.estimated_days
        );
    }
    Ok(())
}

/// Validate the input, place the order and empty the cart.
///
/// # Errors
///
/// Returns the checkout error: empty cart, invalid input, or a failed
/// submission (the cart is kept in that case).
#[allow(clippy::print_stdout)]
pub async fn checkout(
    store: &mut CartStore,
    policy: &PricingPolicy,
    args: CheckoutArgs,
) -> Result<(), CommandError> {
    let json = args.json;
    let (form, identity) = args.into_parts();

    let mut orchestrator =
        CheckoutOrchestrator::with_policy(LocalOrderSubmitter::new(), policy.clone());
    let order = orchestrator.checkout(store, &form, identity.as_ref()).await?;
    info!(order_id = %order.id, phase = %orchestrator.phase(), "Order placed");

    if json {
        println!("{}", serde_json::to_string_pretty(&order)?);
        return Ok(());
    }

    println!("Order {} placed ({}).", order.id, order.status);
    println!("Items: {}", order.items_count());
    println!("Subtotal: {}", Money::usd(order.subtotal));
    println!("Shipping: {}", Money::usd(order.shipping));
    println!("Tax: {}", Money::usd(order.tax));
    println!("Total: {}", Money::usd(order.total));
    println!(
        "Ship to: {}, {}, {} {} {}",
        order.shipping_address.full_name(),
        order.shipping_address.address,
        order.shipping_address.city,
        order.shipping_address.postal_code,
        order.shipping_address.country
    );
    Ok(())
}
