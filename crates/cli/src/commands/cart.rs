//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of a product
//! pn-cli cart add 1 --name "Monstera Deliciosa" --price 24.99 -q 2
//!
//! # Change or remove lines
//! pn-cli cart update 1 3
//! pn-cli cart remove 1
//!
//! # Inspect or empty the cart
//! pn-cli cart show
//! pn-cli cart clear
//! ```

use paradise_nursery_cart::{CartState, CartStore, PricingPolicy, Product};
use paradise_nursery_core::Money;
use rust_decimal::Decimal;
use tracing::info;

use super::CommandError;

/// Add `quantity` units of a product.
///
/// # Errors
///
/// Returns a validation error if the product or quantity is rejected.
pub fn add(
    store: &mut CartStore,
    policy: &PricingPolicy,
    product: Product,
    quantity: i64,
) -> Result<(), CommandError> {
    let id = product.id.clone();
    let state = store.add_item(product, quantity)?;
    info!(product_id = %id, quantity, items = state.items_count(), "Added to cart");
    print_cart(state, policy);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns a validation error if `id` is blank.
pub fn remove(store: &mut CartStore, policy: &PricingPolicy, id: &str) -> Result<(), CommandError> {
    let state = store.remove_item(id)?;
    info!(product_id = id, "Removed from cart");
    print_cart(state, policy);
    Ok(())
}

/// Set a line's quantity; zero or less removes it.
///
/// # Errors
///
/// Returns a validation error if `id` is blank.
pub fn update(
    store: &mut CartStore,
    policy: &PricingPolicy,
    id: &str,
    quantity: i64,
) -> Result<(), CommandError> {
    let state = store.update_quantity(id, quantity)?;
    info!(product_id = id, quantity, "Cart quantity updated");
    print_cart(state, policy);
    Ok(())
}

/// Empty the cart.
pub fn clear(store: &mut CartStore, policy: &PricingPolicy) {
    let state = store.clear();
    info!("Cart cleared");
    print_cart(state, policy);
}

/// Print the cart, as a table or as the persisted JSON.
///
/// # Errors
///
/// Returns an error if JSON rendering fails.
#[allow(clippy::print_stdout)]
pub fn show(state: &CartState, policy: &PricingPolicy, json: bool) -> Result<(), CommandError> {
    if json {
        println!("{}", serde_json::to_string_pretty(state.items())?);
    } else {
        print_cart(state, policy);
    }
    Ok(())
}

fn usd(amount: Decimal) -> Money {
    Money::usd(amount)
}

#[allow(clippy::print_stdout)]
fn print_cart(state: &CartState, policy: &PricingPolicy) {
    if state.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for item in state.items() {
        println!(
            "{:>3} x {} [{}] @ {} = {}",
            item.quantity,
            item.name,
            item.id,
            usd(item.price),
            usd(item.line_total())
        );
    }
    let subtotal = state.total();
    println!("Items: {}", state.items_count());
    println!("Subtotal: {}", usd(subtotal));
    if let Some(remaining) = policy.amount_until_free_shipping(subtotal) {
        println!("Add {} more for free shipping.", usd(remaining));
    } else {
        println!("This order ships free.");
    }
}
