//! Commerce analytics events.
//!
//! Events are emitted as structured `tracing` events on the `analytics`
//! target so a subscriber layer can forward them to whatever analytics
//! backend the deployment uses.

use paradise_nursery_core::{OrderId, ProductId};
use rust_decimal::Decimal;
use tracing::info;

use crate::store::{CartCommand, CartState};

/// A commerce event worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    AddToCart {
        product_id: ProductId,
        name: String,
        quantity: u32,
        value: Decimal,
    },
    RemoveFromCart {
        product_id: ProductId,
        name: String,
        quantity: u32,
        value: Decimal,
    },
    Purchase {
        order_id: OrderId,
        value: Decimal,
        items: usize,
    },
}

impl CartEvent {
    /// Event describing `command` against `state`, if it is one we track.
    ///
    /// Removals (including updates to zero) only produce an event when the
    /// line actually exists. Adds whose quantity is not a positive `u32`, or
    /// whose value does not fit in a `Decimal`, produce none; the store
    /// rejects those commands anyway.
    #[must_use]
    pub fn for_command(state: &CartState, command: &CartCommand) -> Option<Self> {
        match command {
            CartCommand::AddItem { product, quantity } => {
                let quantity = u32::try_from(*quantity).ok().filter(|q| *q > 0)?;
                Some(Self::AddToCart {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    quantity,
                    value: product.price.checked_mul(Decimal::from(quantity))?,
                })
            }
            CartCommand::RemoveItem { id } => Self::removal(state, id),
            CartCommand::UpdateQuantity { id, quantity } if *quantity <= 0 => {
                Self::removal(state, id)
            }
            _ => None,
        }
    }

    fn removal(state: &CartState, id: &ProductId) -> Option<Self> {
        state.get_item(id).map(|line| Self::RemoveFromCart {
            product_id: line.id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            value: line.line_total(),
        })
    }

    /// Emit the event.
    pub fn record(&self) {
        match self {
            Self::AddToCart {
                product_id,
                name,
                quantity,
                value,
            } => info!(
                target: "analytics",
                event = "add_to_cart",
                product_id = %product_id,
                name = %name,
                quantity,
                value = %value,
                "Product added to cart"
            ),
            Self::RemoveFromCart {
                product_id,
                name,
                quantity,
                value,
            } => info!(
                target: "analytics",
                event = "remove_from_cart",
                product_id = %product_id,
                name = %name,
                quantity,
                value = %value,
                "Product removed from cart"
            ),
            Self::Purchase {
                order_id,
                value,
                items,
            } => info!(
                target: "analytics",
                event = "purchase",
                order_id = %order_id,
                value = %value,
                items,
                "Purchase completed"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::item::Product;
    use crate::store::apply;

    fn cart() -> CartState {
        apply(
            &CartState::new(),
            CartCommand::AddItem {
                product: Product::new("1", "Monstera", Decimal::new(2499, 2)),
                quantity: 2,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_add_event_value() {
        let command = CartCommand::AddItem {
            product: Product::new("2", "Fern", Decimal::new(1299, 2)),
            quantity: 3,
        };
        let event = CartEvent::for_command(&CartState::new(), &command).unwrap();
        assert!(matches!(
            event,
            CartEvent::AddToCart { value, quantity: 3, .. } if value == Decimal::new(3897, 2)
        ));
    }

    #[test]
    fn test_remove_event_only_for_present_lines() {
        let state = cart();
        let present = CartCommand::RemoveItem {
            id: ProductId::from("1"),
        };
        let absent = CartCommand::RemoveItem {
            id: ProductId::from("9"),
        };
        assert!(matches!(
            CartEvent::for_command(&state, &present),
            Some(CartEvent::RemoveFromCart { quantity: 2, .. })
        ));
        assert!(CartEvent::for_command(&state, &absent).is_none());
    }

    #[test]
    fn test_update_to_zero_is_removal() {
        let command = CartCommand::UpdateQuantity {
            id: ProductId::from("1"),
            quantity: 0,
        };
        assert!(matches!(
            CartEvent::for_command(&cart(), &command),
            Some(CartEvent::RemoveFromCart { .. })
        ));

        let bump = CartCommand::UpdateQuantity {
            id: ProductId::from("1"),
            quantity: 4,
        };
        assert!(CartEvent::for_command(&cart(), &bump).is_none());
    }

    #[test]
    fn test_add_event_skipped_for_out_of_range_quantity() {
        let big = Product::new("1", "Big", Decimal::new(10_000_000_000, 0));
        for quantity in [i64::MIN, -1, 0, i64::from(u32::MAX) + 1] {
            let command = CartCommand::AddItem {
                product: big.clone(),
                quantity,
            };
            assert!(CartEvent::for_command(&CartState::new(), &command).is_none());
        }

        let huge = CartCommand::AddItem {
            product: Product::new("2", "Huge", Decimal::MAX),
            quantity: 2,
        };
        assert!(CartEvent::for_command(&CartState::new(), &huge).is_none());
    }
}
