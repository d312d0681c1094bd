//! Cart state store.
//!
//! The cart is a deterministic state machine. [`apply`] is the transition
//! function: it takes the current [`CartState`] and a [`CartCommand`] and
//! returns the next state, never mutating its input. [`CartStore`] owns the
//! current state, records the last error, and notifies subscribers after each
//! successful transition (this is how the persistence adapter mirrors the
//! cart to storage).
//!
//! # Invariants
//!
//! - No two line items share an id
//! - Every quantity is at least 1
//! - A line's price is never changed after it is added

use std::collections::HashSet;

use paradise_nursery_core::ProductId;
use rust_decimal::Decimal;
use tracing::debug;

use crate::analytics;
use crate::error::ValidationError;
use crate::item::{LineItem, Product};

/// Snapshot of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartState {
    items: Vec<LineItem>,
    error: Option<ValidationError>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Error from the last rejected command, cleared by the next successful one.
    #[must_use]
    pub const fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    /// Returns `true` if the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price times quantity over all items, full precision.
    #[must_use]
    pub fn total(&self) -> Decimal {
        crate::pricing::subtotal(&self.items)
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn items_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Returns `true` if a line for `id` exists.
    #[must_use]
    pub fn is_in_cart(&self, id: &ProductId) -> bool {
        self.get_item(id).is_some()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get_item(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    fn with_items(items: Vec<LineItem>) -> Self {
        Self { items, error: None }
    }
}

/// A request to change the cart.
///
/// Quantities are signed so that callers can pass through whatever the
/// customer typed; [`apply`] decides what a zero or negative value means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    /// Add `quantity` units of `product`, merging with an existing line.
    AddItem { product: Product, quantity: i64 },
    /// Drop the line for `id`. Absent ids are ignored.
    RemoveItem { id: ProductId },
    /// Set the quantity for `id`; zero or less removes the line.
    UpdateQuantity { id: ProductId, quantity: i64 },
    /// Drop every line.
    ClearCart,
    /// Replace every line, e.g. when hydrating from storage.
    SetCart { items: Vec<LineItem> },
}

impl CartCommand {
    /// Add a single unit of `product`.
    #[must_use]
    pub const fn add(product: Product) -> Self {
        Self::AddItem {
            product,
            quantity: 1,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddItem { .. } => "add_item",
            Self::RemoveItem { .. } => "remove_item",
            Self::UpdateQuantity { .. } => "update_quantity",
            Self::ClearCart => "clear_cart",
            Self::SetCart { .. } => "set_cart",
        }
    }
}

/// Compute the state that follows `command`.
///
/// Re-applying the same command to the same state gives the same result,
/// except for `AddItem`, whose meaning is to accumulate.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the command is malformed: a product
/// without an id or with a negative price, a non-positive quantity to add,
/// a blank id, a `SetCart` sequence that breaks the cart invariants, or a
/// change that would push a line total or the cart total out of `Decimal`
/// range.
pub fn apply(state: &CartState, command: CartCommand) -> Result<CartState, ValidationError> {
    match command {
        CartCommand::AddItem { product, quantity } => add_item(state, product, quantity),
        CartCommand::RemoveItem { id } => {
            require_id(&id)?;
            Ok(remove_item(state, &id))
        }
        CartCommand::UpdateQuantity { id, quantity } => {
            require_id(&id)?;
            if quantity <= 0 {
                return Ok(remove_item(state, &id));
            }
            let quantity = to_quantity(quantity)?;
            let items = state
                .items
                .iter()
                .map(|item| {
                    if item.id == id {
                        LineItem {
                            quantity,
                            ..item.clone()
                        }
                    } else {
                        item.clone()
                    }
                })
                .collect::<Vec<_>>();
            check_totals(&items, "quantity")?;
            Ok(CartState::with_items(items))
        }
        CartCommand::ClearCart => Ok(CartState::new()),
        CartCommand::SetCart { items } => {
            validate_items(&items)?;
            Ok(CartState::with_items(items))
        }
    }
}

fn add_item(
    state: &CartState,
    product: Product,
    quantity: i64,
) -> Result<CartState, ValidationError> {
    let mut err = product.validate().err().unwrap_or_default();
    if quantity <= 0 {
        err.insert("quantity", "Quantity must be positive");
    }
    err.into_result()?;
    let quantity = to_quantity(quantity)?;

    let mut items = state.items.clone();
    match state.position(&product.id) {
        Some(index) => {
            // Existing line keeps its price and metadata.
            if let Some(line) = items.get_mut(index) {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| ValidationError::field("quantity", "Quantity is too large"))?;
            }
        }
        None => items.push(LineItem::from_product(product, quantity)),
    }
    check_totals(&items, "quantity")?;
    Ok(CartState::with_items(items))
}

fn remove_item(state: &CartState, id: &ProductId) -> CartState {
    CartState::with_items(
        state
            .items
            .iter()
            .filter(|item| &item.id != id)
            .cloned()
            .collect(),
    )
}

fn require_id(id: &ProductId) -> Result<(), ValidationError> {
    if id.is_blank() {
        return Err(ValidationError::field("productId", "Product ID is required"));
    }
    Ok(())
}

fn to_quantity(quantity: i64) -> Result<u32, ValidationError> {
    u32::try_from(quantity).map_err(|_| ValidationError::field("quantity", "Quantity is too large"))
}

fn validate_items(items: &[LineItem]) -> Result<(), ValidationError> {
    let mut err = ValidationError::new();
    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        if item.id.is_blank() {
            err.insert(format!("items[{index}].id"), "Product ID is required");
        } else if !seen.insert(&item.id) {
            err.insert(format!("items[{index}].id"), "Duplicate product in cart");
        }
        if item.price.is_sign_negative() && !item.price.is_zero() {
            err.insert(format!("items[{index}].price"), "Price cannot be negative");
        }
        if item.quantity == 0 {
            err.insert(format!("items[{index}].quantity"), "Quantity must be positive");
        } else if item.checked_line_total().is_none() {
            err.insert(format!("items[{index}].quantity"), "Line total is too large");
        }
    }
    err.into_result()?;
    check_totals(items, "items")
}

/// Fails if any line total, or their sum, does not fit in a `Decimal`.
fn check_totals(items: &[LineItem], field: &str) -> Result<(), ValidationError> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.checked_line_total()?))
        .map(drop)
        .ok_or_else(|| ValidationError::field(field, "Cart total is too large"))
}

type Subscriber = Box<dyn Fn(&CartState) + Send>;

/// Single owner of the live cart.
///
/// Every change goes through [`CartStore::dispatch`]. Successful transitions
/// replace the state and notify subscribers in registration order; rejected
/// commands only record the error.
#[derive(Default)]
pub struct CartStore {
    state: CartState,
    subscribers: Vec<Subscriber>,
}

impl CartStore {
    /// A store holding an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cart snapshot.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Register a callback run after every successful transition.
    pub fn subscribe(&mut self, subscriber: impl Fn(&CartState) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Apply `command` to the current state.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] from [`apply`]. The error is also kept
    /// in [`CartState::error`] until the next successful command or
    /// [`CartStore::clear_error`]; items are left untouched.
    pub fn dispatch(&mut self, command: CartCommand) -> Result<&CartState, ValidationError> {
        let name = command.name();
        let event = analytics::CartEvent::for_command(&self.state, &command);
        match apply(&self.state, command) {
            Ok(next) => {
                debug!(command = name, items = next.items.len(), "Cart updated");
                self.state = next;
                if let Some(event) = event {
                    event.record();
                }
                for subscriber in &self.subscribers {
                    subscriber(&self.state);
                }
                Ok(&self.state)
            }
            Err(err) => {
                debug!(command = name, error = %err, "Cart command rejected");
                self.state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// See [`CartStore::dispatch`].
    pub fn add_item(
        &mut self,
        product: Product,
        quantity: i64,
    ) -> Result<&CartState, ValidationError> {
        self.dispatch(CartCommand::AddItem { product, quantity })
    }

    /// Remove the line for `id`.
    ///
    /// # Errors
    ///
    /// See [`CartStore::dispatch`].
    pub fn remove_item(
        &mut self,
        id: impl Into<ProductId>,
    ) -> Result<&CartState, ValidationError> {
        self.dispatch(CartCommand::RemoveItem { id: id.into() })
    }

    /// Set the quantity for `id`.
    ///
    /// # Errors
    ///
    /// See [`CartStore::dispatch`].
    pub fn update_quantity(
        &mut self,
        id: impl Into<ProductId>,
        quantity: i64,
    ) -> Result<&CartState, ValidationError> {
        self.dispatch(CartCommand::UpdateQuantity {
            id: id.into(),
            quantity,
        })
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> &CartState {
        // ClearCart cannot fail.
        let _ = self.dispatch(CartCommand::ClearCart);
        &self.state
    }

    /// Replace every line.
    ///
    /// # Errors
    ///
    /// See [`CartStore::dispatch`].
    pub fn set_cart(&mut self, items: Vec<LineItem>) -> Result<&CartState, ValidationError> {
        self.dispatch(CartCommand::SetCart { items })
    }

    /// Forget the last command error.
    pub fn clear_error(&mut self) {
        self.state.error = None;
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn product(id: &str, cents: i64) -> Product {
        Product::new(id, format!("Plant {id}"), Decimal::new(cents, 2))
    }

    fn add(state: &CartState, id: &str, cents: i64, quantity: i64) -> CartState {
        apply(
            state,
            CartCommand::AddItem {
                product: product(id, cents),
                quantity,
            },
        )
        .unwrap()
    }

    fn id(s: &str) -> ProductId {
        ProductId::from(s)
    }

    // =========================================================================
    // AddItem
    // =========================================================================

    #[test]
    fn test_add_appends_new_line() {
        let state = add(&CartState::new(), "1", 2499, 2);
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.get_item(&id("1")).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_same_id_accumulates() {
        let mut state = CartState::new();
        for quantity in [1, 3, 2] {
            state = add(&state, "5", 1000, quantity);
        }
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.get_item(&id("5")).unwrap().quantity, 6);
    }

    #[test]
    fn test_add_twice_yields_quantity_two() {
        let once = apply(&CartState::new(), CartCommand::add(product("5", 1000))).unwrap();
        let twice = apply(&once, CartCommand::add(product("5", 1000))).unwrap();
        assert_eq!(twice.items().len(), 1);
        assert_eq!(twice.items().first().unwrap().quantity, 2);
    }

    #[test]
    fn test_add_existing_keeps_original_price_and_name() {
        let state = add(&CartState::new(), "1", 2499, 1);
        let repriced = Product::new("1", "Renamed", Decimal::new(1, 0)).with_image("x.png");
        let state = apply(
            &state,
            CartCommand::AddItem {
                product: repriced,
                quantity: 1,
            },
        )
        .unwrap();
        let line = state.get_item(&id("1")).unwrap();
        assert_eq!(line.price, Decimal::new(2499, 2));
        assert_eq!(line.name, "Plant 1");
        assert_eq!(line.image, None);
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let state = add(&CartState::new(), "b", 100, 1);
        let state = add(&add(&state, "a", 100, 1), "b", 100, 1);
        let ids: Vec<_> = state.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let empty = CartState::new();

        let err = apply(
            &empty,
            CartCommand::AddItem {
                product: product("1", 100),
                quantity: 0,
            },
        )
        .unwrap_err();
        assert!(err.has_field("quantity"));

        let err = apply(&empty, CartCommand::add(product("", 100))).unwrap_err();
        assert!(err.has_field("product.id"));

        let err = apply(&empty, CartCommand::add(product("1", -100))).unwrap_err();
        assert!(err.has_field("product.price"));
    }

    #[test]
    fn test_add_quantity_overflow_is_validation_error() {
        let state = add(&CartState::new(), "1", 100, i64::from(u32::MAX));
        let err = apply(&state, CartCommand::add(product("1", 100))).unwrap_err();
        assert!(err.has_field("quantity"));
        let oversized = CartCommand::AddItem {
            product: product("2", 100),
            quantity: i64::MAX,
        };
        assert!(apply(&CartState::new(), oversized).is_err());
    }

    // =========================================================================
    // RemoveItem / UpdateQuantity
    // =========================================================================

    #[test]
    fn test_remove_is_idempotent() {
        let state = add(&add(&CartState::new(), "1", 100, 1), "2", 200, 1);
        let once = apply(&state, CartCommand::RemoveItem { id: id("1") }).unwrap();
        let twice = apply(&once, CartCommand::RemoveItem { id: id("1") }).unwrap();
        assert_eq!(once, twice);
        assert!(!once.is_in_cart(&id("1")));
        assert!(once.is_in_cart(&id("2")));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let state = add(&CartState::new(), "1", 100, 1);
        let next = apply(&state, CartCommand::RemoveItem { id: id("404") }).unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn test_remove_blank_id_rejected() {
        let err = apply(&CartState::new(), CartCommand::RemoveItem { id: id(" ") }).unwrap_err();
        assert!(err.has_field("productId"));
    }

    #[test]
    fn test_update_to_zero_equals_remove() {
        let state = add(&add(&CartState::new(), "1", 100, 3), "2", 200, 1);
        let updated = apply(
            &state,
            CartCommand::UpdateQuantity {
                id: id("1"),
                quantity: 0,
            },
        )
        .unwrap();
        let removed = apply(&state, CartCommand::RemoveItem { id: id("1") }).unwrap();
        assert_eq!(updated, removed);

        let negative = apply(
            &state,
            CartCommand::UpdateQuantity {
                id: id("1"),
                quantity: -4,
            },
        )
        .unwrap();
        assert_eq!(negative, removed);
    }

    #[test]
    fn test_update_replaces_quantity() {
        let state = add(&CartState::new(), "1", 100, 3);
        let command = CartCommand::UpdateQuantity {
            id: id("1"),
            quantity: 7,
        };
        let once = apply(&state, command.clone()).unwrap();
        let twice = apply(&once, command).unwrap();
        assert_eq!(once.get_item(&id("1")).unwrap().quantity, 7);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let state = add(&CartState::new(), "1", 100, 3);
        let next = apply(
            &state,
            CartCommand::UpdateQuantity {
                id: id("2"),
                quantity: 5,
            },
        )
        .unwrap();
        assert_eq!(next, state);
    }

    // =========================================================================
    // ClearCart / SetCart
    // =========================================================================

    #[test]
    fn test_clear() {
        let state = add(&CartState::new(), "1", 100, 3);
        let cleared = apply(&state, CartCommand::ClearCart).unwrap();
        assert!(cleared.is_empty());
        assert_eq!(apply(&cleared, CartCommand::ClearCart).unwrap(), cleared);
    }

    #[test]
    fn test_set_cart_replaces_items() {
        let state = add(&CartState::new(), "old", 100, 1);
        let items = vec![
            LineItem::from_product(product("2", 1299), 1),
            LineItem::from_product(product("1", 2499), 2),
        ];
        let next = apply(
            &state,
            CartCommand::SetCart {
                items: items.clone(),
            },
        )
        .unwrap();
        assert_eq!(next.items(), items.as_slice());
        assert!(!next.is_in_cart(&id("old")));
    }

    #[test]
    fn test_set_cart_rejects_malformed_sequence() {
        let mut duplicate = LineItem::from_product(product("1", 100), 1);
        let items = vec![
            LineItem::from_product(product("1", 100), 1),
            duplicate.clone(),
        ];
        let err = apply(&CartState::new(), CartCommand::SetCart { items }).unwrap_err();
        assert!(err.has_field("items[1].id"));

        duplicate.quantity = 0;
        duplicate.id = id("2");
        let command = CartCommand::SetCart {
            items: vec![duplicate],
        };
        let err = apply(&CartState::new(), command).unwrap_err();
        assert!(err.has_field("items[0].quantity"));
    }

    #[test]
    fn test_set_cart_rejects_totals_out_of_range() {
        let heirloom = Product::new("1", "Heirloom", Decimal::MAX);
        let command = CartCommand::SetCart {
            items: vec![LineItem::from_product(heirloom.clone(), 2)],
        };
        let err = apply(&CartState::new(), command).unwrap_err();
        assert!(err.has_field("items[0].quantity"));

        let command = CartCommand::SetCart {
            items: vec![
                LineItem::from_product(heirloom, 1),
                LineItem::from_product(product("2", 100), 1),
            ],
        };
        let err = apply(&CartState::new(), command).unwrap_err();
        assert!(err.has_field("items"));
    }

    #[test]
    fn test_add_and_update_reject_totals_out_of_range() {
        let heirloom = Product::new("1", "Heirloom", Decimal::MAX);
        let state = apply(&CartState::new(), CartCommand::add(heirloom)).unwrap();

        let err = apply(&state, CartCommand::add(product("2", 100))).unwrap_err();
        assert!(err.has_field("quantity"));

        let command = CartCommand::UpdateQuantity {
            id: id("1"),
            quantity: 2,
        };
        let err = apply(&state, command).unwrap_err();
        assert!(err.has_field("quantity"));
    }

    // =========================================================================
    // Derived queries
    // =========================================================================

    #[test]
    fn test_derived_queries() {
        let state = add(&add(&CartState::new(), "1", 2499, 2), "2", 1299, 1);
        assert_eq!(state.total(), Decimal::new(6297, 2));
        assert_eq!(state.items_count(), 3);
        assert!(state.is_in_cart(&id("2")));
        assert!(state.get_item(&id("3")).is_none());
    }

    // =========================================================================
    // CartStore
    // =========================================================================

    #[test]
    fn test_store_records_and_clears_error() {
        let mut store = CartStore::new();
        store.add_item(product("1", 100), 1).unwrap();

        assert!(store.add_item(product("2", 100), 0).is_err());
        assert!(store.state().error().unwrap().has_field("quantity"));
        assert_eq!(store.state().items().len(), 1);

        store.update_quantity("1", 4).unwrap();
        assert!(store.state().error().is_none());

        assert!(store.remove_item("").is_err());
        store.clear_error();
        assert!(store.state().error().is_none());
    }

    #[test]
    fn test_store_rejects_extreme_quantity_without_panicking() {
        let mut store = CartStore::new();
        let big = Product::new("1", "Big", Decimal::new(10_000_000_000, 0));

        for quantity in [i64::MIN, i64::MAX] {
            let err = store.add_item(big.clone(), quantity).unwrap_err();
            assert!(err.has_field("quantity"));
        }
        assert!(store.state().is_empty());
        assert!(store.state().error().unwrap().has_field("quantity"));
    }

    #[test]
    fn test_store_notifies_only_on_success() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = CartStore::new();
        let sink = Arc::clone(&seen);
        store.subscribe(move |state| sink.lock().unwrap().push(state.items_count()));

        store.add_item(product("1", 100), 2).unwrap();
        store.add_item(product("1", 100), -1).unwrap_err();
        store.update_quantity("1", 5).unwrap();
        store.clear();

        assert_eq!(*seen.lock().unwrap(), vec![2, 5, 0]);
    }
}
