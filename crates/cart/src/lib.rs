//! Paradise Nursery cart and order core.
//!
//! - [`store`] - the cart as a deterministic state machine, plus the
//!   [`CartStore`] that owns the live cart and notifies subscribers
//! - [`persistence`] - mirrors the cart to a key-value store and restores it
//!   at startup
//! - [`pricing`] - subtotal, shipping, tax and total
//! - [`checkout`] - validation, order submission and cart clearing
//! - [`analytics`] - commerce events emitted through `tracing`
//! - [`error`] - the error taxonomy shared by all of the above
//!
//! # Example
//!
//! ```rust
//! use paradise_nursery_cart::{CartStore, PricingPolicy, Product};
//! use paradise_nursery_core::CountryCode;
//! use rust_decimal::Decimal;
//!
//! let mut cart = CartStore::new();
//! cart.add_item(Product::new("1", "Monstera", Decimal::new(2499, 2)), 2)?;
//!
//! let prices = PricingPolicy::default().total(cart.state().items(), &CountryCode::us());
//! assert_eq!(prices.rounded().total, Decimal::new(5997, 2));
//! # Ok::<(), paradise_nursery_cart::ValidationError>(())
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod checkout;
pub mod error;
pub mod item;
pub mod persistence;
pub mod pricing;
pub mod store;

pub use checkout::{
    CheckoutForm, CheckoutOrchestrator, CheckoutPhase, CustomerContact, CustomerIdentity,
    LocalOrderSubmitter, Order, OrderRequest, OrderSubmitter, PaymentInput, ShippingAddressInput,
};
pub use error::{
    CheckoutError, EmptyCartError, Error, PersistenceError, StorageError, SubmissionError,
    ValidationError,
};
pub use item::{LineItem, Product};
pub use persistence::{
    CART_STORAGE_KEY, CartPersistence, FileStore, KeyValueStore, MemoryStore, PersistenceHandle,
};
pub use pricing::{PriceBreakdown, PricingPolicy, ShippingOption};
pub use store::{CartCommand, CartState, CartStore, apply};
