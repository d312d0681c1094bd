//! Integration tests for Paradise Nursery.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p paradise-nursery-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Cart state machine properties through the public API
//! - `cart_persistence` - Hydration and write-back against real storage
//! - `checkout_flow` - Cart to order, including failures and retries
//!
//! This crate holds the fixtures those tests share.

use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use paradise_nursery_cart::{
    CheckoutForm, Order, OrderRequest, OrderSubmitter, PaymentInput, Product,
    ShippingAddressInput, SubmissionError,
};
use paradise_nursery_core::OrderId;
use rust_decimal::Decimal;

/// Parse a decimal literal.
///
/// # Panics
///
/// Panics if `s` is not a decimal number.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A small plant catalog.
#[must_use]
pub fn catalog() -> Vec<Product> {
    vec![
        Product::new("1", "Monstera Deliciosa", dec("24.99")).with_image("/img/monstera.jpg"),
        Product::new("2", "Boston Fern", dec("12.99")),
        Product::new("3", "Snake Plant", dec("19.50")),
        Product::new("4", "Golden Pothos", dec("9.99")),
    ]
}

/// Catalog product with `id`.
///
/// # Panics
///
/// Panics if the catalog has no such product.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn product(id: &str) -> Product {
    catalog()
        .into_iter()
        .find(|product| product.id.as_str() == id)
        .unwrap()
}

/// A guest checkout form that passes validation, shipping to Portland, US.
#[must_use]
pub fn guest_form() -> CheckoutForm {
    CheckoutForm {
        email: "fern@example.com".to_string(),
        shipping_address: ShippingAddressInput {
            first_name: "Rosa".to_string(),
            last_name: "Canina".to_string(),
            address: "12 Greenhouse Way".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
        },
        payment_method: PaymentInput::new("card").with_card("4242 4242 4242 4242", None),
    }
}

/// Order submitter that fails its first `failures` calls, then accepts.
#[derive(Debug, Default)]
pub struct FlakySubmitter {
    failures: usize,
    calls: AtomicUsize,
    requests: Mutex<Vec<OrderRequest>>,
}

impl FlakySubmitter {
    /// Fail the first `failures` submissions.
    #[must_use]
    pub fn failing(failures: usize) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    /// Number of submissions seen.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    ///
    /// # Panics
    ///
    /// Panics if the request log lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn requests(&self) -> Vec<OrderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl OrderSubmitter for FlakySubmitter {
    async fn create(&self, request: OrderRequest) -> Result<Order, SubmissionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if call < self.failures {
            return Err(SubmissionError::Unavailable(format!(
                "orders API unavailable (attempt {})",
                call + 1
            )));
        }
        Ok(Order::from_request(
            OrderId::new(format!("order_{}", call + 1)),
            request,
            Utc::now(),
        ))
    }
}
