//! Checkout orchestrator.
//!
//! Turns the current cart plus the customer's form input into a placed
//! [`Order`]:
//!
//! 1. An empty cart is refused before anything else happens.
//! 2. The form is validated; every failing field is reported at once.
//! 3. The cart is snapshotted, priced by the [`PricingPolicy`] and submitted
//!    once to the [`OrderSubmitter`].
//! 4. On success the cart is cleared. On failure it is left intact so the
//!    customer can retry by calling [`CheckoutOrchestrator::checkout`] again.

mod order;
mod validation;

pub use order::{
    CustomerContact, CustomerIdentity, LocalOrderSubmitter, Order, OrderRequest, OrderSubmitter,
};
pub use validation::{CheckoutForm, PaymentInput, ShippingAddressInput};

use paradise_nursery_core::OrderStatus;
use tracing::{info, instrument, warn};

use crate::analytics::CartEvent;
use crate::error::{CheckoutError, EmptyCartError};
use crate::pricing::PricingPolicy;
use crate::store::CartStore;

/// Where the last checkout attempt got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl CheckoutPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs checkout attempts against a cart.
#[derive(Debug)]
pub struct CheckoutOrchestrator<O> {
    submitter: O,
    policy: PricingPolicy,
    phase: CheckoutPhase,
}

impl<O: OrderSubmitter> CheckoutOrchestrator<O> {
    /// Orchestrator using the default pricing policy.
    #[must_use]
    pub fn new(submitter: O) -> Self {
        Self::with_policy(submitter, PricingPolicy::default())
    }

    /// Orchestrator using `policy` for shipping and tax.
    #[must_use]
    pub const fn with_policy(submitter: O, policy: PricingPolicy) -> Self {
        Self {
            submitter,
            policy,
            phase: CheckoutPhase::Idle,
        }
    }

    /// Phase reached by the most recent attempt.
    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    #[must_use]
    pub const fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn submitter(&self) -> &O {
        &self.submitter
    }

    /// Place an order for everything in `store`.
    ///
    /// `identity` is the signed-in customer, if any. Their email is used as
    /// the contact email, and their name (when not blank) replaces the name
    /// on the shipping address.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] if the cart has no items; the phase
    ///   stays [`CheckoutPhase::Idle`]
    /// - [`CheckoutError::Validation`] listing every invalid form field
    /// - [`CheckoutError::Submission`] if the order service failed; the cart
    ///   is kept
    #[instrument(skip_all, fields(items = store.state().items().len()))]
    pub async fn checkout(
        &mut self,
        store: &mut CartStore,
        form: &CheckoutForm,
        identity: Option<&CustomerIdentity>,
    ) -> Result<Order, CheckoutError> {
        self.phase = CheckoutPhase::Idle;
        if store.state().is_empty() {
            info!("Checkout refused: cart is empty");
            return Err(EmptyCartError.into());
        }

        self.phase = CheckoutPhase::Validating;
        let valid = match validation::validate(form, identity.map(|identity| &identity.email)) {
            Ok(valid) => valid,
            Err(e) => {
                self.phase = CheckoutPhase::Failed;
                info!(error = %e, "Checkout input rejected");
                return Err(e.into());
            }
        };

        self.phase = CheckoutPhase::Submitting;
        let items = store.state().items().to_vec();
        let prices = self
            .policy
            .total(&items, &valid.shipping_address.country)
            .rounded();
        let name = identity
            .map(|identity| identity.name.trim())
            .filter(|name| !name.is_empty())
            .map_or_else(|| valid.shipping_address.full_name(), str::to_owned);
        let request = OrderRequest {
            items,
            subtotal: prices.subtotal,
            shipping: prices.shipping,
            tax: prices.tax,
            total: prices.total,
            shipping_address: valid.shipping_address,
            payment_method: valid.payment_method,
            customer: CustomerContact {
                email: valid.email,
                name,
            },
            status: OrderStatus::Pending,
        };

        info!(
            items = request.items.len(),
            total = %request.total,
            payment_method = %request.payment_method.kind,
            "Processing checkout"
        );

        match self.submitter.create(request).await {
            Ok(order) => {
                self.phase = CheckoutPhase::Succeeded;
                store.clear();
                CartEvent::Purchase {
                    order_id: order.id.clone(),
                    value: order.total,
                    items: order.items.len(),
                }
                .record();
                info!(order_id = %order.id, total = %order.total, "Checkout completed");
                Ok(order)
            }
            Err(e) => {
                self.phase = CheckoutPhase::Failed;
                warn!(error = %e, "Order submission failed; cart kept for retry");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use paradise_nursery_core::{Email, OrderId, PaymentMethodKind};
    use rust_decimal::Decimal;

    use super::*;
    use crate::error::SubmissionError;
    use crate::item::Product;

    /// Submitter that records requests and fails while `fail` is set.
    #[derive(Debug, Default)]
    struct RecordingSubmitter {
        calls: AtomicUsize,
        fail: Mutex<bool>,
        last: Mutex<Option<OrderRequest>>,
    }

    impl RecordingSubmitter {
        fn failing() -> Self {
            Self {
                fail: Mutex::new(true),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OrderSubmitter for RecordingSubmitter {
        async fn create(&self, request: OrderRequest) -> Result<Order, SubmissionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            if *self.fail.lock().unwrap() {
                return Err(SubmissionError::Unavailable("orders API timed out".to_string()));
            }
            Ok(Order::from_request(OrderId::new("order_test"), request, Utc::now()))
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn cart() -> CartStore {
        let mut store = CartStore::new();
        store
            .add_item(Product::new("1", "Monstera", dec("24.99")), 2)
            .unwrap();
        store
            .add_item(Product::new("2", "Fern", dec("12.99")), 1)
            .unwrap();
        store
    }

    fn form() -> CheckoutForm {
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
            payment_method: PaymentInput::new("card"),
        }
    }

    #[tokio::test]
    async fn test_empty_cart_never_submits() {
        let mut checkout = CheckoutOrchestrator::new(RecordingSubmitter::default());
        let mut store = CartStore::new();

        let err = checkout.checkout(&mut store, &form(), None).await.unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart(EmptyCartError));
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);
        assert_eq!(checkout.submitter().calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_form_leaves_cart_untouched() {
        let mut checkout = CheckoutOrchestrator::new(RecordingSubmitter::default());
        let mut store = cart();
        let before = store.state().clone();

        let mut form = form();
        form.shipping_address.city = String::new();
        let err = checkout.checkout(&mut store, &form, None).await.unwrap_err();

        let CheckoutError::Validation(err) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(err.has_field("shippingAddress.city"));
        assert_eq!(checkout.phase(), CheckoutPhase::Failed);
        assert_eq!(checkout.submitter().calls(), 0);
        assert_eq!(store.state(), &before);
    }

    #[tokio::test]
    async fn test_success_prices_order_and_clears_cart() {
        let mut checkout = CheckoutOrchestrator::new(RecordingSubmitter::default());
        let mut store = cart();

        let order = checkout.checkout(&mut store, &form(), None).await.unwrap();

        assert_eq!(checkout.phase(), CheckoutPhase::Succeeded);
        assert!(store.state().is_empty());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.subtotal, dec("62.97"));
        assert_eq!(order.shipping, Decimal::ZERO);
        assert_eq!(order.tax, dec("5.04"));
        assert_eq!(order.total, dec("68.01"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.customer.name, "Rosa Canina");
        assert_eq!(order.customer.email.as_str(), "fern@example.com");
        assert_eq!(order.payment_method.kind, PaymentMethodKind::Card);
    }

    #[tokio::test]
    async fn test_submission_failure_keeps_cart_and_allows_retry() {
        let mut checkout = CheckoutOrchestrator::new(RecordingSubmitter::failing());
        let mut store = cart();
        let before = store.state().clone();

        let err = checkout.checkout(&mut store, &form(), None).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Submission(_)));
        assert_eq!(checkout.phase(), CheckoutPhase::Failed);
        assert_eq!(store.state(), &before);
        assert_eq!(checkout.submitter().calls(), 1);

        *checkout.submitter().fail.lock().unwrap() = false;
        let order = checkout.checkout(&mut store, &form(), None).await.unwrap();
        assert_eq!(checkout.phase(), CheckoutPhase::Succeeded);
        assert_eq!(checkout.submitter().calls(), 2);
        assert_eq!(order.items, before.items());
        assert!(store.state().is_empty());
    }

    #[tokio::test]
    async fn test_identity_prefills_contact() {
        let mut checkout = CheckoutOrchestrator::new(RecordingSubmitter::default());
        let mut store = cart();
        let identity = CustomerIdentity {
            email: Email::parse("member@example.com").unwrap(),
            name: "Member Name".to_string(),
        };

        let mut form = form();
        form.email = String::new();
        let order = checkout
            .checkout(&mut store, &form, Some(&identity))
            .await
            .unwrap();
        assert_eq!(order.customer.email, identity.email);
        assert_eq!(order.customer.name, "Member Name");
    }

    #[tokio::test]
    async fn test_blank_identity_name_falls_back_to_address() {
        let mut checkout = CheckoutOrchestrator::new(RecordingSubmitter::default());
        let mut store = cart();
        let identity = CustomerIdentity {
            email: Email::parse("member@example.com").unwrap(),
            name: "  ".to_string(),
        };

        let order = checkout
            .checkout(&mut store, &form(), Some(&identity))
            .await
            .unwrap();
        assert_eq!(order.customer.name, "Rosa Canina");
    }

    #[tokio::test]
    async fn test_international_order_pays_shipping() {
        let mut checkout = CheckoutOrchestrator::new(RecordingSubmitter::default());
        let mut store = CartStore::new();
        store
            .add_item(Product::new("3", "Cactus", dec("10.00")), 1)
            .unwrap();

        let mut form = form();
        form.shipping_address.country = "GB".to_string();
        form.shipping_address.postal_code = "SW1A 1AA".to_string();
        checkout.checkout(&mut store, &form, None).await.unwrap();

        let request = checkout.submitter().last.lock().unwrap().clone().unwrap();
        assert_eq!(request.shipping, dec("14.99"));
        assert_eq!(request.tax, Decimal::ZERO);
        assert_eq!(request.total, dec("24.99"));
    }
}
