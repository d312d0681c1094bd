//! Orders and the submission collaborator.

use std::future::Future;

use chrono::{DateTime, Utc};
use paradise_nursery_core::{Email, OrderId, OrderStatus, PaymentMethod, ShippingAddress};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::SubmissionError;
use crate::item::LineItem;

/// The signed-in customer, when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub email: Email,
    /// Display name. Blank names fall back to the shipping address name.
    #[serde(default)]
    pub name: String,
}

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub email: Email,
    pub name: String,
}

/// Everything the order service needs to create an order.
///
/// Money fields are dollar amounts rounded to cents, computed by the pricing
/// engine from the cart snapshot taken when submission began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub customer: CustomerContact,
    pub status: OrderStatus,
}

/// A placed order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub customer: CustomerContact,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Materialize `request` as an order with the given id and timestamp.
    #[must_use]
    pub fn from_request(id: OrderId, request: OrderRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            items: request.items,
            subtotal: request.subtotal,
            shipping: request.shipping,
            tax: request.tax,
            total: request.total,
            shipping_address: request.shipping_address,
            payment_method: request.payment_method,
            customer: request.customer,
            status: request.status,
            created_at,
        }
    }

    /// Total number of units ordered.
    #[must_use]
    pub fn items_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// Creates orders. Stands in for the orders API.
pub trait OrderSubmitter: Send + Sync {
    /// Create an order from `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmissionError`] if the order service rejects the request
    /// or cannot be reached.
    fn create(
        &self,
        request: OrderRequest,
    ) -> impl Future<Output = Result<Order, SubmissionError>> + Send;
}

/// Accepts every order, assigning a random id and the current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOrderSubmitter;

impl LocalOrderSubmitter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OrderSubmitter for LocalOrderSubmitter {
    async fn create(&self, request: OrderRequest) -> Result<Order, SubmissionError> {
        let id = OrderId::new(format!("order_{}", Uuid::new_v4().simple()));
        info!(order_id = %id, total = %request.total, "Order created");
        Ok(Order::from_request(id, request, Utc::now()))
    }
}
