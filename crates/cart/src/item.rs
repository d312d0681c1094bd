//! Catalog candidates and cart line items.

use paradise_nursery_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A product as supplied by the catalog when the customer adds it to the cart.
///
/// The cart only checks its shape; it never looks anything up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Product {
    /// Create a product candidate without an image.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
        }
    }

    /// Set the display image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Check the fields the cart depends on.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the id is blank or the price negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new();
        if self.id.is_blank() {
            err.insert("product.id", "Product ID is required");
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            err.insert("product.price", "Price cannot be negative");
        }
        err.into_result()
    }
}

/// One product and quantity held in the cart.
///
/// This is also the persisted shape: the cart is stored as a JSON array of
/// line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Unit price at the time the product was added.
    pub price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    /// Start a line for `product`.
    #[must_use]
    pub fn from_product(product: Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name,
            image: product.image,
            price: product.price,
            quantity,
        }
    }

    /// Unit price times quantity, full precision.
    ///
    /// Saturates at the `Decimal` bounds. Lines in a cart built through
    /// [`crate::apply`] never get there.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Unit price times quantity, or `None` if it does not fit in a `Decimal`.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}
