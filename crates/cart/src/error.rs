//! Error taxonomy for the cart and order core.
//!
//! - [`ValidationError`] - malformed command or checkout input
//! - [`EmptyCartError`] - checkout attempted with no items
//! - [`PersistenceError`] - storage read/write failure, absorbed by the
//!   persistence adapter and only ever logged
//! - [`SubmissionError`] - the order-submission collaborator failed
//!
//! [`Error`] unifies them for callers that supervise the whole core.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Malformed input, with one message per offending field.
///
/// Field names use the dotted camelCase paths of the checkout form, e.g.
/// `shippingAddress.postalCode` or `items[1].quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    fields: BTreeMap<String, String>,
}

impl ValidationError {
    /// An empty error; add fields with [`ValidationError::insert`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An error for a single field.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.insert(field, message);
        err
    }

    /// Record a message for a field. The first message for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Returns `true` if no field has been flagged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Message recorded for `field`, if any.
    #[must_use]
    pub fn message(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Returns `true` if `field` was flagged.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// All field messages, ordered by field name.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// `Ok(())` when nothing was flagged, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` if at least one field was flagged.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        let mut sep = ": ";
        for (field, message) in &self.fields {
            write!(f, "{sep}{field}: {message}")?;
            sep = "; ";
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Checkout was attempted with no items in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cart is empty")]
pub struct EmptyCartError;

/// Failure of the durable key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Write would exceed the store's capacity.
    #[error("storage quota exceeded ({needed} bytes needed, {available} available)")]
    QuotaExceeded {
        /// Bytes the write needed.
        needed: usize,
        /// Bytes left in the store.
        available: usize,
    },

    /// Key cannot be used with this store.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Store cannot be used at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Cart persistence failed. Never escapes the persistence adapter.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Storage read or write failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Stored value could not be (de)serialized.
    #[error("corrupt cart data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored items parsed but violate cart invariants.
    #[error("stored cart rejected: {0}")]
    Rejected(#[from] ValidationError),
}

/// The order-submission collaborator reported a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The order service refused the order.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// The order service could not be reached.
    #[error("order service unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a failed checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// No items to order.
    #[error(transparent)]
    EmptyCart(#[from] EmptyCartError),

    /// Contact, shipping or payment input was invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Submission failed; the cart was left intact for a retry.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Every error the core can report, for supervisory callers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    EmptyCart(#[from] EmptyCartError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl Error {
    /// Stable error code for logs and error tracking.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EmptyCart(_) => "EMPTY_CART",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Submission(_) => "SUBMISSION_ERROR",
        }
    }

    /// Returns `true` for errors caused by user input, which the user can fix
    /// and retry. The rest come from collaborators and are worth reporting.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::EmptyCart(_))
    }
}

impl From<CheckoutError> for Error {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart(e) => Self::EmptyCart(e),
            CheckoutError::Validation(e) => Self::Validation(e),
            CheckoutError::Submission(e) => Self::Submission(e),
        }
    }
}
