//! Core types for Paradise Nursery.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod country;
pub mod email;
pub mod id;
pub mod money;
pub mod payment;
pub mod status;

pub use address::ShippingAddress;
pub use country::{CountryCode, CountryCodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, Money, round_cents};
pub use payment::{PaymentMethod, PaymentMethodKind, UnknownPaymentMethod};
pub use status::*;
