//! Shipping destination.

use serde::{Deserialize, Serialize};

use super::country::CountryCode;

/// A validated shipping address.
///
/// Every field is non-blank and the postal code has already been checked
/// against the destination's expected format by checkout validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    /// Street address line.
    pub address: String,
    pub city: String,
    /// State, province or region.
    pub state: String,
    pub postal_code: String,
    pub country: CountryCode,
}

impl ShippingAddress {
    /// Recipient name as "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
