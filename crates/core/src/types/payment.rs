//! Payment method descriptors.
//!
//! The core never processes payments. An order only records which kind of
//! payment the customer picked plus non-sensitive display details.

use serde::{Deserialize, Serialize};

/// Payment method identifier was not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized payment method: {0:?}")]
pub struct UnknownPaymentMethod(pub String);

/// Recognized payment method identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Card,
    Paypal,
}

impl PaymentMethodKind {
    /// All identifiers accepted at checkout.
    pub const ALL: [Self; 2] = [Self::Card, Self::Paypal];

    /// Wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Paypal => "paypal",
        }
    }
}

impl std::fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethodKind {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "card" => Ok(Self::Card),
            "paypal" => Ok(Self::Paypal),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// Payment method as recorded on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub kind: PaymentMethodKind,
    /// Last four digits of the card, when paying by card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
    /// Cardholder name, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_on_card: Option<String>,
}

impl PaymentMethod {
    /// Descriptor with no card details.
    #[must_use]
    pub const fn new(kind: PaymentMethodKind) -> Self {
        Self {
            kind,
            card_last4: None,
            name_on_card: None,
        }
    }
}
