//! Checkout form input and its validation rules.

use std::sync::LazyLock;

use paradise_nursery_core::{
    CountryCode, Email, PaymentMethod, PaymentMethodKind, ShippingAddress,
};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::error::ValidationError;

static US_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("Invalid regex"));

static CA_POSTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]\d[A-Za-z] ?\d[A-Za-z]\d$").expect("Invalid regex"));

/// Raw checkout input, exactly as the customer entered it.
#[derive(Debug, Default)]
pub struct CheckoutForm {
    /// Contact email. Ignored when the customer is signed in.
    pub email: String,
    pub shipping_address: ShippingAddressInput,
    pub payment_method: PaymentInput,
}

/// Unvalidated shipping address fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingAddressInput {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Unvalidated payment selection.
///
/// The card number is held as a secret and never leaves validation: only its
/// last four digits are copied into the order.
#[derive(Debug, Default)]
pub struct PaymentInput {
    /// Method identifier, e.g. `card` or `paypal`.
    pub kind: String,
    pub card_number: Option<SecretString>,
    pub name_on_card: Option<String>,
}

impl PaymentInput {
    /// A payment selection with no card details.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Attach a card number.
    #[must_use]
    pub fn with_card(mut self, number: impl Into<String>, name_on_card: Option<String>) -> Self {
        self.card_number = Some(SecretString::from(number.into()));
        self.name_on_card = name_on_card;
        self
    }
}

/// Input that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidCheckout {
    pub email: Email,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Check every field of `form`, collecting one message per failing field.
///
/// A signed-in customer's account email replaces the form's email field,
/// which is then not checked at all.
pub(crate) fn validate(
    form: &CheckoutForm,
    account_email: Option<&Email>,
) -> Result<ValidCheckout, ValidationError> {
    let mut err = ValidationError::new();

    let email = match account_email {
        Some(email) => Some(email.clone()),
        None => match Email::parse(&form.email) {
            Ok(email) => Some(email),
            Err(_) if form.email.trim().is_empty() => {
                err.insert("email", "Email is required");
                None
            }
            Err(_) => {
                err.insert("email", "Please enter a valid email address");
                None
            }
        },
    };

    let shipping_address = validate_address(&form.shipping_address, &mut err);
    let payment_method = validate_payment(&form.payment_method, &mut err);

    match (email, shipping_address, payment_method) {
        (Some(email), Some(shipping_address), Some(payment_method)) if err.is_empty() => {
            Ok(ValidCheckout {
                email,
                shipping_address,
                payment_method,
            })
        }
        _ => Err(err),
    }
}

fn required(err: &mut ValidationError, field: &str, label: &str, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        err.insert(format!("shippingAddress.{field}"), format!("{label} is required"));
        None
    } else {
        Some(value.to_owned())
    }
}

fn validate_address(
    input: &ShippingAddressInput,
    err: &mut ValidationError,
) -> Option<ShippingAddress> {
    let first_name = required(err, "firstName", "First name", &input.first_name);
    let last_name = required(err, "lastName", "Last name", &input.last_name);
    let address = required(err, "address", "Address", &input.address);
    let city = required(err, "city", "City", &input.city);
    let state = required(err, "state", "State", &input.state);
    let postal_code = required(err, "postalCode", "Postal code", &input.postal_code);

    let country = match required(err, "country", "Country", &input.country) {
        Some(raw) => match CountryCode::parse(&raw) {
            Ok(country) => Some(country),
            Err(_) => {
                err.insert(
                    "shippingAddress.country",
                    "Please enter a two-letter country code",
                );
                None
            }
        },
        None => None,
    };

    if let (Some(postal_code), Some(country)) = (&postal_code, &country) {
        if let Some(message) = postal_code_error(postal_code, country) {
            err.insert("shippingAddress.postalCode", message);
        }
    }

    Some(ShippingAddress {
        first_name: first_name?,
        last_name: last_name?,
        address: address?,
        city: city?,
        state: state?,
        postal_code: postal_code?,
        country: country?,
    })
}

/// Country-specific postal code rule. Countries without one accept any
/// non-blank value.
fn postal_code_error(postal_code: &str, country: &CountryCode) -> Option<&'static str> {
    match country.as_str() {
        "US" if !US_ZIP_RE.is_match(postal_code) => Some("Please enter a valid ZIP code"),
        "CA" if !CA_POSTAL_RE.is_match(postal_code) => Some("Please enter a valid postal code"),
        _ => None,
    }
}

fn validate_payment(input: &PaymentInput, err: &mut ValidationError) -> Option<PaymentMethod> {
    if input.kind.trim().is_empty() {
        err.insert("paymentMethod.type", "Payment method is required");
        return None;
    }
    let Ok(kind) = input.kind.parse::<PaymentMethodKind>() else {
        err.insert("paymentMethod.type", "Invalid payment method");
        return None;
    };

    let mut method = PaymentMethod::new(kind);
    if kind == PaymentMethodKind::Card {
        if let Some(number) = &input.card_number {
            match card_last4(number) {
                Some(last4) => method.card_last4 = Some(last4),
                None => {
                    err.insert("paymentMethod.cardNumber", "Please enter a valid card number");
                    return None;
                }
            }
        }
        method.name_on_card = input
            .name_on_card
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
    }
    Some(method)
}

/// Last four digits of a 12-19 digit card number. Spaces and dashes are
/// allowed as separators.
fn card_last4(number: &SecretString) -> Option<String> {
    let digits: String = number
        .expose_secret()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.get(digits.len() - 4..).map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            email: "fern@example.com".to_string(),
            shipping_address: ShippingAddressInput {
                first_name: "Rosa".to_string(),
                last_name: "Canina".to_string(),
                address: "12 Greenhouse Way".to_string(),
                city: "Portland".to_string(),
                state: "OR".to_string(),
                postal_code: "97201".to_string(),
                country: "us".to_string(),
            },
            payment_method: PaymentInput::new("card"),
        }
    }

    #[test]
    fn test_valid_form() {
        let valid = validate(&valid_form(), None).unwrap();
        assert_eq!(valid.email.as_str(), "fern@example.com");
        assert_eq!(valid.shipping_address.country, CountryCode::us());
        assert_eq!(valid.payment_method.kind, PaymentMethodKind::Card);
    }

    #[test]
    fn test_missing_city_names_field() {
        let mut form = valid_form();
        form.shipping_address.city = "   ".to_string();
        let err = validate(&form, None).unwrap_err();
        assert_eq!(err.message("shippingAddress.city"), Some("City is required"));
        assert_eq!(err.fields().len(), 1);
    }

    #[test]
    fn test_collects_every_failure() {
        let form = CheckoutForm::default();
        let err = validate(&form, None).unwrap_err();
        for field in [
            "email",
            "shippingAddress.firstName",
            "shippingAddress.lastName",
            "shippingAddress.address",
            "shippingAddress.city",
            "shippingAddress.state",
            "shippingAddress.postalCode",
            "shippingAddress.country",
            "paymentMethod.type",
        ] {
            assert!(err.has_field(field), "missing {field}");
        }
    }

    #[test]
    fn test_email_rules() {
        let mut form = valid_form();
        form.email = "not-an-email".to_string();
        let err = validate(&form, None).unwrap_err();
        assert_eq!(
            err.message("email"),
            Some("Please enter a valid email address")
        );

        // Signed-in customers skip the email field entirely.
        let account = Email::parse("rosa@example.com").unwrap();
        assert_eq!(validate(&form, Some(&account)).unwrap().email, account);
    }

    #[test]
    fn test_us_zip_codes() {
        let mut form = valid_form();
        for ok in ["97201", "97201-1234"] {
            form.shipping_address.postal_code = ok.to_string();
            assert!(validate(&form, None).is_ok(), "{ok}");
        }
        for bad in ["9720", "97201-12", "ABCDE"] {
            form.shipping_address.postal_code = bad.to_string();
            let err = validate(&form, None).unwrap_err();
            assert!(err.has_field("shippingAddress.postalCode"), "{bad}");
        }
    }

    #[test]
    fn test_canadian_postal_codes() {
        let mut form = valid_form();
        form.shipping_address.country = "CA".to_string();
        for ok in ["K1A 0B1", "k1a0b1"] {
            form.shipping_address.postal_code = ok.to_string();
            assert!(validate(&form, None).is_ok(), "{ok}");
        }
        form.shipping_address.postal_code = "97201".to_string();
        assert!(validate(&form, None).is_err());
    }

    #[test]
    fn test_other_countries_accept_any_postal_code() {
        let mut form = valid_form();
        form.shipping_address.country = "GB".to_string();
        form.shipping_address.postal_code = "SW1A 1AA".to_string();
        assert!(validate(&form, None).is_ok());
    }

    #[test]
    fn test_malformed_country() {
        let mut form = valid_form();
        form.shipping_address.country = "USA".to_string();
        let err = validate(&form, None).unwrap_err();
        assert!(err.has_field("shippingAddress.country"));
        // Postal code is not judged against an unknown country.
        assert!(!err.has_field("shippingAddress.postalCode"));
    }

    #[test]
    fn test_payment_kinds() {
        let mut form = valid_form();
        form.payment_method = PaymentInput::new("paypal");
        assert!(validate(&form, None).is_ok());

        form.payment_method = PaymentInput::new("bitcoin");
        let err = validate(&form, None).unwrap_err();
        assert_eq!(err.message("paymentMethod.type"), Some("Invalid payment method"));
    }

    #[test]
    fn test_card_keeps_last_four_only() {
        let mut form = valid_form();
        form.payment_method =
            PaymentInput::new("card").with_card("4242 4242 4242 4242", Some(" Rosa ".to_string()));
        let method = validate(&form, None).unwrap().payment_method;
        assert_eq!(method.card_last4.as_deref(), Some("4242"));
        assert_eq!(method.name_on_card.as_deref(), Some("Rosa"));

        form.payment_method = PaymentInput::new("card").with_card("1234", None);
        let err = validate(&form, None).unwrap_err();
        assert!(err.has_field("paymentMethod.cardNumber"));
    }

    #[test]
    fn test_debug_redacts_card_number() {
        let input = PaymentInput::new("card").with_card("4111111111111111", None);
        assert!(!format!("{input:?}").contains("4111111111111111"));
    }
}
