//! Destination country codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CountryCodeError {
    /// The input string is empty.
    #[error("country code cannot be empty")]
    Empty,
    /// The input is not two ASCII letters.
    #[error("country code must be two letters (got {0:?})")]
    Malformed(String),
}

/// Two-letter destination code used for shipping tiers and tax lookup.
///
/// Stored upper-case. Regional codes such as `EU` are accepted alongside
/// ISO 3166-1 alpha-2 country codes.
///
/// ```
/// use paradise_nursery_core::CountryCode;
///
/// let ca: CountryCode = " ca ".parse().unwrap();
/// assert_eq!(ca.as_str(), "CA");
/// assert!(CountryCode::parse("USA").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a two-letter code, trimming whitespace and upper-casing.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or not exactly two ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CountryCodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CountryCodeError::Empty);
        }
        if s.len() != 2 || !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CountryCodeError::Malformed(s.to_owned()));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// United States.
    #[must_use]
    pub fn us() -> Self {
        Self("US".to_owned())
    }

    /// Canada.
    #[must_use]
    pub fn ca() -> Self {
        Self("CA".to_owned())
    }

    /// European Union, taxed as a single region.
    #[must_use]
    pub fn eu() -> Self {
        Self("EU".to_owned())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}
