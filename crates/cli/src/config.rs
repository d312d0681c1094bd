//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional.
//! - `NURSERY_DATA_DIR` - Directory holding the persisted cart (default: `.paradise-nursery`)
//! - `NURSERY_FREE_SHIPPING_THRESHOLD` - Subtotal that ships free (default: 50.00)
//! - `NURSERY_DOMESTIC_SHIPPING` - Domestic flat rate (default: 5.99)
//! - `NURSERY_INTERNATIONAL_SHIPPING` - International flat rate (default: 14.99)
//! - `NURSERY_DOMESTIC_COUNTRIES` - Comma-separated country codes (default: `US,CA`)
//! - `NURSERY_LOG_FORMAT` - `pretty` or `json` (default: `pretty`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use paradise_nursery_cart::PricingPolicy;
use paradise_nursery_core::CountryCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = ".paradise-nursery";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `pretty` or `json`, got {other:?}")),
        }
    }
}

/// CLI configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN.
#[derive(Clone)]
pub struct CliConfig {
    /// Directory for the file-backed cart store
    pub data_dir: PathBuf,
    /// Shipping tiers and tax table
    pub pricing: PricingPolicy,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking (contains the project key)
    pub sentry_dsn: Option<SecretString>,
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("data_dir", &self.data_dir)
            .field("pricing", &self.pricing)
            .field("log_format", &self.log_format)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = get("NURSERY_DATA_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            free_shipping_threshold: parse_amount(
                "NURSERY_FREE_SHIPPING_THRESHOLD",
                get("NURSERY_FREE_SHIPPING_THRESHOLD"),
                defaults.free_shipping_threshold,
            )?,
            domestic_rate: parse_amount(
                "NURSERY_DOMESTIC_SHIPPING",
                get("NURSERY_DOMESTIC_SHIPPING"),
                defaults.domestic_rate,
            )?,
            international_rate: parse_amount(
                "NURSERY_INTERNATIONAL_SHIPPING",
                get("NURSERY_INTERNATIONAL_SHIPPING"),
                defaults.international_rate,
            )?,
            domestic_countries: match get("NURSERY_DOMESTIC_COUNTRIES") {
                Some(raw) => parse_countries("NURSERY_DOMESTIC_COUNTRIES", &raw)?,
                None => defaults.domestic_countries,
            },
            tax_rates: defaults.tax_rates,
        };

        let log_format = match get("NURSERY_LOG_FORMAT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar("NURSERY_LOG_FORMAT".to_string(), e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            data_dir,
            pricing,
            log_format,
            sentry_dsn: get("SENTRY_DSN").map(SecretString::from),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// The Sentry DSN, if error tracking is enabled.
    #[must_use]
    pub fn sentry_dsn(&self) -> Option<&str> {
        self.sentry_dsn.as_ref().map(|dsn| dsn.expose_secret())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a non-negative money amount, falling back to `default` when unset.
fn parse_amount(key: &str, raw: Option<String>, default: Decimal) -> Result<Decimal, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let amount = Decimal::from_str(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "amount cannot be negative".to_string(),
        ));
    }
    Ok(amount)
}

/// Parse a comma-separated list of country codes. Empty entries are skipped.
fn parse_countries(key: &str, raw: &str) -> Result<BTreeSet<CountryCode>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            CountryCode::parse(entry)
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .collect()
}
