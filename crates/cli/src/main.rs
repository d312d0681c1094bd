//! Paradise Nursery CLI - Drive a persisted cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Build a cart
//! pn-cli cart add 1 --name "Monstera Deliciosa" --price 24.99 -q 2
//! pn-cli cart add 2 --name "Boston Fern" --price 12.99
//! pn-cli cart show
//!
//! # Price it
//! pn-cli quote --country US
//! pn-cli shipping-options --country US
//!
//! # Place the order
//! pn-cli checkout --email fern@example.com --first-name Rosa --last-name Canina \
//!     --address "12 Greenhouse Way" --city Portland --state OR --postal-code 97201 \
//!     --country US --payment paypal
//! ```
//!
//! # Commands
//!
//! - `cart` - Add, remove, update, clear and show line items
//! - `quote` - Subtotal, shipping, tax and total for a destination
//! - `shipping-options` - Delivery choices for a destination
//! - `checkout` - Validate, place the order and empty the cart
//!
//! The cart lives in `NURSERY_DATA_DIR` (see [`config`]). Input errors are
//! printed and exit with status 1. Anything else is also logged at error level,
//! which reports it to Sentry when `SENTRY_DSN` is set. Storage failures while
//! saving the cart are logged as warnings and reported the same way.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use paradise_nursery_cart::Product;
use paradise_nursery_core::CountryCode;
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::checkout::CheckoutArgs;
use commands::{CommandError, Session};
use config::{CliConfig, LogFormat};

#[derive(Parser)]
#[command(name = "pn-cli")]
#[command(author, version, about = "Paradise Nursery cart and checkout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Price the cart for a destination
    Quote {
        /// Two-letter destination country code
        #[arg(short, long)]
        country: CountryCode,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List delivery choices for a destination
    ShippingOptions {
        /// Two-letter destination country code
        #[arg(short, long)]
        country: CountryCode,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Place an order for everything in the cart
    Checkout(CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        /// Product ID
        id: String,

        /// Product name
        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: Decimal,

        /// Units to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: String,
    },
    /// Set a product's quantity (zero or less removes it)
    Update {
        /// Product ID
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Show the cart
    Show {
        /// Print the stored JSON
        #[arg(long)]
        json: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn()?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber. Logs go to stderr; stdout is for command output.
fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "paradise_nursery_cli=info,paradise_nursery_cart=info,analytics=info".into()
    });

    let pretty = (format == LogFormat::Pretty)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json = (format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty)
        .with(json)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing(config.log_format);
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &CliConfig) -> Result<(), CommandError> {
    let policy = &config.pricing;
    let mut session = Session::open(config);
    let store = &mut session.store;

    let result = match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add {
                id,
                name,
                price,
                quantity,
                image,
            } => {
                let mut product = Product::new(id, name, price);
                product.image = image;
                commands::cart::add(store, policy, product, quantity)
            }
            CartAction::Remove { id } => commands::cart::remove(store, policy, &id),
            CartAction::Update { id, quantity } => {
                commands::cart::update(store, policy, &id, quantity)
            }
            CartAction::Clear => {
                commands::cart::clear(store, policy);
                Ok(())
            }
            CartAction::Show { json } => commands::cart::show(store.state(), policy, json),
        },
        Commands::Quote { country, json } => {
            commands::checkout::quote(store.state(), policy, &country, json)
        }
        Commands::ShippingOptions { country, json } => {
            commands::checkout::shipping_options(store.state(), policy, &country, json)
        }
        Commands::Checkout(args) => commands::checkout::checkout(store, policy, args).await,
    };

    session.close().await;
    result
}

/// Supervisory error reporting.
///
/// Input errors are only shown to the user. Everything else is logged at error
/// level, which the Sentry layer turns into an event.
#[allow(clippy::print_stderr)]
fn report(err: &CommandError) {
    if err.is_user_error() {
        tracing::info!(code = err.code(), error = %err, "Command rejected");
    } else {
        tracing::error!(code = err.code(), error = %err, "Command failed");
    }
    eprintln!("Error: {err}");
}

#[allow(clippy::print_stderr)]
fn report_config_error(err: &config::ConfigError) {
    eprintln!("Configuration error: {err}");
}
