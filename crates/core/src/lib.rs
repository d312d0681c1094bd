//! Paradise Nursery Core - Shared domain types.
//!
//! This crate provides the value types used by the cart and order core and
//! by the command-line driver:
//! - `cart` - Cart state store, persistence, pricing and checkout
//! - `cli` - Command-line tools for driving a persisted cart
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no storage
//! access, no async runtime. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails, countries,
//!   addresses, payment methods and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
