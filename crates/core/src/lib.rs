//! Paperback Core - Shared domain types and rules.
//!
//! This crate provides the types used across all Paperback components:
//! - `storefront` - Public bookstore site (catalog, cart, orders, accounts)
//! - `cli` - Command-line tools for migrations, seeding, and order handling
//!
//! # Architecture
//!
//! The core crate contains only types and pure business rules - no I/O, no
//! database access, no HTTP clients. Cart arithmetic and the order lifecycle
//! live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, order
//!   states, and rating scores
//! - [`cart`] - Line item arithmetic and order validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{
    LineItem, OrderViolation, calc_total_price, validate_order, validate_quantity,
    validate_transition,
};
pub use types::*;
