//! Core types for Paperback.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod rating;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError, format_amount};
pub use rating::{RatingError, RatingScore};
pub use status::{OrderState, OrderStateError};
