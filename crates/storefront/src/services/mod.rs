//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password sign-up/sign-in, account updates, OAuth user resolution
//! - `oauth` - OAuth 2.0 authorization-code client
//! - `avatar` - Avatar selection and Gravatar URLs

pub mod auth;
pub mod avatar;
pub mod oauth;
