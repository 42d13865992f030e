//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use paperback_core::{Email, IdentityId, UserId};

/// A storefront user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address, lowercased.
    pub email: Email,
    /// Uploaded or linked avatar image, if any.
    pub avatar_url: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A link between a user and an external OAuth account.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub user_id: UserId,
    /// Provider name, e.g. `facebook`.
    pub provider: String,
    /// Account ID at the provider.
    pub uid: String,
    pub created_at: DateTime<Utc>,
}
