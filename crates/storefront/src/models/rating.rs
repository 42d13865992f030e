//! Rating domain types.

use chrono::{DateTime, Utc};

use paperback_core::{BookId, Email, RatingId, RatingScore, UserId};

/// A user's rating of a book.
#[derive(Debug, Clone)]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub score: RatingScore,
    pub review: Option<String>,
    /// Email of the rating user, joined for display.
    pub user_email: Email,
    pub updated_at: DateTime<Utc>,
}
