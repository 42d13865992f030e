//! Rating repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use paperback_core::{BookId, Email, RatingId, RatingScore, UserId};

use super::RepositoryError;
use crate::models::Rating;

const RATING_SELECT: &str = r"
    SELECT r.id, r.user_id, r.book_id, r.score, r.review, u.email AS user_email, r.updated_at
    FROM storefront.rating r
    JOIN storefront.user u ON u.id = r.user_id
";

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: RatingId,
    user_id: UserId,
    book_id: BookId,
    score: i16,
    review: Option<String>,
    user_email: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let score = RatingScore::new(row.score).map_err(|e| {
            RepositoryError::DataCorruption(format!("rating {}: {e}", row.id))
        })?;
        let user_email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            score,
            review: row.review,
            user_email,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for book ratings.
pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Rate a book, replacing the user's previous rating of it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        book_id: BookId,
        score: RatingScore,
        review: Option<&str>,
    ) -> Result<RatingId, RepositoryError> {
        let id = sqlx::query_scalar::<_, RatingId>(
            r"
            INSERT INTO storefront.rating (user_id, book_id, score, review)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, book_id)
            DO UPDATE SET score = EXCLUDED.score, review = EXCLUDED.review, updated_at = now()
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(score.value())
        .bind(review)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// List a book's ratings, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_book(&self, book_id: BookId) -> Result<Vec<Rating>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingRow>(&format!(
            "{RATING_SELECT} WHERE r.book_id = $1 ORDER BY r.updated_at DESC"
        ))
        .bind(book_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Rating::try_from).collect()
    }

    /// Average score of a book, rounded to one decimal place.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn average_for_book(&self, book_id: BookId) -> Result<Option<Decimal>, RepositoryError> {
        let avg = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT round(avg(score), 1) FROM storefront.rating WHERE book_id = $1",
        )
        .bind(book_id)
        .fetch_one(self.pool)
        .await?;

        Ok(avg)
    }
}
