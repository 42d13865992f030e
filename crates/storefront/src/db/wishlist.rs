//! Wishlist repository.
//!
//! A wishlist is the set of `(user_id, book_id)` rows for one user. Adding a
//! book that is already there is reported as a conflict, not silently ignored.

use sqlx::PgPool;

use paperback_core::{BookId, UserId};

use super::RepositoryError;
use super::books::BookRepository;
use crate::models::Book;

/// Repository for wishlist entries.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a book to a user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the book is already on the wishlist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(&self, user_id: UserId, book_id: BookId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.wishlist (user_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, book_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(book_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "book {book_id} is already in the wishlist"
            )));
        }

        Ok(())
    }

    /// Remove a book from a user's wishlist.
    ///
    /// Returns `true` if the book was on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, book_id: BookId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.wishlist WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a book is on a user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(&self, user_id: UserId, book_id: BookId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM storefront.wishlist WHERE user_id = $1 AND book_id = $2)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// List the books on a user's wishlist, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Book>, RepositoryError> {
        let book_ids = sqlx::query_scalar::<_, BookId>(
            "SELECT book_id FROM storefront.wishlist WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let books = BookRepository::new(self.pool);
        let mut result = Vec::with_capacity(book_ids.len());
        for id in book_ids {
            if let Some(book) = books.get_by_id(id).await? {
                result.push(book);
            }
        }

        Ok(result)
    }
}
