//! Catalog repository: books, authors, and categories.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use paperback_core::{AuthorId, BookId, CategoryId, Price};

use super::{RepositoryError, map_unique_violation};
use crate::models::{Author, Book, Category};

const BOOK_SELECT: &str = r"
    SELECT b.id, b.title, b.description, b.price, b.stock, b.created_at,
           a.id AS author_id, a.first_name AS author_first_name, a.last_name AS author_last_name,
           c.id AS category_id, c.title AS category_title
    FROM storefront.book b
    JOIN storefront.author a ON a.id = b.author_id
    JOIN storefront.category c ON c.id = b.category_id
";

#[derive(sqlx::FromRow)]
struct BookRow {
    id: BookId,
    title: String,
    description: String,
    price: Decimal,
    stock: i32,
    created_at: DateTime<Utc>,
    author_id: AuthorId,
    author_first_name: String,
    author_last_name: String,
    category_id: CategoryId,
    category_title: String,
}

impl TryFrom<BookRow> for Book {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for book {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price,
            stock: row.stock,
            author: Author {
                id: row.author_id,
                first_name: row.author_first_name,
                last_name: row.author_last_name,
            },
            category: Category {
                id: row.category_id,
                title: row.category_title,
            },
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    title: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
        }
    }
}

/// Input for creating a book.
#[derive(Debug, Clone)]
pub struct NewBook<'b> {
    pub title: &'b str,
    pub description: &'b str,
    pub price: Price,
    pub stock: i32,
    pub author_id: AuthorId,
    pub category_id: CategoryId,
}

/// Repository for catalog queries.
pub struct BookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a book by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{BOOK_SELECT} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Book::try_from).transpose()
    }

    /// List one page of books, newest first, optionally within a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<CategoryId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r"{BOOK_SELECT}
            WHERE ($1::int IS NULL OR b.category_id = $1)
            ORDER BY b.created_at DESC, b.id DESC
            LIMIT $2 OFFSET $3"
        ))
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    /// Count books, optionally within a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, category: Option<CategoryId>) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.book WHERE ($1::int IS NULL OR category_id = $1)",
        )
        .bind(category)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// List all categories by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, title FROM storefront.category ORDER BY title",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, title FROM storefront.category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Find a category by title, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_or_create_category(&self, title: &str) -> Result<Category, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO storefront.category (title) VALUES ($1)
            ON CONFLICT (title) DO UPDATE SET title = EXCLUDED.title
            RETURNING id, title
            ",
        )
        .bind(title)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Find an author by name, creating them if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_or_create_author(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Author, RepositoryError> {
        let existing = sqlx::query_scalar::<_, AuthorId>(
            "SELECT id FROM storefront.author WHERE first_name = $1 AND last_name = $2 ORDER BY id LIMIT 1",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(self.pool)
        .await?;

        let id = match existing {
            Some(id) => id,
            None => {
                sqlx::query_scalar::<_, AuthorId>(
                    "INSERT INTO storefront.author (first_name, last_name) VALUES ($1, $2) RETURNING id",
                )
                .bind(first_name)
                .bind(last_name)
                .fetch_one(self.pool)
                .await?
            }
        };

        Ok(Author {
            id,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
        })
    }

    /// Create a book unless one with the same title and author exists.
    ///
    /// Returns the new book's ID, or `None` if it was already present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a constraint violation.
    pub async fn create_if_absent(&self, book: &NewBook<'_>) -> Result<Option<BookId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, BookId>(
            r"
            INSERT INTO storefront.book (title, description, price, stock, author_id, category_id)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM storefront.book WHERE title = $1 AND author_id = $5
            )
            RETURNING id
            ",
        )
        .bind(book.title)
        .bind(book.description)
        .bind(book.price.amount())
        .bind(book.stock)
        .bind(book.author_id)
        .bind(book.category_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "book already exists"))?;

        Ok(id)
    }
}
