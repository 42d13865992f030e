//! Integration tests for Paperback.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a disposable database
//! export TEST_DATABASE_URL=postgres://localhost/paperback_test
//!
//! # Database tests (migrations are applied automatically)
//! cargo test -p paperback-integration-tests -- --ignored
//! ```
//!
//! The HTTP tests in `tests/storefront_http.rs` also need a running
//! storefront at `STOREFRONT_BASE_URL` (default `http://localhost:3000`).

use paperback_core::{Email, Price};
use paperback_storefront::db::books::NewBook;
use paperback_storefront::db::{self, BookRepository, RepositoryError, UserRepository};
use paperback_storefront::models::{Book, User};
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

/// Errors while preparing the test database.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("TEST_DATABASE_URL (or STOREFRONT_DATABASE_URL) not set")]
    MissingDatabaseUrl,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A migrated database plus helpers for creating fixtures.
///
/// Fixtures use random emails and titles so tests can share one database.
pub struct TestContext {
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the test database and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns `SetupError` if the URL is missing or the database is unreachable.
    pub async fn connect() -> Result<Self, SetupError> {
        dotenvy::dotenv().ok();

        let url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("STOREFRONT_DATABASE_URL"))
            .map(SecretString::from)
            .map_err(|_| SetupError::MissingDatabaseUrl)?;

        let pool = db::create_pool(&url).await?;
        sqlx::migrate!("../storefront/migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// A fresh user without a password.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::Repository` if the insert fails.
    pub async fn create_user(&self) -> Result<User, SetupError> {
        let email = Email::parse(&unique_email("reader")).map_err(|e| {
            RepositoryError::DataCorruption(format!("generated email rejected: {e}"))
        })?;
        Ok(UserRepository::new(&self.pool).create(&email, None).await?)
    }

    /// A fresh book in the "Test Fixtures" category.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::Repository` if an insert fails.
    pub async fn create_book(&self, price_cents: i64, stock: i32) -> Result<Book, SetupError> {
        let books = BookRepository::new(&self.pool);
        let category = books.find_or_create_category("Test Fixtures").await?;
        let author = books.find_or_create_author("Test", "Author").await?;
        let title = format!("Fixture {}", Uuid::new_v4());
        let price = Price::from_cents(price_cents).map_err(|e| {
            RepositoryError::DataCorruption(format!("fixture price rejected: {e}"))
        })?;

        let id = books
            .create_if_absent(&NewBook {
                title: &title,
                description: "",
                price,
                stock,
                author_id: author.id,
                category_id: category.id,
            })
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(books.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?)
    }
}

/// A random address under `example.com`.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_email_parses() {
        let a = unique_email("reader");
        assert_ne!(a, unique_email("reader"));
        assert!(Email::parse(&a).is_ok());
    }
}
