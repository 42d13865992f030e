//! OAuth identity repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use paperback_core::{Email, IdentityId, UserId};

use super::users::{USER_COLUMNS, UserRow};
use super::{RepositoryError, map_unique_violation};
use crate::models::{Identity, User};

const IDENTITY_COLUMNS: &str = "id, user_id, provider, uid, created_at";

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: IdentityId,
    user_id: UserId,
    provider: String,
    uid: String,
    created_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            provider: row.provider,
            uid: row.uid,
            created_at: row.created_at,
        }
    }
}

/// Repository for OAuth identities.
pub struct IdentityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IdentityRepository<'a> {
    /// Create a new identity repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the user linked to a provider account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_user(&self, provider: &str, uid: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT u.id, u.email, u.avatar_url, u.created_at, u.updated_at
            FROM storefront.identity i
            JOIN storefront.user u ON u.id = i.user_id
            WHERE i.provider = $1 AND i.uid = $2
            ",
        )
        .bind(provider)
        .bind(uid)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Link a provider account to an existing user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the provider account is already linked.
    pub async fn create(
        &self,
        user_id: UserId,
        provider: &str,
        uid: &str,
    ) -> Result<Identity, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "INSERT INTO storefront.identity (user_id, provider, uid) VALUES ($1, $2, $3) RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(user_id)
        .bind(provider)
        .bind(uid)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "identity already linked"))?;

        Ok(row.into())
    }

    /// Create a password-less user and their first identity together.
    ///
    /// Both rows are written in one transaction, so a failure leaves neither.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or the identity already exists.
    pub async fn create_with_user(
        &self,
        email: &Email,
        provider: &str,
        uid: &str,
    ) -> Result<(User, Identity), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO storefront.user (email) VALUES ($1) RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "email already exists"))?;
        let user = User::try_from(user_row)?;

        let identity_row = sqlx::query_as::<_, IdentityRow>(&format!(
            "INSERT INTO storefront.identity (user_id, provider, uid) VALUES ($1, $2, $3) RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(user.id)
        .bind(provider)
        .bind(uid)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "identity already linked"))?;

        tx.commit().await?;

        Ok((user, identity_row.into()))
    }

    /// List a user's linked identities.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Identity>, RepositoryError> {
        let rows = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM storefront.identity WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Identity::from).collect())
    }
}
