//! Authentication service.
//!
//! Provides password sign-up/sign-in, account updates, and resolution of
//! OAuth sign-ins to local users.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use paperback_core::{Email, UserId};

use crate::db::{IdentityRepository, RepositoryError, UserRepository};
use crate::models::User;
use crate::services::oauth::AuthPayload;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Changes submitted from the account page.
#[derive(Debug, Clone, Copy)]
pub struct AccountUpdate<'f> {
    pub email: &'f str,
    /// New password and its confirmation; `None` keeps the current one.
    pub new_password: Option<(&'f str, &'f str)>,
    /// Required when the user already has a password.
    pub current_password: Option<&'f str>,
    /// Resolved avatar URL to store.
    pub avatar_url: Option<&'f str>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    identities: IdentityRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            identities: IdentityRepository::new(pool),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch` for a bad password.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_with_password(
        &self,
        email: &str,
        password: &str,
        password_confirmation: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_new_password(password, password_confirmation)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&email, &password_hash, avatar_url)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Whether the user can sign in with a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn has_password(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.users.get_password_hash_by_id(user_id).await?.is_some())
    }

    /// Apply account page changes.
    ///
    /// Users with a password must confirm it to change anything. OAuth-only
    /// users may set a first password without one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CurrentPasswordInvalid` if the current password is missing or wrong.
    /// Returns `AuthError::UserAlreadyExists` if the new email is taken.
    pub async fn update_account(
        &self,
        user_id: UserId,
        update: AccountUpdate<'_>,
    ) -> Result<User, AuthError> {
        if let Some(hash) = self.users.get_password_hash_by_id(user_id).await? {
            let current = update
                .current_password
                .filter(|p| !p.is_empty())
                .ok_or(AuthError::CurrentPasswordInvalid)?;
            verify_password(current, &hash).map_err(|_| AuthError::CurrentPasswordInvalid)?;
        }

        let email = Email::parse(update.email)?;
        let new_hash = match update.new_password {
            Some((password, confirmation)) => {
                validate_new_password(password, confirmation)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let user = self
            .users
            .update_profile(user_id, &email, update.avatar_url)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        if let Some(hash) = new_hash {
            self.users.set_password(user_id, &hash).await?;
        }

        Ok(user)
    }

    // =========================================================================
    // OAuth
    // =========================================================================

    /// Resolve an OAuth sign-in to a local user.
    ///
    /// 1. A known `(provider, uid)` identity signs in its user.
    /// 2. Otherwise a user with the payload's email gets the identity attached.
    /// 3. Otherwise a new user and identity are created together.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingEmail` when a new user would be created but
    /// the provider shared no email.
    pub async fn find_for_oauth(&self, auth: &AuthPayload) -> Result<User, AuthError> {
        if let Some(user) = self.identities.find_user(&auth.provider, &auth.uid).await? {
            tracing::debug!(user_id = %user.id, provider = %auth.provider, "Known identity");
            return Ok(user);
        }

        let email = auth
            .info
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .map(Email::parse)
            .transpose()?;

        if let Some(email) = &email
            && let Some(user) = self.users.get_by_email(email).await?
        {
            self.identities
                .create(user.id, &auth.provider, &auth.uid)
                .await?;
            tracing::info!(user_id = %user.id, provider = %auth.provider, "Identity linked to existing user");
            return Ok(user);
        }

        let email = email.ok_or_else(|| AuthError::MissingEmail {
            provider: auth.provider.clone(),
        })?;

        let (user, _identity) = self
            .identities
            .create_with_user(&email, &auth.provider, &auth.uid)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, provider = %auth.provider, "User created from identity");
        Ok(user)
    }
}

/// Validate a new password and its confirmation.
fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if password != confirmation {
        return Err(AuthError::PasswordMismatch);
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_too_short() {
        assert!(matches!(
            validate_new_password("short", "short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_password_confirmation_must_match() {
        assert!(matches!(
            validate_new_password("long enough", "long enougH"),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(validate_new_password("long enough", "long enough").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
