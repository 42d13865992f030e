//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] paperback_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("password confirmation doesn't match")]
    PasswordMismatch,

    /// Current password missing or wrong when changing account details.
    #[error("current password is invalid")]
    CurrentPasswordInvalid,

    /// Avatar is not an http(s) URL.
    #[error("invalid avatar url: {0}")]
    InvalidAvatarUrl(String),

    /// OAuth provider returned no email for a brand-new user.
    #[error("{provider} did not share an email address")]
    MissingEmail {
        /// Provider name.
        provider: String,
    },

    /// OAuth provider is not configured.
    #[error("unknown oauth provider: {0}")]
    UnknownProvider(String),

    /// OAuth `state` missing or mismatched.
    #[error("invalid session state")]
    InvalidSessionState,

    /// OAuth provider rejected a request.
    #[error("oauth error: {0}")]
    OAuth(String),

    /// HTTP request to the OAuth provider failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the error comes from user input and can be shown on the form.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_)
                | Self::InvalidCredentials
                | Self::UserNotFound
                | Self::UserAlreadyExists
                | Self::WeakPassword(_)
                | Self::PasswordMismatch
                | Self::CurrentPasswordInvalid
                | Self::InvalidAvatarUrl(_)
                | Self::MissingEmail { .. }
        )
    }
}
