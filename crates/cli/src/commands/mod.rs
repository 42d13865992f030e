//! Subcommand implementations.

pub mod migrate;
pub mod order;
pub mod seed;

use secrecy::SecretString;

/// Variable holding the storefront connection string.
pub const DATABASE_URL_VAR: &str = "STOREFRONT_DATABASE_URL";

/// Read the storefront database URL, falling back to `DATABASE_URL`.
///
/// Loads `.env` first.
///
/// # Errors
///
/// Returns the variable name if neither is set.
pub fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();

    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| DATABASE_URL_VAR)
}
