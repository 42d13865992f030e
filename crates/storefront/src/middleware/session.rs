//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use sqlx::PgPool;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "paperback_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Expiry for a remembered sign-in: a week of inactivity.
#[must_use]
pub const fn remembered_expiry() -> Expiry {
    Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS))
}

/// Set the session lifetime for a fresh sign-in.
///
/// "Remember me" keeps the weekly inactivity expiry, even when an earlier
/// sign-in in the same session turned it off. Otherwise the cookie dies with
/// the browser.
pub fn apply_remember_me(session: &Session, remember: bool) {
    let expiry = if remember {
        remembered_expiry()
    } else {
        Expiry::OnSessionEnd
    };
    session.set_expiry(Some(expiry));
}

/// Create the session layer with `PostgreSQL` store.
///
/// Sessions stay alive for a week of inactivity. Signing in without
/// "remember me" switches the session to expire with the browser.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    // Table lives in the `tower_sessions` schema, created by migration
    let store = PostgresStore::new(pool.clone());

    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(remembered_expiry())
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn test_forgotten_sign_in_ends_with_browser() {
        let session = session();
        apply_remember_me(&session, false);
        assert!(matches!(session.expiry(), Some(Expiry::OnSessionEnd)));
    }

    #[test]
    fn test_remember_me_restores_weekly_expiry() {
        let session = session();
        apply_remember_me(&session, false);
        apply_remember_me(&session, true);
        assert!(matches!(
            session.expiry(),
            Some(Expiry::OnInactivity(d)) if d == Duration::days(7)
        ));
    }
}
