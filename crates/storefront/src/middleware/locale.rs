//! Interface locale selection via `?locale=`.

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tower_sessions::Session;

use super::flash::{FlashLevel, push_flash};
use crate::models::session_keys;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LocaleQuery {
    locale: Option<String>,
}

/// Store a requested locale in the session when it is available.
///
/// An unknown locale leaves the session untouched and queues a warning
/// flash instead. Must run inside the session layer.
pub async fn locale_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let requested = Query::<LocaleQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.locale)
        .filter(|l| !l.is_empty());

    if let Some(locale) = requested {
        let result = if state.config().locales.is_available(&locale) {
            session.insert(session_keys::LOCALE, &locale).await
        } else {
            tracing::error!(locale = %locale, "translation not available");
            push_flash(
                &session,
                FlashLevel::Warning,
                format!("{locale} translation not available"),
            )
            .await
        };

        if let Err(e) = result {
            tracing::error!("Failed to store locale in session: {}", e);
        }
    }

    next.run(request).await
}

/// The session's locale, or the configured default.
pub async fn current_locale(session: &Session, state: &AppState) -> String {
    session
        .get::<String>(session_keys::LOCALE)
        .await
        .ok()
        .flatten()
        .filter(|l| state.config().locales.is_available(l))
        .unwrap_or_else(|| state.config().locales.default.clone())
}
