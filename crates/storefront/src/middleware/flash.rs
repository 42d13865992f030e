//! One-shot flash messages carried in the session.
//!
//! A handler pushes a message before redirecting; the next rendered page
//! takes (and thereby clears) every pending message.

use axum::{extract::Request, middleware::Next, response::Response};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Severity of a flash message, used as its CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    /// CSS modifier for the alert box.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// A message shown once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Queue a flash message for the next page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut flashes: Vec<Flash> = session.get(session_keys::FLASH).await?.unwrap_or_default();
    flashes.push(Flash {
        level,
        message: message.into(),
    });
    session.insert(session_keys::FLASH, flashes).await
}

/// Remove and return every pending flash message.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn take_flashes(session: &Session) -> Result<Vec<Flash>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Flash>>(session_keys::FLASH)
        .await?
        .unwrap_or_default())
}

/// Danger message attached to a response that has no session access.
///
/// [`AppError`](crate::error::AppError) sets it on access-denied redirects;
/// [`pending_alert_middleware`] moves it into the flash queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAlert(pub String);

/// Turn a [`PendingAlert`] response extension into a danger flash.
///
/// Must sit inside the session layer.
pub async fn pending_alert_middleware(session: Session, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    if let Some(PendingAlert(message)) = response.extensions_mut().remove::<PendingAlert>()
        && let Err(e) = push_flash(&session, FlashLevel::Danger, message).await
    {
        tracing::warn!("Failed to store alert flash: {}", e);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        middleware::from_fn,
        routing::get,
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;
    use crate::error::AppError;
    use crate::policy::AccessDenied;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flash_round_trip() {
        let session = session();
        push_flash(&session, FlashLevel::Success, "The book successfully added to the Cart.")
            .await
            .unwrap();
        push_flash(&session, FlashLevel::Warning, "Careful").await.unwrap();

        let flashes = take_flashes(&session).await.unwrap();
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].level, FlashLevel::Success);
        assert_eq!(flashes[0].message, "The book successfully added to the Cart.");
        assert_eq!(flashes[1].level.as_str(), "warning");

        // Taken messages are gone
        assert!(take_flashes(&session).await.unwrap().is_empty());
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&FlashLevel::Danger).unwrap();
        assert_eq!(json, "\"danger\"");
    }

    async fn denied() -> Result<(), AppError> {
        Err(AccessDenied.into())
    }

    async fn show_flashes(session: Session) -> String {
        take_flashes(&session)
            .await
            .unwrap()
            .into_iter()
            .map(|f| format!("{}: {}", f.level.as_str(), f.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_access_denied_becomes_danger_flash() {
        let app = Router::new()
            .route("/denied", get(denied))
            .route("/", get(show_flashes))
            .layer(from_fn(pending_alert_middleware))
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/denied").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_owned();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "danger: You are not authorized to access this page.");
    }

    #[tokio::test]
    async fn test_alert_query_is_not_shown() {
        let app = Router::new()
            .route("/", get(show_flashes))
            .layer(from_fn(pending_alert_middleware))
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/?alert=Your%20account%20is%20locked")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
