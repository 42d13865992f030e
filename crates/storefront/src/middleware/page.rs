//! Per-page layout context: current user, avatar, flashes, and locale.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::flash::{Flash, take_flashes};
use super::locale::current_locale;
use crate::models::{CurrentUser, session_keys};
use crate::services::avatar::{DEFAULT_AVATAR_SIZE, avatar_url_for};
use crate::state::AppState;

/// Everything the base layout needs.
///
/// Extracting it consumes the pending flash messages, so only handlers that
/// render a page should ask for it.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub current_user: Option<CurrentUser>,
    /// Avatar for the navigation bar.
    pub avatar_url: Option<String>,
    pub flashes: Vec<Flash>,
    pub locale: String,
}

impl PageContext {
    /// Whether someone is signed in.
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self {
                locale: state.config().locales.default.clone(),
                ..Self::default()
            });
        };

        let current_user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        let flashes = take_flashes(&session).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read flash messages: {}", e);
            Vec::new()
        });

        let avatar_url = current_user
            .as_ref()
            .map(|u| avatar_url_for(&u.email, u.avatar_url.as_deref(), DEFAULT_AVATAR_SIZE));

        Ok(Self {
            current_user,
            avatar_url,
            flashes,
            locale: current_locale(&session, state).await,
        })
    }
}
