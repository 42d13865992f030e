//! OAuth sign-in handlers.
//!
//! - `GET /users/auth/{provider}` redirects to the provider
//! - `GET /users/auth/{provider}/callback` finishes sign-in

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::auth::start_session;
use super::capitalize;
use crate::error::Result;
use crate::middleware::{FlashLevel, push_flash};
use crate::models::{User, session_keys};
use crate::services::auth::{AuthError, AuthService};
use crate::services::oauth::{OAuthClient, generate_state};
use crate::state::AppState;

/// Query parameters from the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for a token.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

fn redirect_uri(state: &AppState, provider: &str) -> String {
    format!("{}/users/auth/{provider}/callback", state.config().base_url)
}

/// Start the OAuth flow.
///
/// # Route
///
/// `GET /users/auth/{provider}`
#[instrument(skip_all)]
pub async fn authorize(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
) -> Result<Redirect> {
    let config = state
        .config()
        .oauth
        .provider(&provider)
        .ok_or_else(|| AuthError::UnknownProvider(provider.clone()))?;

    let oauth_state = generate_state();
    session
        .insert(session_keys::OAUTH_STATE, &oauth_state)
        .await?;

    let url = OAuthClient::new(state.http(), config)
        .authorization_url(&redirect_uri(&state, &provider), &oauth_state)?;

    Ok(Redirect::to(&url))
}

/// Handle the provider callback.
///
/// # Route
///
/// `GET /users/auth/{provider}/callback`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    let label = capitalize(&provider);

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_else(|| error.clone());
        tracing::warn!(provider = %provider, "OAuth error: {} - {}", error, description);
        push_flash(
            &session,
            FlashLevel::Danger,
            format!("Could not authenticate you from {label} because \"{description}\"."),
        )
        .await?;
        return Ok(Redirect::to("/users/sign_in"));
    }

    // The state is single-use
    let stored_state: Option<String> = session.remove(session_keys::OAUTH_STATE).await?;

    match complete_sign_in(&state, &provider, query.code, query.state, stored_state).await {
        Ok(user) => {
            start_session(&session, &user, true).await?;
            tracing::info!(user_id = %user.id, provider = %provider, "User signed in with OAuth");
            push_flash(
                &session,
                FlashLevel::Success,
                format!("Successfully authenticated from {label} account."),
            )
            .await?;
            Ok(Redirect::to("/"))
        }
        Err(e @ (AuthError::Repository(_) | AuthError::PasswordHash)) => Err(e.into()),
        Err(e) => {
            tracing::warn!(provider = %provider, "OAuth sign-in failed: {}", e);
            push_flash(
                &session,
                FlashLevel::Danger,
                format!("Could not authenticate you from {label}."),
            )
            .await?;
            Ok(Redirect::to("/users/sign_in"))
        }
    }
}

/// Verify state, exchange the code, and resolve the local user.
async fn complete_sign_in(
    state: &AppState,
    provider: &str,
    code: Option<String>,
    returned_state: Option<String>,
    stored_state: Option<String>,
) -> std::result::Result<User, AuthError> {
    let config = state
        .config()
        .oauth
        .provider(provider)
        .ok_or_else(|| AuthError::UnknownProvider(provider.to_owned()))?;

    match (returned_state, stored_state) {
        (Some(returned), Some(stored)) if returned == stored => {}
        _ => return Err(AuthError::InvalidSessionState),
    }

    let code = code.ok_or_else(|| AuthError::OAuth("callback is missing the code".to_owned()))?;

    let client = OAuthClient::new(state.http(), config);
    let token = client
        .exchange_code(&code, &redirect_uri(state, provider))
        .await?;
    let payload = client.fetch_payload(&token).await?;

    AuthService::new(state.pool()).find_for_oauth(&payload).await
}
