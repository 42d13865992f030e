//! Password sign-up, sign-in, and sign-out handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::capitalize;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    FlashLevel, OptionalAuth, PageContext, apply_remember_me, clear_current_user, push_flash,
    set_current_user,
};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService};
use crate::services::avatar::resolve_avatar;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub remember_me: Option<String>,
    pub avatar: Option<String>,
    pub avatar_cache: Option<String>,
    pub remove_avatar: Option<String>,
}

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    pub remember_me: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/sign_up.html")]
pub struct SignUpTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub avatar_cache: Option<String>,
    pub providers: Vec<String>,
}

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/sign_in.html")]
pub struct SignInTemplate {
    pub ctx: PageContext,
    pub providers: Vec<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Put `user` in the session.
///
/// Without "remember me" the session ends with the browser.
pub(crate) async fn start_session(
    session: &Session,
    user: &User,
    remember: bool,
) -> std::result::Result<(), tower_sessions::session::Error> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    apply_remember_me(session, remember);
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Message shown on the form for a user-caused auth error.
pub(crate) fn form_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials | AuthError::UserNotFound => {
            "Invalid email or password.".to_string()
        }
        AuthError::UserAlreadyExists => "Email has already been taken".to_string(),
        AuthError::InvalidEmail(_) => "Email is invalid".to_string(),
        AuthError::PasswordMismatch => "Password confirmation doesn't match Password".to_string(),
        other => capitalize(&other.to_string()),
    }
}

/// Names of the OAuth providers offered on the auth pages.
fn provider_names(state: &AppState) -> Vec<String> {
    state
        .config()
        .oauth
        .providers
        .iter()
        .map(|p| p.name.clone())
        .collect()
}

// =============================================================================
// Sign Up
// =============================================================================

/// Display the sign-up page.
///
/// # Route
///
/// `GET /users/sign_up`
#[instrument(skip_all)]
pub async fn sign_up_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ctx: PageContext,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    SignUpTemplate {
        ctx,
        error: None,
        email: String::new(),
        avatar_cache: None,
        providers: provider_names(&state),
    }
    .into_response()
}

/// Handle sign-up form submission.
///
/// # Route
///
/// `POST /users/sign_up`
#[instrument(skip_all)]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<SignUpForm>,
) -> Result<Response> {
    let avatar = resolve_avatar(
        None,
        form.avatar.as_deref(),
        form.avatar_cache.as_deref(),
        form.remove_avatar.is_some(),
    );

    let avatar_cache = avatar.as_ref().ok().cloned().flatten();

    let result = match avatar {
        Ok(avatar_url) => {
            AuthService::new(state.pool())
                .register_with_password(
                    &form.email,
                    &form.password,
                    &form.password_confirmation,
                    avatar_url.as_deref(),
                )
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(user) => {
            start_session(&session, &user, form.remember_me.is_some()).await?;
            push_flash(
                &session,
                FlashLevel::Success,
                "Welcome! You have signed up successfully.",
            )
            .await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_error() => {
            tracing::debug!("Sign-up rejected: {}", e);
            Ok(SignUpTemplate {
                ctx,
                error: Some(form_message(&e)),
                email: form.email,
                avatar_cache,
                providers: provider_names(&state),
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Sign In / Out
// =============================================================================

/// Display the sign-in page.
///
/// # Route
///
/// `GET /users/sign_in`
#[instrument(skip_all)]
pub async fn sign_in_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    ctx: PageContext,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    SignInTemplate {
        ctx,
        providers: provider_names(&state),
    }
    .into_response()
}

/// Handle sign-in form submission.
///
/// # Route
///
/// `POST /users/sign_in`
#[instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignInForm>,
) -> Result<Redirect> {
    match AuthService::new(state.pool())
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            start_session(&session, &user, form.remember_me.is_some()).await?;
            tracing::info!(user_id = %user.id, "User signed in");
            push_flash(&session, FlashLevel::Success, "Signed in successfully.").await?;
            Ok(Redirect::to("/"))
        }
        Err(e) if e.is_user_error() => {
            tracing::warn!("Sign-in failed: {}", e);
            push_flash(&session, FlashLevel::Danger, form_message(&e)).await?;
            Ok(Redirect::to("/users/sign_in"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Sign out.
///
/// # Route
///
/// `POST /users/sign_out`
#[instrument(skip_all)]
pub async fn sign_out(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();
    push_flash(&session, FlashLevel::Success, "Signed out successfully.").await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use paperback_core::Email;

    use super::*;

    #[test]
    fn test_form_message_hides_account_existence() {
        assert_eq!(
            form_message(&AuthError::UserNotFound),
            form_message(&AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_form_message_capitalizes_fallback() {
        let err = AuthError::WeakPassword("password must be at least 8 characters".to_string());
        assert_eq!(
            form_message(&err),
            "Password validation failed: password must be at least 8 characters"
        );
        let err = AuthError::InvalidEmail(Email::parse("nope").unwrap_err());
        assert_eq!(form_message(&err), "Email is invalid");
    }
}
