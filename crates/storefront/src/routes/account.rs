//! Account settings (`/users/edit`).

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

use paperback_core::UserId;

use super::auth::form_message;
use crate::db::IdentityRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAuth, push_flash, set_current_user};
use crate::models::{CurrentUser, Identity};
use crate::services::auth::{AccountUpdate, AuthService};
use crate::services::avatar::{avatar_url_for, resolve_avatar};
use crate::state::AppState;

/// Account form data.
#[derive(Debug, Deserialize)]
pub struct EditAccountForm {
    pub email: String,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub current_password: Option<String>,
    pub avatar: Option<String>,
    pub avatar_cache: Option<String>,
    pub remove_avatar: Option<String>,
}

/// Account settings template.
#[derive(Template, WebTemplate)]
#[template(path = "users/edit.html")]
pub struct EditAccountTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
    /// Large preview of the current avatar.
    pub avatar_preview: String,
    pub avatar_cache: Option<String>,
    pub has_password: bool,
    pub identities: Vec<Identity>,
}

/// Preview size on the account page.
const PREVIEW_SIZE: u32 = 120;

async fn edit_template(
    state: &AppState,
    ctx: PageContext,
    user_id: UserId,
    error: Option<String>,
    avatar_cache: Option<String>,
) -> Result<EditAccountTemplate> {
    let auth = AuthService::new(state.pool());
    let user = auth.get_user(user_id).await?;
    let has_password = auth.has_password(user_id).await?;
    let identities = IdentityRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;

    Ok(EditAccountTemplate {
        ctx,
        error,
        avatar_preview: avatar_url_for(&user.email, user.avatar_url.as_deref(), PREVIEW_SIZE),
        email: user.email.into_inner(),
        avatar_cache,
        has_password,
        identities,
    })
}

/// Display account settings.
///
/// # Route
///
/// `GET /users/edit`
#[instrument(skip_all)]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    edit_template(&state, ctx, user.id, None, None).await
}

/// Save account settings.
///
/// # Route
///
/// `POST /users/edit`
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Form(form): Form<EditAccountForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());
    let existing = auth.get_user(user.id).await?;

    let new_password = form
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| (p, form.password_confirmation.as_deref().unwrap_or_default()));

    let avatar = resolve_avatar(
        existing.avatar_url.as_deref(),
        form.avatar.as_deref(),
        form.avatar_cache.as_deref(),
        form.remove_avatar.is_some(),
    );

    let avatar_cache = avatar.as_ref().ok().cloned().flatten();

    let result = match avatar {
        Ok(avatar_url) => {
            auth.update_account(
                user.id,
                AccountUpdate {
                    email: &form.email,
                    new_password,
                    current_password: form.current_password.as_deref(),
                    avatar_url: avatar_url.as_deref(),
                },
            )
            .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(updated) => {
            set_current_user(&session, &CurrentUser::from(&updated)).await?;
            tracing::info!(user_id = %updated.id, "Account updated");
            push_flash(
                &session,
                FlashLevel::Success,
                "Your account has been updated successfully.",
            )
            .await?;
            Ok(Redirect::to("/users/edit").into_response())
        }
        Err(e) if e.is_user_error() => {
            tracing::debug!(user_id = %user.id, "Account update rejected: {}", e);
            let template = edit_template(
                &state,
                ctx,
                user.id,
                Some(form_message(&e)),
                avatar_cache,
            )
            .await?;
            Ok(template.into_response())
        }
        Err(e) => Err(e.into()),
    }
}
