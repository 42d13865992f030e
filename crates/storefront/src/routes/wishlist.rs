//! Wishlist handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use paperback_core::BookId;

use crate::db::{BookRepository, RepositoryError, WishlistRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{FlashLevel, PageContext, RequireAuth, push_flash};
use crate::models::Book;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub ctx: PageContext,
    pub books: Vec<Book>,
}

/// `GET /wishlist`
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let books = WishlistRepository::new(state.pool()).list(user.id).await?;
    Ok(WishlistTemplate { ctx, books })
}

/// Save a book to the wishlist.
///
/// # Route
///
/// `POST /wishlist/{book_id}`
#[instrument(skip_all)]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(book_id): Path<BookId>,
) -> Result<Redirect> {
    let book = BookRepository::new(state.pool())
        .get_by_id(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {book_id}")))?;

    match WishlistRepository::new(state.pool()).add(user.id, book.id).await {
        Ok(()) => {
            push_flash(&session, FlashLevel::Success, "The book was added to your wishlist.")
                .await?;
        }
        Err(RepositoryError::Conflict(reason)) => {
            tracing::debug!(book_id = %book.id, "{}", reason);
            push_flash(&session, FlashLevel::Info, "The book is already in your wishlist.")
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&format!("/books/{}", book.id)))
}

/// Remove a book from the wishlist.
///
/// # Route
///
/// `DELETE /wishlist/{book_id}` (or `POST /wishlist/{book_id}/delete` from forms)
#[instrument(skip_all)]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(book_id): Path<BookId>,
) -> Result<Redirect> {
    let removed = WishlistRepository::new(state.pool())
        .remove(user.id, book_id)
        .await?;

    if removed {
        push_flash(&session, FlashLevel::Warning, "The book was removed from your wishlist.")
            .await?;
    } else {
        push_flash(&session, FlashLevel::Info, "The book is not in your wishlist.").await?;
    }

    Ok(Redirect::to("/wishlist"))
}
