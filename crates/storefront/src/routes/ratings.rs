//! Book rating handlers.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use paperback_core::{BookId, RatingScore};

use crate::db::{BookRepository, RatingRepository};
use crate::error::{AppError, Result};
use crate::middleware::{FlashLevel, RequireAuth, push_flash};
use crate::state::AppState;

/// Rating form data.
#[derive(Debug, Deserialize)]
pub struct RatingForm {
    pub score: i16,
    pub review: Option<String>,
}

/// Rate a book, replacing any earlier rating by the same user.
///
/// # Route
///
/// `POST /books/{id}/ratings`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(book_id): Path<BookId>,
    Form(form): Form<RatingForm>,
) -> Result<Redirect> {
    let book = BookRepository::new(state.pool())
        .get_by_id(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {book_id}")))?;
    let back = format!("/books/{}", book.id);

    let score = match RatingScore::new(form.score) {
        Ok(score) => score,
        Err(e) => {
            push_flash(&session, FlashLevel::Danger, e.to_string()).await?;
            return Ok(Redirect::to(&back));
        }
    };

    let review = form
        .review
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let rating_id = RatingRepository::new(state.pool())
        .upsert(user.id, book.id, score, review)
        .await?;
    tracing::info!(rating_id = %rating_id, book_id = %book.id, score = %score, "Book rated");

    push_flash(&session, FlashLevel::Success, "Thank you for rating this book.").await?;
    Ok(Redirect::to(&back))
}
