//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use paperback_core::{BookId, CategoryId};

use crate::db::{BookRepository, RatingRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{Book, Category, Rating};
use crate::state::AppState;

/// Books per catalog page.
const PER_PAGE: i64 = 12;

/// Query parameters for the catalog listing.
#[derive(Debug, Deserialize)]
pub struct BookListQuery {
    pub category: Option<CategoryId>,
    pub page: Option<i64>,
}

/// Catalog listing template.
#[derive(Template, WebTemplate)]
#[template(path = "books/index.html")]
pub struct BooksIndexTemplate {
    pub ctx: PageContext,
    pub books: Vec<Book>,
    pub categories: Vec<Category>,
    pub category: Option<Category>,
    pub page: i64,
    pub total_pages: i64,
}

impl BooksIndexTemplate {
    /// Query string for another page of the same listing.
    fn page_query(&self, page: i64) -> String {
        match &self.category {
            Some(c) => format!("?category={}&page={page}", c.id),
            None => format!("?page={page}"),
        }
    }
}

/// Book detail template.
#[derive(Template, WebTemplate)]
#[template(path = "books/show.html")]
pub struct BookShowTemplate {
    pub ctx: PageContext,
    pub book: Book,
    pub ratings: Vec<Rating>,
    pub average: Option<Decimal>,
    pub in_wishlist: bool,
}

/// Number of pages needed for `total` books, never less than one.
const fn page_count(total: i64) -> i64 {
    let pages = (total + PER_PAGE - 1) / PER_PAGE;
    if pages < 1 { 1 } else { pages }
}

/// List books, newest first.
///
/// # Route
///
/// `GET /` and `GET /books?category=&page=`
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<BookListQuery>,
) -> Result<impl IntoResponse> {
    let repo = BookRepository::new(state.pool());

    let category = match query.category {
        Some(id) => Some(
            repo.get_category(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("category {id}")))?,
        ),
        None => None,
    };

    let total = repo.count(query.category).await?;
    let total_pages = page_count(total);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);

    let books = repo
        .list(query.category, PER_PAGE, (page - 1) * PER_PAGE)
        .await?;
    let categories = repo.list_categories().await?;

    Ok(BooksIndexTemplate {
        ctx,
        books,
        categories,
        category,
        page,
        total_pages,
    })
}

/// Show one book with its ratings.
///
/// # Route
///
/// `GET /books/{id}`
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<BookId>,
) -> Result<impl IntoResponse> {
    let book = BookRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {id}")))?;

    let ratings_repo = RatingRepository::new(state.pool());
    let ratings = ratings_repo.list_for_book(id).await?;
    let average = ratings_repo.average_for_book(id).await?;

    let in_wishlist = match &ctx.current_user {
        Some(user) => {
            WishlistRepository::new(state.pool())
                .contains(user.id, id)
                .await?
        }
        None => false,
    };

    Ok(BookShowTemplate {
        ctx,
        book,
        ratings,
        average,
        in_wishlist,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(12), 1);
        assert_eq!(page_count(13), 2);
        assert_eq!(page_count(25), 3);
    }
}
