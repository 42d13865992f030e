//! Category listing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::BookRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::Category;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub categories: Vec<Category>,
}

/// `GET /categories`
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let categories = BookRepository::new(state.pool()).list_categories().await?;
    Ok(CategoriesTemplate { ctx, categories })
}
