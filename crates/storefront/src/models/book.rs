//! Catalog domain types.

use chrono::{DateTime, Utc};

use paperback_core::{AuthorId, BookId, CategoryId, Price};

/// A book author.
#[derive(Debug, Clone)]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub last_name: String,
}

impl Author {
    /// First and last name separated by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A book category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
}

/// A book with its author and category.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub description: String,
    /// Current price. Line items keep their own snapshot.
    pub price: Price,
    /// Copies available to order.
    pub stock: i32,
    pub author: Author,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Whether at least one copy can be ordered.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}
