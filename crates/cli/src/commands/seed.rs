//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! books:
//!   - title: Dune
//!     description: Desert planet, spice, prophecy.
//!     price: "9.99"
//!     stock: 12
//!     category: Science Fiction
//!     author:
//!       first_name: Frank
//!       last_name: Herbert
//! ```
//!
//! Categories and authors are created on first use. A book whose title and
//! author already exist is skipped, so the command can be re-run safely.

use std::path::Path;

use paperback_core::Price;
use paperback_storefront::db::{self, BookRepository, books::NewBook};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

/// Top-level catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub books: Vec<BookSeed>,
}

/// One book entry.
#[derive(Debug, Deserialize)]
pub struct BookSeed {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub author: AuthorSeed,
}

#[derive(Debug, Deserialize)]
pub struct AuthorSeed {
    pub first_name: String,
    pub last_name: String,
}

/// Counts reported after seeding.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub inserted: usize,
    pub skipped: usize,
}

/// Check every entry before anything touches the database.
///
/// Returns one message per problem found.
#[must_use]
pub fn validate_catalog(catalog: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    for (index, book) in catalog.books.iter().enumerate() {
        let label = if book.title.trim().is_empty() {
            format!("book #{}", index + 1)
        } else {
            book.title.clone()
        };

        if book.title.trim().is_empty() {
            errors.push(format!("{label}: title can't be blank"));
        }
        if book.category.trim().is_empty() {
            errors.push(format!("{label}: category can't be blank"));
        }
        if book.author.first_name.trim().is_empty() || book.author.last_name.trim().is_empty() {
            errors.push(format!("{label}: author needs a first and last name"));
        }
        if let Err(e) = Price::new(book.price) {
            errors.push(format!("{label}: {e}"));
        }
        if book.stock < 0 {
            errors.push(format!("{label}: stock must be greater than or equal to 0"));
        }
    }

    errors
}

/// Seed the catalog from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogSeed = serde_yaml::from_str(&content)?;

    info!(books = catalog.books.len(), "Parsed catalog");

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let books = BookRepository::new(&pool);
    let mut result = SeedResult::default();

    for entry in &catalog.books {
        let category = books.find_or_create_category(entry.category.trim()).await?;
        let author = books
            .find_or_create_author(entry.author.first_name.trim(), entry.author.last_name.trim())
            .await?;
        let new_book = NewBook {
            title: entry.title.trim(),
            description: &entry.description,
            price: Price::new(entry.price)?,
            stock: entry.stock,
            author_id: author.id,
            category_id: category.id,
        };

        match books.create_if_absent(&new_book).await? {
            Some(id) => {
                info!(book_id = %id, title = %new_book.title, "Inserted book");
                result.inserted += 1;
            }
            None => result.skipped += 1,
        }
    }

    info!("Seeding complete!");
    info!("  Books inserted: {}", result.inserted);
    info!("  Books skipped (already exist): {}", result.skipped);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
books:
  - title: Dune
    price: "9.99"
    stock: 12
    category: Science Fiction
    author:
      first_name: Frank
      last_name: Herbert
  - title: ""
    price: "0"
    stock: -1
    category: " "
    author:
      first_name: Nobody
      last_name: ""
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog: CatalogSeed = serde_yaml::from_str(CATALOG).unwrap();
        assert_eq!(catalog.books.len(), 2);
        let dune = catalog.books.first().unwrap();
        assert_eq!(dune.price, Decimal::new(999, 2));
        assert_eq!(dune.description, "");
        assert_eq!(dune.author.last_name, "Herbert");
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let catalog: CatalogSeed = serde_yaml::from_str(CATALOG).unwrap();
        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().all(|e| e.starts_with("book #2: ")));
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let content = include_str!("../../../../seeds/catalog.yaml");
        let catalog: CatalogSeed = serde_yaml::from_str(content).unwrap();
        assert!(!catalog.books.is_empty());
        assert!(validate_catalog(&catalog).is_empty());
    }
}
