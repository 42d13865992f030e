//! Domain models for storefront.

pub mod book;
pub mod order;
pub mod rating;
pub mod session;
pub mod user;

pub use book::{Author, Book, Category};
pub use order::{Order, OrderDetails, OrderItem};
pub use rating::Rating;
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Identity, User};
