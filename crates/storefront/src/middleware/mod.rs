//! HTTP middleware and extractors for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Locale (`?locale=` switching, needs the session)
//! 6. Pending alert (access-denied message into the flash queue)

pub mod auth;
pub mod flash;
pub mod locale;
pub mod page;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use flash::{
    Flash, FlashLevel, PendingAlert, pending_alert_middleware, push_flash, take_flashes,
};
pub use locale::locale_middleware;
pub use page::PageContext;
pub use request_id::request_id_middleware;
pub use session::{apply_remember_me, create_session_layer};
