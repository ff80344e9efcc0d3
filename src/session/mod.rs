//! Server-side sessions keyed by an opaque cookie.
//!
//! The cookie only carries a random token; the authenticated user id lives in
//! the `sessions` table and is resolved once per request by the extractors.

pub mod extractors;
mod repo;

pub use extractors::{CurrentUser, SessionContext};

pub const SESSION_COOKIE: &str = "session";
