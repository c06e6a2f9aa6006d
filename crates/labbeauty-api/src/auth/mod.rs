//! Operator authentication: argon2 password hashes and signed session cookies.

pub mod middleware;
pub mod password;
pub mod session;

pub use middleware::require_session;
pub use session::{SessionClaims, SessionKeys};
