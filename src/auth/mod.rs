//! Session authentication subsystem
//!
//! Handles:
//! - Credential hashing and verification
//! - Session lifecycle (login, touch, logout, expiry)
//! - Login attempt throttling
//! - Authentication middleware

mod handlers;
mod middleware;
pub mod password;
pub mod rate_limit;
pub mod session;

pub use handlers::auth_router;
pub use middleware::{
    CurrentSession, CurrentUser, MaybeUser, require_admin, require_auth, require_role,
};
pub use rate_limit::LoginRateLimiter;
pub use session::{AuthDecision, SessionRejection, SessionService, generate_session_id};
