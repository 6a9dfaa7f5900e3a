//! PSN authentication
//!
//! Handles:
//! - NPSSO sign-in flow
//! - Session management and access token refresh
//! - Authentication extractors

mod middleware;
mod npsso;
pub mod session;

pub use middleware::{CurrentUser, MaybeUser, resolve_session};
pub use npsso::auth_router;
pub use session::{Session, SessionError, create_session_token, verify_session_token};
