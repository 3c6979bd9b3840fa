/// Middleware module
///
/// Session verification for protected routes.

mod session_guard;

pub use session_guard::{SessionGuard, SessionVerifier};
