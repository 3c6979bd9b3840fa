/// Authentication module
///
/// Password hashing, role-scoped session token signing/verification and
/// session token transport (cookie / bearer header).

mod claims;
mod jwt;
mod password;
mod session_token;

pub use claims::Claims;
pub use jwt::SessionKeys;
pub use password::hash_password;
pub use password::hash_password_async;
pub use password::verify_password;
pub use password::verify_password_async;
pub use password::HASH_COST;
pub use session_token::extract_session_token;
pub use session_token::removal_cookie;
pub use session_token::session_cookie;
pub use session_token::SESSION_COOKIE;
