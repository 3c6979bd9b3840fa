/// Session token claims
///
/// The payload signed into every session token: the actor's id and email,
/// the role it was issued for, and the standard time claims.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Role;
use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Actor id (UUID string)
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    /// Random token id; keeps two tokens minted in the same second distinct.
    pub jti: String,
}

impl Claims {
    pub fn new(actor_id: Uuid, email: String, role: Role, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: actor_id.to_string(),
            email,
            role,
            iat: now,
            exp: now + expiry_seconds,
            iss: issuer,
            jti: generate_token_id(),
        }
    }

    /// Parse the subject id.
    ///
    /// # Errors
    /// A signed token with a non-UUID subject is treated as an invalid token.
    pub fn actor_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.id).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }
}

fn generate_token_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
