/// Session Token Signing and Verification
///
/// One `SessionKeys` exists per role. Each holds that role's secret, so a
/// token signed for riders fails signature verification under the captain
/// keys and vice versa.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::domain::Role;
use crate::error::{AppError, AuthError};

#[derive(Clone)]
pub struct SessionKeys {
    role: Role,
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: i64,
    issuer: String,
}

impl SessionKeys {
    pub fn new(role: Role, secret: &str, expiry_seconds: i64, issuer: impl Into<String>) -> Self {
        Self {
            role,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
            issuer: issuer.into(),
        }
    }

    /// Keys for `role`, picking the matching secret out of the settings.
    pub fn for_role(role: Role, config: &JwtSettings) -> Self {
        let secret = match role {
            Role::User => &config.user_secret,
            Role::Captain => &config.captain_secret,
        };
        Self::new(role, secret, config.token_expiry, config.issuer.clone())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Token lifetime in seconds.
    pub fn expiry_seconds(&self) -> i64 {
        self.expiry_seconds
    }

    /// Sign a new session token for an actor of this role
    ///
    /// # Errors
    /// Returns an internal error if encoding fails
    pub fn issue(&self, actor_id: Uuid, email: &str) -> Result<String, AppError> {
        let claims = Claims::new(
            actor_id,
            email.to_string(),
            self.role,
            self.expiry_seconds,
            self.issuer.clone(),
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Check signature, issuer and expiry, then the role claim
    ///
    /// # Errors
    /// - `TokenExpired` when `exp` has passed
    /// - `RoleMismatch` when a correctly signed token names another role
    /// - `TokenInvalid` for anything else (bad signature, garbage, wrong issuer)
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        // Expired means expired: no grace period past `exp`.
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(role = %self.role, "Session token rejected: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::Auth(AuthError::TokenExpired),
                    _ => AppError::Auth(AuthError::TokenInvalid),
                }
            })?;

        if claims.role != self.role {
            tracing::warn!(
                expected = %self.role,
                found = %claims.role,
                "Session token role does not match verifier"
            );
            return Err(AppError::Auth(AuthError::RoleMismatch));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            user_secret: "rider-secret-key-at-least-32-characters".to_string(),
            captain_secret: "driver-secret-key-at-least-32-characters".to_string(),
            token_expiry: 604800,
            issuer: "test".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let keys = SessionKeys::for_role(Role::User, &get_test_config());
        let actor_id = Uuid::new_v4();

        let token = keys.issue(actor_id, "ann@x.com").expect("Failed to issue token");
        let claims = keys.verify(&token).expect("Failed to verify token");

        assert_eq!(claims.actor_id().unwrap(), actor_id);
        assert_eq!(claims.email, "ann@x.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 604800);
    }

    #[test]
    fn rider_token_fails_under_captain_keys() {
        let config = get_test_config();
        let rider = SessionKeys::for_role(Role::User, &config);
        let driver = SessionKeys::for_role(Role::Captain, &config);

        let rider_token = rider.issue(Uuid::new_v4(), "ann@x.com").unwrap();
        let driver_token = driver.issue(Uuid::new_v4(), "raj@x.com").unwrap();

        assert!(matches!(
            driver.verify(&rider_token),
            Err(AppError::Auth(AuthError::TokenInvalid))
        ));
        assert!(matches!(
            rider.verify(&driver_token),
            Err(AppError::Auth(AuthError::TokenInvalid))
        ));
    }

    #[test]
    fn role_claim_is_checked_even_with_shared_secret() {
        let captain = SessionKeys::new(Role::Captain, "shared", 60, "test");
        let user = SessionKeys::new(Role::User, "shared", 60, "test");

        let token = captain.issue(Uuid::new_v4(), "raj@x.com").unwrap();
        assert!(matches!(
            user.verify(&token),
            Err(AppError::Auth(AuthError::RoleMismatch))
        ));
    }

    #[test]
    fn token_expired_seconds_ago_is_rejected() {
        let config = get_test_config();
        let keys = SessionKeys::for_role(Role::User, &config);

        let mut claims = Claims::new(
            Uuid::new_v4(),
            "ann@x.com".to_string(),
            Role::User,
            0,
            "test".to_string(),
        );
        claims.exp -= 5;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.user_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            keys.verify(&token),
            Err(AppError::Auth(AuthError::TokenExpired))
        ));
    }

    #[test]
    fn test_expired_token() {
        let config = get_test_config();
        let keys = SessionKeys::for_role(Role::User, &config);

        let mut claims = Claims::new(
            Uuid::new_v4(),
            "ann@x.com".to_string(),
            Role::User,
            0,
            "test".to_string(),
        );
        claims.iat -= 8 * 24 * 3600;
        claims.exp -= 24 * 3600;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.user_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            keys.verify(&token),
            Err(AppError::Auth(AuthError::TokenExpired))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let keys = SessionKeys::for_role(Role::User, &get_test_config());
        assert!(keys.verify("invalid.token.here").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn test_tampered_token() {
        let keys = SessionKeys::for_role(Role::Captain, &get_test_config());
        let token = keys.issue(Uuid::new_v4(), "raj@x.com").unwrap();

        let tampered = format!("{}X", token);
        assert!(keys.verify(&tampered).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();
        let token = SessionKeys::for_role(Role::User, &config)
            .issue(Uuid::new_v4(), "ann@x.com")
            .unwrap();

        config.issuer = "wrong-issuer".to_string();
        let keys = SessionKeys::for_role(Role::User, &config);
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn same_second_tokens_are_distinct() {
        let keys = SessionKeys::for_role(Role::User, &get_test_config());
        let id = Uuid::new_v4();
        assert_ne!(
            keys.issue(id, "ann@x.com").unwrap(),
            keys.issue(id, "ann@x.com").unwrap()
        );
    }
}
