/// Session Verification Middleware
///
/// Gatekeeper for protected routes. For every request it:
/// 1. extracts the token (cookie `token`, else `Authorization: Bearer`)
/// 2. rejects it if it is in the revocation ledger
/// 3. checks signature and expiry with the role's keys
/// 4. loads the actor named by the token
/// 5. stores the actor in request extensions and calls the inner service
///
/// Steps 1-3 fail with 401. A valid token whose actor is gone fails with 404.
/// One implementation serves both roles; `SessionGuard<User>` and
/// `SessionGuard<Captain>` differ only in the keys and repository they hold.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::{extract_session_token, SessionKeys};
use crate::domain::Actor;
use crate::error::{AppError, AuthError};
use crate::store::{ActorRepository, RevocationLedger};

/// Everything needed to authenticate one role.
pub struct SessionVerifier<A: Actor> {
    keys: SessionKeys,
    actors: Arc<dyn ActorRepository<A>>,
    ledger: Arc<dyn RevocationLedger>,
}

impl<A: Actor> Clone for SessionVerifier<A> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            actors: self.actors.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

impl<A: Actor> SessionVerifier<A> {
    pub fn new(
        keys: SessionKeys,
        actors: Arc<dyn ActorRepository<A>>,
        ledger: Arc<dyn RevocationLedger>,
    ) -> Self {
        debug_assert_eq!(keys.role(), A::ROLE);
        Self {
            keys,
            actors,
            ledger,
        }
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub fn actors(&self) -> &dyn ActorRepository<A> {
        self.actors.as_ref()
    }

    pub fn ledger(&self) -> &dyn RevocationLedger {
        self.ledger.as_ref()
    }

    /// Resolve the actor a request's token speaks for.
    ///
    /// The revocation check runs before the token is decoded, so a revoked
    /// token is refused even while its signature and expiry are still good.
    pub async fn authenticate(&self, token: Option<String>) -> Result<A, AppError> {
        let token = token.ok_or(AppError::Auth(AuthError::MissingToken))?;

        if self.ledger.is_revoked(&token).await? {
            return Err(AppError::Auth(AuthError::TokenRevoked));
        }

        let claims = self.keys.verify(&token)?;
        let actor_id = claims.actor_id()?;

        self.actors
            .find_by_id(actor_id)
            .await?
            .ok_or_else(|| AppError::not_found(A::ROLE.not_found_message()))
    }
}

/// actix middleware wrapping a [`SessionVerifier`]
pub struct SessionGuard<A: Actor> {
    verifier: SessionVerifier<A>,
}

impl<A: Actor> SessionGuard<A> {
    pub fn new(verifier: SessionVerifier<A>) -> Self {
        Self { verifier }
    }
}

impl<S, B, A> Transform<S, ServiceRequest> for SessionGuard<A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: Actor,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGuardService<S, A>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionGuardService {
            service: Rc::new(service),
            verifier: Rc::new(self.verifier.clone()),
        }))
    }
}

pub struct SessionGuardService<S, A: Actor> {
    service: Rc<S>,
    verifier: Rc<SessionVerifier<A>>,
}

impl<S, B, A> Service<ServiceRequest> for SessionGuardService<S, A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: Actor,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = extract_session_token(req.request());
        let service = self.service.clone();
        let verifier = self.verifier.clone();
        let role = A::ROLE;

        Box::pin(async move {
            match verifier.authenticate(token).await {
                Ok(actor) => {
                    tracing::debug!(
                        actor_id = %actor.id(),
                        role = %role,
                        "Session verified"
                    );
                    req.extensions_mut().insert(actor);
                    service.call(req).await
                }
                Err(e) => {
                    tracing::warn!(role = %role, error = %e, "Session rejected");
                    Err(e.into())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::configuration::JwtSettings;
    use crate::domain::{Captain, FullName, NewUser, Role, User};
    use crate::error::DatabaseError;
    use crate::store::{InMemoryActorRepository, InMemoryRevocationLedger};
    use uuid::Uuid;

    fn jwt() -> JwtSettings {
        JwtSettings {
            user_secret: "rider-secret".to_string(),
            captain_secret: "driver-secret".to_string(),
            token_expiry: 3600,
            issuer: "test".to_string(),
        }
    }

    async fn rider_setup() -> (SessionVerifier<User>, User) {
        let users = Arc::new(InMemoryActorRepository::<User>::new());
        let user = users
            .insert(
                NewUser {
                    fullname: FullName {
                        firstname: "Ann".to_string(),
                        lastname: None,
                    },
                    email: "ann@x.com".to_string(),
                },
                hash_password("secret123").unwrap(),
            )
            .await
            .unwrap();
        let verifier = SessionVerifier::new(
            SessionKeys::for_role(Role::User, &jwt()),
            users,
            Arc::new(InMemoryRevocationLedger::new()),
        );
        (verifier, user)
    }

    #[tokio::test]
    async fn valid_token_resolves_actor() {
        let (verifier, user) = rider_setup().await;
        let token = verifier.keys().issue(user.id, &user.email).unwrap();

        let actor = verifier.authenticate(Some(token)).await.unwrap();
        assert_eq!(actor.id, user.id);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (verifier, _) = rider_setup().await;
        assert!(matches!(
            verifier.authenticate(None).await,
            Err(AppError::Auth(AuthError::MissingToken))
        ));
    }

    #[tokio::test]
    async fn revoked_token_is_vetoed() {
        let (verifier, user) = rider_setup().await;
        let token = verifier.keys().issue(user.id, &user.email).unwrap();

        verifier.ledger().revoke(&token).await.unwrap();
        assert!(matches!(
            verifier.authenticate(Some(token)).await,
            Err(AppError::Auth(AuthError::TokenRevoked))
        ));
    }

    #[tokio::test]
    async fn revoked_garbage_is_rejected_before_decoding() {
        let (verifier, _) = rider_setup().await;
        verifier.ledger().revoke("garbage").await.unwrap();

        assert!(matches!(
            verifier.authenticate(Some("garbage".to_string())).await,
            Err(AppError::Auth(AuthError::TokenRevoked))
        ));
    }

    #[tokio::test]
    async fn captain_token_is_rejected_by_rider_verifier() {
        let (verifier, user) = rider_setup().await;
        let captain_keys = SessionKeys::for_role(Role::Captain, &jwt());
        let token = captain_keys.issue(user.id, &user.email).unwrap();

        assert!(matches!(
            verifier.authenticate(Some(token)).await,
            Err(AppError::Auth(AuthError::TokenInvalid))
        ));
    }

    #[tokio::test]
    async fn unknown_subject_is_not_found() {
        let (verifier, _) = rider_setup().await;
        let token = verifier.keys().issue(Uuid::new_v4(), "ghost@x.com").unwrap();

        match verifier.authenticate(Some(token)).await {
            Err(AppError::Database(DatabaseError::NotFound(msg))) => {
                assert_eq!(msg, "User not found")
            }
            other => panic!("expected not found, got {:?}", other.map(|u| u.id)),
        }
    }

    #[tokio::test]
    async fn captain_verifier_uses_captain_message() {
        let verifier = SessionVerifier::<Captain>::new(
            SessionKeys::for_role(Role::Captain, &jwt()),
            Arc::new(InMemoryActorRepository::<Captain>::new()),
            Arc::new(InMemoryRevocationLedger::new()),
        );
        let token = verifier.keys().issue(Uuid::new_v4(), "raj@x.com").unwrap();

        match verifier.authenticate(Some(token)).await {
            Err(AppError::Database(DatabaseError::NotFound(msg))) => {
                assert_eq!(msg, "Captain not found")
            }
            other => panic!("expected not found, got {:?}", other.map(|c| c.id)),
        }
    }
}
