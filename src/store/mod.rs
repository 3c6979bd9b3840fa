/// Store module
///
/// Persistence seams for actors and revoked tokens. Both come with a Postgres
/// backend and an in-process backend with the same uniqueness guarantees.

mod memory;
mod postgres;
mod revocation;

pub use memory::{InMemoryActorRepository, InMemoryRevocationLedger};
pub use postgres::{PgCaptainRepository, PgRevocationLedger, PgUserRepository};
pub use revocation::{prune_expired_revocations, token_digest, RevocationLedger};

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Actor, Captain, Credentials, User};
use crate::error::AppError;

/// Actor persistence for one role.
///
/// `insert` must fail with a unique-violation error when the email already
/// exists. The handler's `email_exists` pre-check is only a fast path; this
/// is what actually prevents duplicates under concurrent registrations.
#[async_trait]
pub trait ActorRepository<A: Actor>: Send + Sync {
    async fn insert(&self, draft: A::Draft, password_hash: String) -> Result<A, AppError>;

    /// Default read: never includes the password hash.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<A>, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Login read: the actor plus its password hash.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credentials<A>>, AppError>;
}

/// Everything the HTTP layer needs from the store, shared by all workers.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn ActorRepository<User>>,
    pub captains: Arc<dyn ActorRepository<Captain>>,
    pub ledger: Arc<dyn RevocationLedger>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            captains: Arc::new(PgCaptainRepository::new(pool.clone())),
            ledger: Arc::new(PgRevocationLedger::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryActorRepository::<User>::new()),
            captains: Arc::new(InMemoryActorRepository::<Captain>::new()),
            ledger: Arc::new(InMemoryRevocationLedger::new()),
        }
    }
}
