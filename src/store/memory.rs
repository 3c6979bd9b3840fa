/// In-process store backend
///
/// Used by the test-suite and by `database.in_memory = true`. Uniqueness is
/// checked and the record inserted under one write lock, so two concurrent
/// registrations with the same email cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::marker::PhantomData;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::revocation::{token_digest, RevocationLedger};
use super::ActorRepository;
use crate::domain::{Actor, ActorDraft, Credentials};
use crate::error::AppError;

pub struct InMemoryActorRepository<A> {
    records: RwLock<HashMap<Uuid, Credentials<A>>>,
    _role: PhantomData<A>,
}

impl<A> InMemoryActorRepository<A> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            _role: PhantomData,
        }
    }
}

impl<A> Default for InMemoryActorRepository<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<A: Actor> ActorRepository<A> for InMemoryActorRepository<A> {
    async fn insert(&self, draft: A::Draft, password_hash: String) -> Result<A, AppError> {
        let mut records = self.records.write().await;
        if records.values().any(|c| c.actor.email() == draft.email()) {
            return Err(AppError::email_in_use());
        }

        let actor = A::from_draft(Uuid::new_v4(), draft, Utc::now());
        records.insert(
            actor.id(),
            Credentials {
                actor: actor.clone(),
                password_hash,
            },
        );
        Ok(actor)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<A>, AppError> {
        let records = self.records.read().await;
        Ok(records.get(&id).map(|c| c.actor.clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let records = self.records.read().await;
        Ok(records.values().any(|c| c.actor.email() == email))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credentials<A>>, AppError> {
        let records = self.records.read().await;
        Ok(records.values().find(|c| c.actor.email() == email).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryRevocationLedger {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationLedger for InMemoryRevocationLedger {
    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .await
            .entry(token_digest(token))
            .or_insert_with(Utc::now);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.entries.read().await.contains_key(&token_digest(token)))
    }

    async fn prune_revoked_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, revoked_at| *revoked_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}
