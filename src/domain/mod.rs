/// Domain module
///
/// Riders ("users") and drivers ("captains") plus the traits the auth layer
/// uses to treat both roles uniformly.

mod captain;
mod role;
mod user;

pub use captain::{Captain, CaptainStatus, NewCaptain, Vehicle, VehicleType};
pub use role::Role;
pub use user::{FullName, NewUser, User};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Fields a not-yet-persisted actor must expose to the store.
pub trait ActorDraft: Clone + Send + Sync + 'static {
    fn email(&self) -> &str;
}

/// An account that can register, log in and hold a session.
///
/// Implementors never carry the password hash, so serializing an actor can't
/// leak it. The hash only travels inside [`Credentials`].
pub trait Actor: Serialize + Clone + Send + Sync + 'static {
    type Draft: ActorDraft;

    const ROLE: Role;

    fn id(&self) -> Uuid;

    fn email(&self) -> &str;

    fn from_draft(id: Uuid, draft: Self::Draft, created_at: DateTime<Utc>) -> Self;
}

/// An actor together with its stored password hash. Only the login path asks
/// the store for this.
#[derive(Debug, Clone)]
pub struct Credentials<A> {
    pub actor: A,
    pub password_hash: String,
}
