use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Actor, ActorDraft, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullName {
    pub firstname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
}

/// A rider account as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub fullname: FullName,
    pub email: String,
    #[serde(rename = "socketId", skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Validated registration data for a rider.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: FullName,
    pub email: String,
}

impl ActorDraft for NewUser {
    fn email(&self) -> &str {
        &self.email
    }
}

impl Actor for User {
    type Draft = NewUser;

    const ROLE: Role = Role::User;

    fn id(&self) -> Uuid {
        self.id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn from_draft(id: Uuid, draft: NewUser, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            fullname: draft.fullname,
            email: draft.email,
            socket_id: None,
            created_at,
        }
    }
}
