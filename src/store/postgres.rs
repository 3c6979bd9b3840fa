/// Postgres store backend
///
/// Tables are created by `migrations/`. Emails carry a unique index per table
/// and revoked tokens are keyed by their digest, so the database enforces both
/// invariants even when application-level checks race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::revocation::{token_digest, RevocationLedger};
use super::ActorRepository;
use crate::domain::{
    Captain, CaptainStatus, Credentials, FullName, NewCaptain, NewUser, User, Vehicle, VehicleType,
};
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

type UserRow = (Uuid, String, Option<String>, String, Option<String>, DateTime<Utc>);

const USER_COLUMNS: &str = "id, firstname, lastname, email, socket_id, created_at";

fn user_from_row(row: UserRow) -> User {
    let (id, firstname, lastname, email, socket_id, created_at) = row;
    User {
        id,
        fullname: FullName {
            firstname,
            lastname,
        },
        email,
        socket_id,
        created_at,
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActorRepository<User> for PgUserRepository {
    async fn insert(&self, draft: NewUser, password_hash: String) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, firstname, lastname, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.fullname.firstname)
        .bind(&draft.fullname.lastname)
        .bind(&draft.email)
        .bind(&password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credentials<User>>, AppError> {
        let row = sqlx::query_as::<_, (Uuid, String, Option<String>, String, Option<String>, DateTime<Utc>, String)>(
            &format!(
                "SELECT {}, password_hash FROM users WHERE email = $1",
                USER_COLUMNS
            ),
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, firstname, lastname, email, socket_id, created_at, password_hash)| {
            Credentials {
                actor: user_from_row((id, firstname, lastname, email, socket_id, created_at)),
                password_hash,
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// Captains
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct CaptainRow {
    id: Uuid,
    firstname: String,
    lastname: Option<String>,
    email: String,
    socket_id: Option<String>,
    status: String,
    vehicle_color: String,
    vehicle_plate: String,
    vehicle_capacity: i32,
    vehicle_type: String,
    created_at: DateTime<Utc>,
    /// Only selected on the login path.
    #[sqlx(default)]
    password_hash: Option<String>,
}

const CAPTAIN_COLUMNS: &str = "id, firstname, lastname, email, socket_id, status, \
     vehicle_color, vehicle_plate, vehicle_capacity, vehicle_type, created_at";

impl TryFrom<CaptainRow> for Captain {
    type Error = AppError;

    fn try_from(row: CaptainRow) -> Result<Self, Self::Error> {
        let vehicle_type = row.vehicle_type.parse::<VehicleType>().map_err(|_| {
            AppError::Internal(format!(
                "Unknown vehicle type '{}' stored for captain {}",
                row.vehicle_type, row.id
            ))
        })?;

        Ok(Captain {
            id: row.id,
            fullname: FullName {
                firstname: row.firstname,
                lastname: row.lastname,
            },
            email: row.email,
            status: CaptainStatus::parse(&row.status),
            vehicle: Vehicle {
                color: row.vehicle_color,
                plate: row.vehicle_plate,
                capacity: row.vehicle_capacity,
                vehicle_type,
            },
            socket_id: row.socket_id,
            created_at: row.created_at,
        })
    }
}

pub struct PgCaptainRepository {
    pool: PgPool,
}

impl PgCaptainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActorRepository<Captain> for PgCaptainRepository {
    async fn insert(&self, draft: NewCaptain, password_hash: String) -> Result<Captain, AppError> {
        let row = sqlx::query_as::<_, CaptainRow>(&format!(
            r#"
            INSERT INTO captains (
                id, firstname, lastname, email, password_hash, status,
                vehicle_color, vehicle_plate, vehicle_capacity, vehicle_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            CAPTAIN_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.fullname.firstname)
        .bind(&draft.fullname.lastname)
        .bind(&draft.email)
        .bind(&password_hash)
        .bind(CaptainStatus::default().as_str())
        .bind(&draft.vehicle.color)
        .bind(&draft.vehicle.plate)
        .bind(draft.vehicle.capacity)
        .bind(draft.vehicle.vehicle_type.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Captain::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Captain>, AppError> {
        let row = sqlx::query_as::<_, CaptainRow>(&format!(
            "SELECT {} FROM captains WHERE id = $1",
            CAPTAIN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Captain::try_from).transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM captains WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credentials<Captain>>, AppError> {
        let row = sqlx::query_as::<_, CaptainRow>(&format!(
            "SELECT {}, password_hash FROM captains WHERE email = $1",
            CAPTAIN_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(mut row) => {
                let password_hash = row.password_hash.take().ok_or_else(|| {
                    AppError::Internal("Captain row is missing its password hash".to_string())
                })?;
                Ok(Some(Credentials {
                    actor: Captain::try_from(row)?,
                    password_hash,
                }))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Revoked tokens
// ---------------------------------------------------------------------------

pub struct PgRevocationLedger {
    pool: PgPool,
}

impl PgRevocationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationLedger for PgRevocationLedger {
    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO blacklist_tokens (token_hash, revoked_at)
            VALUES ($1, $2)
            ON CONFLICT (token_hash) DO NOTHING
            "#,
        )
        .bind(token_digest(token))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM blacklist_tokens WHERE token_hash = $1)",
        )
        .bind(token_digest(token))
        .fetch_one(&self.pool)
        .await?;

        Ok(revoked)
    }

    async fn prune_revoked_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM blacklist_tokens WHERE revoked_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
