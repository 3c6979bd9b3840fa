use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Actor, ActorDraft, FullName, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Auto,
}

impl VehicleType {
    pub const ALLOWED: &'static [&'static str] = &["car", "motorcycle", "auto"];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Auto => "auto",
        }
    }
}

impl FromStr for VehicleType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(VehicleType::Car),
            "motorcycle" => Ok(VehicleType::Motorcycle),
            "auto" => Ok(VehicleType::Auto),
            _ => Err(()),
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub color: String,
    pub plate: String,
    pub capacity: i32,
    #[serde(rename = "vehicleType")]
    pub vehicle_type: VehicleType,
}

/// Availability of a driver. New captains start inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptainStatus {
    Active,
    #[default]
    Inactive,
}

impl CaptainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptainStatus::Active => "active",
            CaptainStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "active" {
            CaptainStatus::Active
        } else {
            CaptainStatus::Inactive
        }
    }
}

/// A driver account as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Captain {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub fullname: FullName,
    pub email: String,
    pub status: CaptainStatus,
    pub vehicle: Vehicle,
    #[serde(rename = "socketId", skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Validated registration data for a driver.
#[derive(Debug, Clone)]
pub struct NewCaptain {
    pub fullname: FullName,
    pub email: String,
    pub vehicle: Vehicle,
}

impl ActorDraft for NewCaptain {
    fn email(&self) -> &str {
        &self.email
    }
}

impl Actor for Captain {
    type Draft = NewCaptain;

    const ROLE: Role = Role::Captain;

    fn id(&self) -> Uuid {
        self.id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn from_draft(id: Uuid, draft: NewCaptain, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            fullname: draft.fullname,
            email: draft.email,
            status: CaptainStatus::default(),
            vehicle: draft.vehicle,
            socket_id: None,
            created_at,
        }
    }
}
