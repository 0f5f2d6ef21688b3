//! Staff members and the acting user passed into every operation.

use crate::ids::StaffId;
use crate::NonEmptyText;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    #[default]
    Nurse,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StaffMember {
    #[serde(default)]
    pub id: StaffId,
    #[schema(value_type = String)]
    pub first_name: NonEmptyText,
    #[schema(value_type = String)]
    pub last_name: NonEmptyText,
    #[serde(default)]
    pub role: StaffRole,
    #[serde(default = "default_true")]
    pub is_staff_member: bool,
}

fn default_true() -> bool {
    true
}

impl StaffMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The actor this staff member acts as.
    pub fn actor(&self) -> Actor {
        Actor {
            staff_id: self.id,
            role: self.role,
            is_staff_member: self.is_staff_member,
        }
    }
}

/// The authenticated staff member on whose behalf an operation runs.
///
/// Core operations never read ambient session state; the request layer resolves the actor and
/// passes it in explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub staff_id: StaffId,
    pub role: StaffRole,
    pub is_staff_member: bool,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin
    }
}
