//! Appointments (scheduled visits) and their status machine.

use crate::constants::MONTHLY_RECURRENCE_DAYS;
use crate::ids::{AppointmentId, ClientId, StaffId};
use crate::model::ChecklistItem;
use crate::NonEmptyText;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use utoipa::ToSchema;

/// Visit status.
///
/// Transitions are monotonic: `scheduled -> in_progress -> completed`, and
/// `scheduled -> cancelled`. Nothing leaves `completed` or `cancelled`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress) | (InProgress, Completed) | (Scheduled, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a scheduled appointment repeats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Offset between consecutive occurrences. Months are a fixed 30 days.
    pub fn interval(self) -> Duration {
        match self {
            Recurrence::Daily => Duration::days(1),
            Recurrence::Weekly => Duration::weeks(1),
            Recurrence::Monthly => Duration::days(MONTHLY_RECURRENCE_DAYS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    #[serde(default)]
    pub id: AppointmentId,
    #[schema(value_type = String)]
    pub title: NonEmptyText,
    #[serde(default)]
    pub description: Option<String>,
    pub client: ClientId,
    pub assigned_staff: StaffId,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default, rename = "frequency")]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub actual_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Completed subset of the client's care checklist.
    #[serde(default)]
    pub checklist_items: BTreeSet<ChecklistItem>,
}

impl Appointment {
    /// Half-open scheduled window `[start_time, end_time)`.
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_time, self.end_time)
    }

    pub fn is_assigned_to(&self, staff: StaffId) -> bool {
        self.assigned_staff == staff
    }
}
