//! Scheduling conflict checks and recurring appointment generation.
//!
//! Appointment windows are half-open: `[start, end)`. Two windows conflict iff
//! `s1 < e2 && s2 < e1`, so back-to-back visits that only share a boundary do not conflict.

use crate::config::ConflictPolicy;
use crate::error::{CareError, CareResult};
use crate::ids::{AppointmentId, ClientId, StaffId};
use crate::model::{Appointment, AppointmentStatus, Recurrence};
use crate::validation::validate_window;
use crate::NonEmptyText;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Half-open interval overlap test.
pub fn windows_overlap(
    (s1, e1): (DateTime<Utc>, DateTime<Utc>),
    (s2, e2): (DateTime<Utc>, DateTime<Utc>),
) -> bool {
    s1 < e2 && s2 < e1
}

/// Returns the ids of `existing` appointments that overlap the candidate window.
///
/// Only appointments assigned to `staff` are considered. The candidate's own prior record
/// (`candidate_id`) and cancelled appointments are never counted.
///
/// # Errors
///
/// Returns [`CareError::InvalidWindow`] if `end <= start`.
pub fn find_conflicts(
    candidate_id: Option<AppointmentId>,
    staff: StaffId,
    window: (DateTime<Utc>, DateTime<Utc>),
    existing: &[Appointment],
) -> CareResult<Vec<AppointmentId>> {
    validate_window(window.0, window.1)?;

    Ok(existing
        .iter()
        .filter(|other| other.assigned_staff == staff)
        .filter(|other| Some(other.id) != candidate_id)
        .filter(|other| other.status != AppointmentStatus::Cancelled)
        .filter(|other| windows_overlap(window, other.window()))
        .map(|other| other.id)
        .collect())
}

/// Whether `candidate` would double-book its assigned staff member.
///
/// # Errors
///
/// Returns [`CareError::InvalidWindow`] if the candidate's end is not after its start.
pub fn has_conflict(candidate: &Appointment, existing: &[Appointment]) -> CareResult<bool> {
    find_conflicts(
        Some(candidate.id),
        candidate.assigned_staff,
        candidate.window(),
        existing,
    )
    .map(|conflicts| !conflicts.is_empty())
}

/// Applies the configured conflict policy.
///
/// Under [`ConflictPolicy::Block`] any conflict is an error; under [`ConflictPolicy::Warn`] the
/// conflicts are handed back for the caller to surface.
///
/// # Errors
///
/// Returns [`CareError::ConflictDetected`] when blocking and `conflicts` is non-empty.
pub fn apply_conflict_policy(
    policy: ConflictPolicy,
    conflicts: Vec<AppointmentId>,
) -> CareResult<Vec<AppointmentId>> {
    match policy {
        ConflictPolicy::Block if !conflicts.is_empty() => Err(CareError::ConflictDetected {
            conflicting: conflicts,
        }),
        _ => Ok(conflicts),
    }
}

/// Request to put a new appointment in the diary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleRequest {
    #[schema(value_type = String)]
    pub title: NonEmptyText,
    #[serde(default)]
    pub description: Option<String>,
    pub client: ClientId,
    pub assigned_staff: StaffId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, rename = "frequency")]
    pub recurrence: Option<Recurrence>,
}

impl ScheduleRequest {
    /// Checks the requested window for a new appointment.
    ///
    /// # Errors
    ///
    /// - [`CareError::StartNotInFuture`] if the start is not after `now`
    /// - [`CareError::InvalidWindow`] if the end is not after the start
    pub fn validate(&self, now: DateTime<Utc>) -> CareResult<()> {
        if self.start_time <= now {
            return Err(CareError::StartNotInFuture {
                start: self.start_time,
            });
        }
        validate_window(self.start_time, self.end_time)
    }

    pub fn into_appointment(self) -> Appointment {
        Appointment {
            id: AppointmentId::new(),
            title: self.title,
            description: self.description,
            client: self.client,
            assigned_staff: self.assigned_staff,
            start_time: self.start_time,
            end_time: self.end_time,
            status: AppointmentStatus::Scheduled,
            recurrence: self.recurrence,
            actual_start_time: None,
            actual_end_time: None,
            checklist_items: Default::default(),
        }
    }
}

/// New window for an existing appointment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RescheduleRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Result of scheduling: the stored appointments (first the requested one, then any generated
/// occurrences) and the conflicts that were let through under [`ConflictPolicy::Warn`].
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ScheduleOutcome {
    pub appointments: Vec<Appointment>,
    pub conflict_warnings: Vec<AppointmentId>,
}

/// Generates the follow-on occurrences of a recurring appointment.
///
/// Occurrence `k` (1-based) shifts both ends of the window by `k` recurrence intervals. Title,
/// description, client, assigned staff, status and recurrence are copied; every occurrence gets
/// a fresh id and an empty checklist. Nothing is generated for a non-recurring or completed
/// appointment.
///
/// # Errors
///
/// Returns [`CareError::InvalidInput`] if an occurrence would fall outside the representable
/// date range.
pub fn generate_recurrences(
    appointment: &Appointment,
    occurrences: u32,
) -> CareResult<Vec<Appointment>> {
    let Some(recurrence) = appointment.recurrence else {
        return Ok(Vec::new());
    };
    if appointment.status == AppointmentStatus::Completed {
        return Ok(Vec::new());
    }

    let interval = recurrence.interval();
    let out_of_range = |k: u32| {
        CareError::InvalidInput(format!(
            "occurrence {k} of a recurring appointment starting {} is out of range",
            appointment.start_time
        ))
    };

    (1..=occurrences)
        .map(|k| -> CareResult<Appointment> {
            let shift = i32::try_from(k)
                .ok()
                .and_then(|k| interval.checked_mul(k))
                .ok_or_else(|| out_of_range(k))?;
            let start_time = appointment
                .start_time
                .checked_add_signed(shift)
                .ok_or_else(|| out_of_range(k))?;
            let end_time = appointment
                .end_time
                .checked_add_signed(shift)
                .ok_or_else(|| out_of_range(k))?;
            Ok(Appointment {
                id: AppointmentId::new(),
                title: appointment.title.clone(),
                description: appointment.description.clone(),
                client: appointment.client,
                assigned_staff: appointment.assigned_staff,
                start_time,
                end_time,
                status: appointment.status,
                recurrence: appointment.recurrence,
                actual_start_time: None,
                actual_end_time: None,
                checklist_items: Default::default(),
            })
        })
        .collect()
}
