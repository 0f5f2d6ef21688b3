//! Visit lifecycle.
//!
//! An appointment moves `scheduled -> in_progress -> completed` through [`start_visit`] and
//! [`end_visit`], or `scheduled -> cancelled` through [`cancel_visit`]. Each operation checks its
//! preconditions against the record it is handed and mutates it only when every check passes, so
//! callers can re-run it against the freshest stored copy before committing.

use crate::constants::SECONDS_PER_MINUTE;
use crate::error::{CareError, CareResult};
use crate::model::{Appointment, AppointmentStatus};
use chrono::{DateTime, FixedOffset, Utc};

/// Whole minutes between two instants, floor of elapsed seconds / 60.
pub(crate) fn elapsed_whole_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().div_euclid(SECONDS_PER_MINUTE)
}

fn transition(appointment: &Appointment, to: AppointmentStatus) -> CareResult<()> {
    if !appointment.status.can_transition_to(to) {
        return Err(CareError::InvalidTransition {
            from: appointment.status,
            to,
        });
    }
    Ok(())
}

/// Starts a visit.
///
/// Dates are compared in the agency's UTC offset.
///
/// # Errors
///
/// - [`CareError::NotToday`] if `now` is not on the scheduled start date
/// - [`CareError::AlreadyStarted`] if the visit already has an actual start
/// - [`CareError::InvalidTransition`] if the appointment is not `scheduled` (for example cancelled)
pub fn start_visit(
    appointment: &mut Appointment,
    now: DateTime<Utc>,
    agency_offset: FixedOffset,
) -> CareResult<()> {
    let today = now.with_timezone(&agency_offset).date_naive();
    let scheduled = appointment
        .start_time
        .with_timezone(&agency_offset)
        .date_naive();
    if today != scheduled {
        return Err(CareError::NotToday { scheduled, today });
    }

    if let Some(started_at) = appointment.actual_start_time {
        return Err(CareError::AlreadyStarted { started_at });
    }

    transition(appointment, AppointmentStatus::InProgress)?;

    appointment.actual_start_time = Some(now);
    appointment.status = AppointmentStatus::InProgress;
    Ok(())
}

/// Ends a started visit.
///
/// # Errors
///
/// - [`CareError::NotStarted`] if the visit has no actual start
/// - [`CareError::AlreadyEnded`] if the visit already has an actual end
/// - [`CareError::InvalidWindow`] if `now` is earlier than the actual start
/// - [`CareError::InvalidTransition`] if the appointment is not `in_progress`
pub fn end_visit(appointment: &mut Appointment, now: DateTime<Utc>) -> CareResult<()> {
    let Some(started_at) = appointment.actual_start_time else {
        return Err(CareError::NotStarted);
    };

    if let Some(ended_at) = appointment.actual_end_time {
        return Err(CareError::AlreadyEnded { ended_at });
    }

    if now < started_at {
        return Err(CareError::InvalidWindow {
            start: started_at,
            end: now,
        });
    }

    transition(appointment, AppointmentStatus::Completed)?;

    appointment.actual_end_time = Some(now);
    appointment.status = AppointmentStatus::Completed;
    Ok(())
}

/// Cancels a visit that has not started.
///
/// # Errors
///
/// Returns [`CareError::InvalidTransition`] unless the appointment is `scheduled`.
pub fn cancel_visit(appointment: &mut Appointment) -> CareResult<()> {
    transition(appointment, AppointmentStatus::Cancelled)?;
    appointment.status = AppointmentStatus::Cancelled;
    Ok(())
}

/// Billable duration of a finished visit in whole minutes.
///
/// The effective end is the earlier of the actual and scheduled ends; the effective start is the
/// actual start, falling back to the scheduled start. Returns `None` until the visit has an actual
/// end. A visit that started after its scheduled end counts as zero minutes.
pub fn duration_minutes(appointment: &Appointment) -> Option<i64> {
    let actual_end = appointment.actual_end_time?;
    let end = actual_end.min(appointment.end_time);
    let start = appointment
        .actual_start_time
        .unwrap_or(appointment.start_time);

    Some(elapsed_whole_minutes(start, end).max(0))
}
