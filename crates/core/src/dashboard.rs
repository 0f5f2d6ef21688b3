//! Staff-facing appointment views, the dashboard and the visit detail view.
//!
//! All functions here are pure queries over records already loaded from the store. "Today" and
//! "this week" are calendar days in the agency's UTC offset.

use crate::checklist::completion_percentage;
use crate::clinical::{BodyMap, Incident, Medication, Note, Seizure};
use crate::constants::DASHBOARD_WINDOW_DAYS;
use crate::geofence::VisitLocationLog;
use crate::ids::{AppointmentId, StaffId};
use crate::lifecycle::duration_minutes;
use crate::model::{Appointment, AppointmentStatus, Client, StaffMember};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

fn assigned_sorted(
    appointments: &[Appointment],
    staff: StaffId,
    keep: impl Fn(&Appointment) -> bool,
) -> Vec<Appointment> {
    let mut out: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.is_assigned_to(staff) && keep(a))
        .cloned()
        .collect();
    out.sort_by_key(|a| a.start_time);
    out
}

/// Appointments starting on today's local date, earliest first.
pub fn todays_appointments(
    appointments: &[Appointment],
    staff: StaffId,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<Appointment> {
    let today = local_date(now, offset);
    assigned_sorted(appointments, staff, |a| {
        local_date(a.start_time, offset) == today
    })
}

/// Appointments starting at or after `now`, earliest first, optionally bounded by `until`.
pub fn upcoming_appointments(
    appointments: &[Appointment],
    staff: StaffId,
    now: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
) -> Vec<Appointment> {
    assigned_sorted(appointments, staff, |a| {
        a.start_time >= now && until.map_or(true, |until| a.start_time <= until)
    })
}

pub fn in_progress_appointments(appointments: &[Appointment], staff: StaffId) -> Vec<Appointment> {
    assigned_sorted(appointments, staff, |a| {
        a.status == AppointmentStatus::InProgress
    })
}

/// Appointments starting in the current Monday to Sunday week, earliest first.
pub fn week_appointments(
    appointments: &[Appointment],
    staff: StaffId,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<Appointment> {
    let today = local_date(now, offset);
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let sunday = monday + Duration::days(6);
    assigned_sorted(appointments, staff, |a| {
        let day = local_date(a.start_time, offset);
        monday <= day && day <= sunday
    })
}

/// Incidents on `own_appointments` that occurred at or after `since`, newest first.
pub fn recent_incidents(
    incidents: &[Incident],
    own_appointments: &HashSet<AppointmentId>,
    since: DateTime<Utc>,
) -> Vec<Incident> {
    let mut out: Vec<Incident> = incidents
        .iter()
        .filter(|i| own_appointments.contains(&i.appointment) && i.time >= since)
        .cloned()
        .collect();
    out.sort_by(|a, b| b.time.cmp(&a.time));
    out
}

/// Seizures on `own_appointments` that started at or after `since`, newest first.
pub fn recent_seizures(
    seizures: &[Seizure],
    own_appointments: &HashSet<AppointmentId>,
    since: DateTime<Utc>,
) -> Vec<Seizure> {
    let mut out: Vec<Seizure> = seizures
        .iter()
        .filter(|s| own_appointments.contains(&s.appointment) && s.start_time >= since)
        .cloned()
        .collect();
    out.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    out
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub today_count: usize,
    pub in_progress_count: usize,
    pub upcoming_count: usize,
    pub recent_incidents_count: usize,
    pub recent_seizures_count: usize,
}

/// Everything a staff member sees on opening the mobile app.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Dashboard {
    pub staff: StaffMember,
    pub today_appointments: Vec<Appointment>,
    pub in_progress_appointments: Vec<Appointment>,
    /// Appointments in the next seven days.
    pub upcoming_appointments: Vec<Appointment>,
    /// Incidents from the last seven days.
    pub recent_incidents: Vec<Incident>,
    /// Seizures from the last seven days.
    pub recent_seizures: Vec<Seizure>,
    pub stats: DashboardStats,
}

impl Dashboard {
    pub fn build(
        staff: StaffMember,
        appointments: &[Appointment],
        incidents: &[Incident],
        seizures: &[Seizure],
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Self {
        let window = Duration::days(DASHBOARD_WINDOW_DAYS);
        let own: HashSet<AppointmentId> = appointments
            .iter()
            .filter(|a| a.is_assigned_to(staff.id))
            .map(|a| a.id)
            .collect();

        let today_appointments = todays_appointments(appointments, staff.id, now, offset);
        let in_progress_appointments = in_progress_appointments(appointments, staff.id);
        let upcoming_appointments =
            upcoming_appointments(appointments, staff.id, now, Some(now + window));
        let recent_incidents = recent_incidents(incidents, &own, now - window);
        let recent_seizures = recent_seizures(seizures, &own, now - window);

        let stats = DashboardStats {
            today_count: today_appointments.len(),
            in_progress_count: in_progress_appointments.len(),
            upcoming_count: upcoming_appointments.len(),
            recent_incidents_count: recent_incidents.len(),
            recent_seizures_count: recent_seizures.len(),
        };

        Self {
            staff,
            today_appointments,
            in_progress_appointments,
            upcoming_appointments,
            recent_incidents,
            recent_seizures,
            stats,
        }
    }
}

/// A single visit with its client and every record documented during it.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub client: Client,
    pub completion_percentage: f64,
    pub duration_minutes: Option<i64>,
    pub seizures: Vec<Seizure>,
    pub incidents: Vec<Incident>,
    pub medications: Vec<Medication>,
    pub body_maps: Vec<BodyMap>,
    pub location_logs: Vec<VisitLocationLog>,
    /// Oldest first.
    pub notes: Vec<Note>,
}

impl AppointmentDetail {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        appointment: Appointment,
        client: Client,
        seizures: Vec<Seizure>,
        incidents: Vec<Incident>,
        medications: Vec<Medication>,
        body_maps: Vec<BodyMap>,
        location_logs: Vec<VisitLocationLog>,
        notes: Vec<Note>,
    ) -> Self {
        let completion_percentage =
            completion_percentage(&client.care_checklist, &appointment.checklist_items);
        let duration_minutes = duration_minutes(&appointment);
        Self {
            appointment,
            client,
            completion_percentage,
            duration_minutes,
            seizures,
            incidents,
            medications,
            body_maps,
            location_logs,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ClientId;
    use crate::model::StaffRole;
    use crate::NonEmptyText;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    // Wednesday.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 11, 8, 0, 0).unwrap()
    }

    fn appt(staff: StaffId, start: DateTime<Utc>) -> Appointment {
        Appointment {
            id: AppointmentId::new(),
            title: NonEmptyText::new("Visit").unwrap(),
            description: None,
            client: ClientId::new(),
            assigned_staff: staff,
            start_time: start,
            end_time: start + Duration::hours(1),
            status: AppointmentStatus::Scheduled,
            recurrence: None,
            actual_start_time: None,
            actual_end_time: None,
            checklist_items: Default::default(),
        }
    }

    fn staff_member() -> StaffMember {
        StaffMember {
            id: StaffId::new(),
            first_name: NonEmptyText::new("Grace").unwrap(),
            last_name: NonEmptyText::new("Hopper").unwrap(),
            role: StaffRole::Nurse,
            is_staff_member: true,
        }
    }

    fn seizure(appointment: AppointmentId, start: DateTime<Utc>) -> Seizure {
        Seizure {
            id: Default::default(),
            appointment,
            start_time: start,
            end_time: None,
        }
    }

    #[test]
    fn today_only_includes_own_appointments_in_order() {
        let staff = StaffId::new();
        let later = appt(staff, now() + Duration::hours(6));
        let earlier = appt(staff, now() - Duration::hours(1));
        let tomorrow = appt(staff, now() + Duration::days(1));
        let other = appt(StaffId::new(), now());
        let all = vec![later.clone(), tomorrow, other, earlier.clone()];

        let today = todays_appointments(&all, staff, now(), utc());
        assert_eq!(
            today.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![earlier.id, later.id]
        );
    }

    #[test]
    fn upcoming_excludes_past_and_respects_bound() {
        let staff = StaffId::new();
        let past = appt(staff, now() - Duration::minutes(1));
        let soon = appt(staff, now() + Duration::days(2));
        let far = appt(staff, now() + Duration::days(20));
        let all = vec![far.clone(), past, soon.clone()];

        let unbounded = upcoming_appointments(&all, staff, now(), None);
        assert_eq!(unbounded.len(), 2);
        assert_eq!(unbounded[0].id, soon.id);

        let bounded = upcoming_appointments(&all, staff, now(), Some(now() + Duration::days(7)));
        assert_eq!(bounded.len(), 1);
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        let staff = StaffId::new();
        let monday = appt(staff, Utc.with_ymd_and_hms(2026, 3, 9, 9, 0, 0).unwrap());
        let sunday = appt(staff, Utc.with_ymd_and_hms(2026, 3, 15, 23, 0, 0).unwrap());
        let prev_sunday = appt(staff, Utc.with_ymd_and_hms(2026, 3, 8, 9, 0, 0).unwrap());
        let next_monday = appt(staff, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap());
        let all = vec![sunday.clone(), prev_sunday, next_monday, monday.clone()];

        let week = week_appointments(&all, staff, now(), utc());
        assert_eq!(
            week.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![monday.id, sunday.id]
        );
    }

    #[test]
    fn in_progress_filters_by_status() {
        let staff = StaffId::new();
        let mut running = appt(staff, now());
        running.status = AppointmentStatus::InProgress;
        let all = vec![running.clone(), appt(staff, now())];
        assert_eq!(in_progress_appointments(&all, staff), vec![running]);
    }

    #[test]
    fn recent_seizures_newest_first_and_own_only() {
        let a = AppointmentId::new();
        let own: HashSet<AppointmentId> = [a].into_iter().collect();
        let old = seizure(a, now() - Duration::days(10));
        let newer = seizure(a, now() - Duration::days(1));
        let newest = seizure(a, now() - Duration::hours(1));
        let foreign = seizure(AppointmentId::new(), now());

        let recent = recent_seizures(
            &[old, newer.clone(), foreign, newest.clone()],
            &own,
            now() - Duration::days(7),
        );
        assert_eq!(recent, vec![newest, newer]);
    }

    #[test]
    fn dashboard_counts_match_lists() {
        let staff = staff_member();
        let mut running = appt(staff.id, now() - Duration::hours(1));
        running.status = AppointmentStatus::InProgress;
        let tomorrow = appt(staff.id, now() + Duration::days(1));
        let next_month = appt(staff.id, now() + Duration::days(30));
        let appointments = vec![running.clone(), tomorrow, next_month];
        let seizures = vec![seizure(running.id, now() - Duration::minutes(30))];

        let dashboard = Dashboard::build(staff, &appointments, &[], &seizures, now(), utc());
        assert_eq!(
            dashboard.stats,
            DashboardStats {
                today_count: 1,
                in_progress_count: 1,
                upcoming_count: 1,
                recent_incidents_count: 0,
                recent_seizures_count: 1,
            }
        );
    }
}
