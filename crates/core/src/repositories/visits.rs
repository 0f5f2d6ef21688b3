//! Visit operations on behalf of a staff member.
//!
//! [`VisitService`] is the single entry point the API layers call. Each operation:
//! - resolves what the acting staff member may do (assignment, staff membership, admin role)
//! - runs the pure rules from the domain modules against the freshest stored record
//! - commits the result to the [`CareStore`] under its write lock
//!
//! The service reads the time from a [`Clock`] so tests can pin "now".

use crate::checklist;
use crate::clinical::{BodyMap, Incident, Medication, Note, NoteUpdate, Seizure};
use crate::config::CoreConfig;
use crate::constants::{RECENT_INCIDENT_DAYS, UPCOMING_LIMIT};
use crate::dashboard::{self, AppointmentDetail, Dashboard};
use crate::error::{CareError, CareResult};
use crate::geofence::{LocationReport, VisitLocationLog};
use crate::ids::{
    AppointmentId, BodyMapId, ClientId, IncidentId, MedicationId, NoteId, SeizureId, StaffId,
};
use crate::invoicing::{self, InvoiceSummary};
use crate::lifecycle;
use crate::model::{Actor, Appointment, AppointmentStatus, ChecklistItem};
use crate::repositories::store::{CareStore, Records};
use crate::scheduling::{
    apply_conflict_policy, find_conflicts, generate_recurrences, RescheduleRequest,
    ScheduleOutcome, ScheduleRequest,
};
use crate::sync::{apply_each, AppointmentSync, SyncKind, SyncReport, SyncRequest};
use crate::validation::Validate;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// CLOCK
// ============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// AUTHORIZATION
// ============================================================================

fn ensure_staff(actor: &Actor) -> CareResult<()> {
    if !actor.is_staff_member {
        return Err(CareError::NotStaffMember(actor.staff_id));
    }
    Ok(())
}

fn ensure_assigned(actor: &Actor, appointment: &Appointment) -> CareResult<()> {
    ensure_staff(actor)?;
    if !appointment.is_assigned_to(actor.staff_id) {
        return Err(CareError::NotAssigned {
            appointment: appointment.id,
            staff: actor.staff_id,
        });
    }
    Ok(())
}

fn ensure_admin(actor: &Actor, action: &'static str) -> CareResult<()> {
    ensure_staff(actor)?;
    if !actor.is_admin() {
        return Err(CareError::NotPermitted {
            staff: actor.staff_id,
            action,
        });
    }
    Ok(())
}

/// Notes may be changed by the staff member who wrote them while they are still assigned to the
/// visit, or by an admin.
fn ensure_note_editor(records: &Records, actor: &Actor, note: &Note) -> CareResult<()> {
    ensure_staff(actor)?;
    if actor.is_admin() {
        return Ok(());
    }
    assigned_appointment(records, actor, note.appointment)?;
    if note.uploaded_by != Some(actor.staff_id) {
        return Err(CareError::NotPermitted {
            staff: actor.staff_id,
            action: "change another staff member's note",
        });
    }
    Ok(())
}

fn assigned_appointment<'r>(
    records: &'r Records,
    actor: &Actor,
    id: AppointmentId,
) -> CareResult<&'r Appointment> {
    let appointment = records.appointment(id)?;
    ensure_assigned(actor, appointment)?;
    Ok(appointment)
}

// ============================================================================
// VISIT SERVICE
// ============================================================================

#[derive(Clone, Debug)]
pub struct VisitService {
    cfg: Arc<CoreConfig>,
    store: Arc<CareStore>,
    clock: Arc<dyn Clock>,
}

impl VisitService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<CareStore>) -> Self {
        Self::with_clock(cfg, store, Arc::new(SystemClock))
    }

    pub fn with_clock(cfg: Arc<CoreConfig>, store: Arc<CareStore>, clock: Arc<dyn Clock>) -> Self {
        Self { cfg, store, clock }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn store(&self) -> &CareStore {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resolves the acting staff member.
    ///
    /// # Errors
    ///
    /// - [`CareError::StaffNotFound`] if no staff member has this id
    /// - [`CareError::NotStaffMember`] if the user is not flagged as a staff member
    pub fn resolve_actor(&self, staff_id: StaffId) -> CareResult<Actor> {
        let actor = self.store.staff_member(staff_id)?.actor();
        ensure_staff(&actor)?;
        Ok(actor)
    }

    // ------------------------------------------------------------------------
    // Visit lifecycle
    // ------------------------------------------------------------------------

    /// Starts an assigned visit.
    ///
    /// # Errors
    ///
    /// Returns the lifecycle errors of [`lifecycle::start_visit`], plus
    /// [`CareError::AppointmentNotFound`] and [`CareError::NotAssigned`].
    pub fn start_visit(&self, actor: &Actor, id: AppointmentId) -> CareResult<Appointment> {
        let now = self.now();
        let offset = self.cfg.agency_offset();
        let (appointment, ()) = self.store.update_appointment(id, |a| {
            ensure_assigned(actor, a)?;
            lifecycle::start_visit(a, now, offset)
        })?;
        tracing::info!(appointment = %id, staff = %actor.staff_id, "visit started");
        Ok(appointment)
    }

    /// Ends an assigned visit.
    ///
    /// # Errors
    ///
    /// Returns the lifecycle errors of [`lifecycle::end_visit`], plus
    /// [`CareError::AppointmentNotFound`] and [`CareError::NotAssigned`].
    pub fn end_visit(&self, actor: &Actor, id: AppointmentId) -> CareResult<Appointment> {
        let now = self.now();
        let (appointment, ()) = self.store.update_appointment(id, |a| {
            ensure_assigned(actor, a)?;
            lifecycle::end_visit(a, now)
        })?;
        tracing::info!(
            appointment = %id,
            staff = %actor.staff_id,
            duration_minutes = ?lifecycle::duration_minutes(&appointment),
            "visit ended"
        );
        Ok(appointment)
    }

    /// Replaces the completed checklist items of an assigned visit.
    pub fn update_checklist(
        &self,
        actor: &Actor,
        id: AppointmentId,
        items: Vec<ChecklistItem>,
    ) -> CareResult<Appointment> {
        let (appointment, ()) = self.store.update_appointment(id, |a| {
            ensure_assigned(actor, a)?;
            checklist::update_checklist(a, items);
            Ok(())
        })?;
        tracing::debug!(appointment = %id, items = appointment.checklist_items.len(), "checklist updated");
        Ok(appointment)
    }

    // ------------------------------------------------------------------------
    // Location logging
    // ------------------------------------------------------------------------

    /// Records the device position for an assigned visit.
    ///
    /// # Errors
    ///
    /// - [`CareError::InvalidCoordinates`] if the position is out of range
    /// - [`CareError::MissingClientLocation`] if the client has no registered coordinates
    pub fn log_location(
        &self,
        actor: &Actor,
        id: AppointmentId,
        report: LocationReport,
    ) -> CareResult<VisitLocationLog> {
        let now = self.now();
        let mut records = self.store.write()?;
        let appointment = assigned_appointment(&records, actor, id)?;
        let client = records.client(appointment.client)?;

        let log = VisitLocationLog::record(id, client, report, now, self.cfg.geofence_radius_m())?;
        if !log.within_geofence {
            tracing::warn!(
                appointment = %id,
                distance_m = log.distance_from_client,
                "location logged outside geofence"
            );
        }
        records.location_logs.push(log.clone());
        Ok(log)
    }

    /// Location logs of an assigned visit, oldest first.
    pub fn location_logs(&self, actor: &Actor, id: AppointmentId) -> CareResult<Vec<VisitLocationLog>> {
        let records = self.store.read()?;
        assigned_appointment(&records, actor, id)?;
        let mut logs: Vec<VisitLocationLog> = records
            .location_logs
            .iter()
            .filter(|l| l.appointment == id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.timestamp);
        Ok(logs)
    }

    // ------------------------------------------------------------------------
    // Clinical records
    // ------------------------------------------------------------------------

    /// Records a seizure episode on an assigned visit.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::Validation`] with every violated rule if the record is invalid.
    pub fn record_seizure(&self, actor: &Actor, mut seizure: Seizure) -> CareResult<Seizure> {
        seizure.ensure_valid()?;
        let mut records = self.store.write()?;
        assigned_appointment(&records, actor, seizure.appointment)?;

        seizure.id = SeizureId::new();
        records.seizures.insert(seizure.id, seizure.clone());
        tracing::info!(seizure = %seizure.id, appointment = %seizure.appointment, "seizure recorded");
        Ok(seizure)
    }

    /// Closes an open seizure episode at the current time.
    ///
    /// # Errors
    ///
    /// - [`CareError::SeizureNotFound`] if the seizure does not exist
    /// - [`CareError::SeizureAlreadyEnded`] if it was already closed
    pub fn end_seizure(&self, actor: &Actor, id: SeizureId) -> CareResult<Seizure> {
        let now = self.now();
        let seizure = self.store.update_seizure(id, |s, records| {
            assigned_appointment(records, actor, s.appointment)?;
            s.end(now)
        })?;
        tracing::info!(seizure = %id, duration_minutes = ?seizure.duration_minutes(), "seizure ended");
        Ok(seizure)
    }

    pub fn record_incident(&self, actor: &Actor, mut incident: Incident) -> CareResult<Incident> {
        incident.ensure_valid()?;
        let mut records = self.store.write()?;
        assigned_appointment(&records, actor, incident.appointment)?;

        incident.id = IncidentId::new();
        records.incidents.push(incident.clone());
        tracing::info!(
            incident = %incident.id,
            appointment = %incident.appointment,
            riddor = incident.incident_notifiable_riddor,
            "incident recorded"
        );
        Ok(incident)
    }

    pub fn record_medication(
        &self,
        actor: &Actor,
        mut medication: Medication,
    ) -> CareResult<Medication> {
        medication.ensure_valid()?;
        let mut records = self.store.write()?;
        assigned_appointment(&records, actor, medication.appointment)?;

        medication.id = MedicationId::new();
        records.medications.push(medication.clone());
        tracing::info!(medication = %medication.id, appointment = %medication.appointment, "medication recorded");
        Ok(medication)
    }

    /// Records a body map; the practitioner is always the acting staff member.
    pub fn record_body_map(&self, actor: &Actor, mut body_map: BodyMap) -> CareResult<BodyMap> {
        body_map.ensure_valid()?;
        let now = self.now();
        let mut records = self.store.write()?;
        assigned_appointment(&records, actor, body_map.appointment)?;

        body_map.id = BodyMapId::new();
        body_map.practitioner = Some(actor.staff_id);
        body_map.date_recorded = Some(now);
        records.body_maps.push(body_map.clone());
        tracing::info!(
            body_map = %body_map.id,
            appointment = %body_map.appointment,
            injuries = body_map.injury_count(),
            serious = body_map.has_serious_injuries(),
            "body map recorded"
        );
        Ok(body_map)
    }

    // ------------------------------------------------------------------------
    // Visit notes
    // ------------------------------------------------------------------------

    /// Leaves a note on an assigned visit, attributed to the acting staff member.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::Validation`] if the note has neither content nor a document.
    pub fn record_note(&self, actor: &Actor, mut note: Note) -> CareResult<Note> {
        note.ensure_valid()?;
        let now = self.now();
        let mut records = self.store.write()?;
        assigned_appointment(&records, actor, note.appointment)?;

        note.id = NoteId::new();
        note.uploaded_by = Some(actor.staff_id);
        note.created_at = Some(now);
        note.updated_at = Some(now);
        records.notes.insert(note.id, note.clone());
        tracing::info!(note = %note.id, appointment = %note.appointment, "note recorded");
        Ok(note)
    }

    /// Replaces the content and document of a note.
    ///
    /// # Errors
    ///
    /// - [`CareError::NoteNotFound`] if the note does not exist
    /// - [`CareError::NotPermitted`] if the actor neither wrote the note nor is an admin
    /// - [`CareError::Validation`] if the edit would leave the note empty
    pub fn update_note(&self, actor: &Actor, id: NoteId, update: NoteUpdate) -> CareResult<Note> {
        let now = self.now();
        let mut records = self.store.write()?;
        let mut note = records.note(id)?.clone();
        ensure_note_editor(&records, actor, &note)?;

        note.apply(update, now);
        note.ensure_valid()?;
        records.notes.insert(id, note.clone());
        tracing::info!(note = %id, staff = %actor.staff_id, "note updated");
        Ok(note)
    }

    /// # Errors
    ///
    /// Same authorization errors as [`VisitService::update_note`].
    pub fn delete_note(&self, actor: &Actor, id: NoteId) -> CareResult<Note> {
        let mut records = self.store.write()?;
        let note = records.note(id)?;
        ensure_note_editor(&records, actor, note)?;

        let note = records.notes.remove(&id).ok_or(CareError::NoteNotFound(id))?;
        tracing::info!(note = %id, staff = %actor.staff_id, "note deleted");
        Ok(note)
    }

    // ------------------------------------------------------------------------
    // Mobile sync
    // ------------------------------------------------------------------------

    /// Applies a batch uploaded by the mobile app.
    ///
    /// Every item goes through the same operation as its single-record counterpart, with the
    /// same assignment and validation rules. Failed items are listed in the report and do not
    /// stop the others.
    ///
    /// # Errors
    ///
    /// - [`CareError::NotStaffMember`] if the actor is not a staff member
    /// - [`CareError::StorePoisoned`] if the store becomes unusable mid-batch
    pub fn sync(&self, actor: &Actor, request: SyncRequest) -> CareResult<SyncReport> {
        ensure_staff(actor)?;
        let mut report = SyncReport::default();

        apply_each(&mut report, SyncKind::Appointment, request.appointments, |a: AppointmentSync| {
            self.update_checklist(actor, a.id, a.checklist_items)
        })?;
        apply_each(&mut report, SyncKind::Seizure, request.seizures, |s: Seizure| {
            self.record_seizure(actor, s)
        })?;
        apply_each(&mut report, SyncKind::Incident, request.incidents, |i: Incident| {
            self.record_incident(actor, i)
        })?;
        apply_each(&mut report, SyncKind::Medication, request.medications, |m: Medication| {
            self.record_medication(actor, m)
        })?;
        apply_each(&mut report, SyncKind::BodyMap, request.body_maps, |b: BodyMap| {
            self.record_body_map(actor, b)
        })?;
        apply_each(&mut report, SyncKind::Note, request.notes, |n: Note| {
            self.record_note(actor, n)
        })?;

        if report.errors.is_empty() {
            tracing::info!(staff = %actor.staff_id, applied = report.applied(), "mobile sync applied");
        } else {
            tracing::warn!(
                staff = %actor.staff_id,
                applied = report.applied(),
                failed = report.errors.len(),
                "mobile sync applied with failures"
            );
        }
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------------

    /// Puts a new appointment, and any recurring occurrences, in the diary.
    ///
    /// Every generated occurrence is conflict-checked too; under the blocking policy a single
    /// conflict rejects the whole batch.
    ///
    /// # Errors
    ///
    /// - [`CareError::NotPermitted`] unless the actor is an admin
    /// - [`CareError::StartNotInFuture`] or [`CareError::InvalidWindow`] for a bad window
    /// - [`CareError::ClientNotFound`] or [`CareError::StaffNotFound`] for unknown references
    /// - [`CareError::ConflictDetected`] when blocking and the staff member is double-booked
    pub fn schedule(&self, actor: &Actor, request: ScheduleRequest) -> CareResult<ScheduleOutcome> {
        ensure_admin(actor, "schedule appointments")?;
        request.validate(self.now())?;

        let appointment = request.into_appointment();
        let mut batch = vec![appointment.clone()];
        batch.extend(generate_recurrences(
            &appointment,
            self.cfg.recurrence_occurrences(),
        )?);

        let mut records = self.store.write()?;
        records.client(appointment.client)?;
        if !records.staff.contains_key(&appointment.assigned_staff) {
            return Err(CareError::StaffNotFound(appointment.assigned_staff));
        }

        let mut existing = records.appointment_list();
        let mut conflicts = Vec::new();
        for candidate in &batch {
            for id in find_conflicts(
                Some(candidate.id),
                candidate.assigned_staff,
                candidate.window(),
                &existing,
            )? {
                if !conflicts.contains(&id) {
                    conflicts.push(id);
                }
            }
            existing.push(candidate.clone());
        }
        let conflict_warnings = apply_conflict_policy(self.cfg.conflict_policy(), conflicts)?;

        for candidate in &batch {
            records.appointments.insert(candidate.id, candidate.clone());
        }
        tracing::info!(
            appointment = %appointment.id,
            occurrences = batch.len(),
            warnings = conflict_warnings.len(),
            "appointment scheduled"
        );

        Ok(ScheduleOutcome {
            appointments: batch,
            conflict_warnings,
        })
    }

    /// Moves a scheduled appointment to a new window.
    ///
    /// # Errors
    ///
    /// - [`CareError::NotPermitted`] unless the actor is an admin
    /// - [`CareError::InvalidTransition`] if the appointment is no longer `scheduled`
    /// - [`CareError::InvalidWindow`] for a bad window
    /// - [`CareError::ConflictDetected`] when blocking and the staff member is double-booked
    pub fn reschedule(
        &self,
        actor: &Actor,
        id: AppointmentId,
        request: RescheduleRequest,
    ) -> CareResult<ScheduleOutcome> {
        ensure_admin(actor, "reschedule appointments")?;
        let policy = self.cfg.conflict_policy();

        let mut records = self.store.write()?;
        let mut candidate = records.appointment(id)?.clone();
        if candidate.status != AppointmentStatus::Scheduled {
            return Err(CareError::InvalidTransition {
                from: candidate.status,
                to: AppointmentStatus::Scheduled,
            });
        }
        candidate.start_time = request.start_time;
        candidate.end_time = request.end_time;

        let existing = records.appointment_list();
        let conflicts = find_conflicts(
            Some(id),
            candidate.assigned_staff,
            candidate.window(),
            &existing,
        )?;
        let conflict_warnings = apply_conflict_policy(policy, conflicts)?;

        records.appointments.insert(id, candidate.clone());
        tracing::info!(appointment = %id, warnings = conflict_warnings.len(), "appointment rescheduled");

        Ok(ScheduleOutcome {
            appointments: vec![candidate],
            conflict_warnings,
        })
    }

    /// Cancels an appointment that has not started.
    pub fn cancel(&self, actor: &Actor, id: AppointmentId) -> CareResult<Appointment> {
        ensure_admin(actor, "cancel appointments")?;
        let (appointment, ()) = self.store.update_appointment(id, lifecycle::cancel_visit)?;
        tracing::info!(appointment = %id, "appointment cancelled");
        Ok(appointment)
    }

    // ------------------------------------------------------------------------
    // Staff queries
    // ------------------------------------------------------------------------

    pub fn appointments_today(&self, actor: &Actor) -> CareResult<Vec<Appointment>> {
        ensure_staff(actor)?;
        let appointments = self.store.appointments()?;
        Ok(dashboard::todays_appointments(
            &appointments,
            actor.staff_id,
            self.now(),
            self.cfg.agency_offset(),
        ))
    }

    /// The next appointments from now, capped at ten.
    pub fn upcoming(&self, actor: &Actor) -> CareResult<Vec<Appointment>> {
        ensure_staff(actor)?;
        let appointments = self.store.appointments()?;
        let mut upcoming =
            dashboard::upcoming_appointments(&appointments, actor.staff_id, self.now(), None);
        upcoming.truncate(UPCOMING_LIMIT);
        Ok(upcoming)
    }

    pub fn in_progress(&self, actor: &Actor) -> CareResult<Vec<Appointment>> {
        ensure_staff(actor)?;
        let appointments = self.store.appointments()?;
        Ok(dashboard::in_progress_appointments(
            &appointments,
            actor.staff_id,
        ))
    }

    pub fn week(&self, actor: &Actor) -> CareResult<Vec<Appointment>> {
        ensure_staff(actor)?;
        let appointments = self.store.appointments()?;
        Ok(dashboard::week_appointments(
            &appointments,
            actor.staff_id,
            self.now(),
            self.cfg.agency_offset(),
        ))
    }

    /// Incidents on the actor's visits from the last 30 days, newest first.
    pub fn recent_incidents(&self, actor: &Actor) -> CareResult<Vec<Incident>> {
        ensure_staff(actor)?;
        let records = self.store.read()?;
        let own: HashSet<AppointmentId> = records
            .appointments
            .values()
            .filter(|a| a.is_assigned_to(actor.staff_id))
            .map(|a| a.id)
            .collect();
        Ok(dashboard::recent_incidents(
            &records.incidents,
            &own,
            self.now() - Duration::days(RECENT_INCIDENT_DAYS),
        ))
    }

    pub fn dashboard(&self, actor: &Actor) -> CareResult<Dashboard> {
        ensure_staff(actor)?;
        let records = self.store.read()?;
        let staff = records
            .staff
            .get(&actor.staff_id)
            .cloned()
            .ok_or(CareError::StaffNotFound(actor.staff_id))?;
        let appointments = records.appointment_list();
        let seizures: Vec<Seizure> = records.seizures.values().cloned().collect();

        Ok(Dashboard::build(
            staff,
            &appointments,
            &records.incidents,
            &seizures,
            self.now(),
            self.cfg.agency_offset(),
        ))
    }

    /// An assigned visit with its client and every record documented during it.
    pub fn appointment_detail(
        &self,
        actor: &Actor,
        id: AppointmentId,
    ) -> CareResult<AppointmentDetail> {
        let records = self.store.read()?;
        let appointment = assigned_appointment(&records, actor, id)?.clone();
        let client = records.client(appointment.client)?.clone();

        let mut seizures: Vec<Seizure> = records
            .seizures
            .values()
            .filter(|s| s.appointment == id)
            .cloned()
            .collect();
        seizures.sort_by_key(|s| s.start_time);
        let incidents = records
            .incidents
            .iter()
            .filter(|i| i.appointment == id)
            .cloned()
            .collect();
        let medications = records
            .medications
            .iter()
            .filter(|m| m.appointment == id)
            .cloned()
            .collect();
        let body_maps = records
            .body_maps
            .iter()
            .filter(|b| b.appointment == id)
            .cloned()
            .collect();
        let mut location_logs: Vec<VisitLocationLog> = records
            .location_logs
            .iter()
            .filter(|l| l.appointment == id)
            .cloned()
            .collect();
        location_logs.sort_by_key(|l| l.timestamp);
        let mut notes: Vec<Note> = records
            .notes
            .values()
            .filter(|n| n.appointment == id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.created_at);

        Ok(AppointmentDetail::new(
            appointment,
            client,
            seizures,
            incidents,
            medications,
            body_maps,
            location_logs,
            notes,
        ))
    }

    // ------------------------------------------------------------------------
    // Invoicing
    // ------------------------------------------------------------------------

    /// Billable time and amount for a client's completed visits.
    ///
    /// # Errors
    ///
    /// - [`CareError::NotPermitted`] unless the actor is an admin
    /// - [`CareError::InvoiceGroupNotFound`] if the client has no invoice group
    pub fn invoice_summary(&self, actor: &Actor, client: ClientId) -> CareResult<InvoiceSummary> {
        ensure_admin(actor, "view invoices")?;
        let records = self.store.read()?;
        records.client(client)?;
        let group = records
            .invoice_groups
            .get(&client)
            .ok_or(CareError::InvoiceGroupNotFound(client))?;
        let appointments = records.appointment_list();
        Ok(invoicing::invoice_summary(group, &appointments))
    }
}
