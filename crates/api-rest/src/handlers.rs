//! HTTP handlers. Each one resolves the acting staff member, calls [`VisitService`] and maps the
//! result to JSON.
//!
//! [`VisitService`]: care_core::VisitService

use crate::error::ApiError;
use crate::extract::{Acting, ApiJson};
use crate::AppState;
use api_shared::{ErrorRes, HealthRes, HealthService};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use care_core::clinical::{BodyMap, Incident, Medication, Note, NoteUpdate, Seizure};
use care_core::dashboard::{AppointmentDetail, Dashboard};
use care_core::geofence::{LocationReport, VisitLocationLog};
use care_core::invoicing::InvoiceSummary;
use care_core::scheduling::{RescheduleRequest, ScheduleOutcome, ScheduleRequest};
use care_core::sync::{SyncReport, SyncRequest};
use care_core::{Appointment, AppointmentId, ChecklistItem, ClientId, NoteId, SeizureId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

type ApiResult<T> = Result<Json<T>, ApiError>;
type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

fn created<T>(value: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(value)))
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct ChecklistReq {
    pub checklist_items: Vec<ChecklistItem>,
}

/// A stored seizure with its derived length.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SeizureRes {
    #[serde(flatten)]
    pub seizure: Seizure,
    pub duration_minutes: Option<i64>,
}

impl From<Seizure> for SeizureRes {
    fn from(seizure: Seizure) -> Self {
        Self {
            duration_minutes: seizure.duration_minutes(),
            seizure,
        }
    }
}

/// A stored medication with its derived daily total.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MedicationRes {
    #[serde(flatten)]
    pub medication: Medication,
    /// `None` for as-needed and other irregular frequencies.
    pub total_daily_dose: Option<f64>,
}

impl From<Medication> for MedicationRes {
    fn from(medication: Medication) -> Self {
        Self {
            total_daily_dose: medication.total_daily_dose(),
            medication,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BodyMapRes {
    #[serde(flatten)]
    pub body_map: BodyMap,
    pub injury_count: usize,
    pub has_serious_injuries: bool,
}

impl From<BodyMap> for BodyMapRes {
    fn from(body_map: BodyMap) -> Self {
        Self {
            injury_count: body_map.injury_count(),
            has_serious_injuries: body_map.has_serious_injuries(),
            body_map,
        }
    }
}

// ============================================================================
// HEALTH
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness check. Needs no credentials.
#[axum::debug_handler(state = AppState)]
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

// ============================================================================
// STAFF VIEWS
// ============================================================================

#[utoipa::path(
    get,
    path = "/appointments/today",
    responses(
        (status = 200, description = "The actor's appointments for today", body = [Appointment]),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes),
        (status = 403, description = "Not a staff member", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn appointments_today(
    State(state): State<AppState>,
    Acting(actor): Acting,
) -> ApiResult<Vec<Appointment>> {
    Ok(Json(state.service.appointments_today(&actor)?))
}

#[utoipa::path(
    get,
    path = "/appointments/upcoming",
    responses(
        (status = 200, description = "The actor's next ten appointments", body = [Appointment]),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn appointments_upcoming(
    State(state): State<AppState>,
    Acting(actor): Acting,
) -> ApiResult<Vec<Appointment>> {
    Ok(Json(state.service.upcoming(&actor)?))
}

#[utoipa::path(
    get,
    path = "/appointments/in-progress",
    responses(
        (status = 200, description = "Visits the actor has started but not ended", body = [Appointment]),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn appointments_in_progress(
    State(state): State<AppState>,
    Acting(actor): Acting,
) -> ApiResult<Vec<Appointment>> {
    Ok(Json(state.service.in_progress(&actor)?))
}

#[utoipa::path(
    get,
    path = "/appointments/week",
    responses(
        (status = 200, description = "The actor's appointments this week (Monday to Sunday)", body = [Appointment]),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn appointments_week(
    State(state): State<AppState>,
    Acting(actor): Acting,
) -> ApiResult<Vec<Appointment>> {
    Ok(Json(state.service.week(&actor)?))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Staff dashboard", body = Dashboard),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Acting(actor): Acting,
) -> ApiResult<Dashboard> {
    Ok(Json(state.service.dashboard(&actor)?))
}

// ============================================================================
// SCHEDULING
// ============================================================================

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = ScheduleRequest,
    responses(
        (status = 201, description = "Appointment scheduled, with any recurring occurrences", body = ScheduleOutcome),
        (status = 400, description = "Invalid window", body = ErrorRes),
        (status = 403, description = "Actor is not an admin", body = ErrorRes),
        (status = 404, description = "Unknown client or staff member", body = ErrorRes),
        (status = 409, description = "Staff member is already booked", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn schedule_appointment(
    State(state): State<AppState>,
    Acting(actor): Acting,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> Created<ScheduleOutcome> {
    created(state.service.schedule(&actor, req)?)
}

#[utoipa::path(
    put,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Appointment moved", body = ScheduleOutcome),
        (status = 400, description = "Invalid window or appointment no longer scheduled", body = ErrorRes),
        (status = 403, description = "Actor is not an admin", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes),
        (status = 409, description = "Staff member is already booked", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<AppointmentId>,
    ApiJson(req): ApiJson<RescheduleRequest>,
) -> ApiResult<ScheduleOutcome> {
    Ok(Json(state.service.reschedule(&actor, id, req)?))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment cancelled", body = Appointment),
        (status = 400, description = "Visit already started or finished", body = ErrorRes),
        (status = 403, description = "Actor is not an admin", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<AppointmentId>,
) -> ApiResult<Appointment> {
    Ok(Json(state.service.cancel(&actor, id)?))
}

// ============================================================================
// VISITS
// ============================================================================

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Visit with its client and clinical records", body = AppointmentDetail),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn appointment_detail(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<AppointmentId>,
) -> ApiResult<AppointmentDetail> {
    Ok(Json(state.service.appointment_detail(&actor, id)?))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/start",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Visit started", body = Appointment),
        (status = 400, description = "Visit cannot be started", body = ErrorRes),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn start_visit(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<AppointmentId>,
) -> ApiResult<Appointment> {
    Ok(Json(state.service.start_visit(&actor, id)?))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/end",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Visit ended", body = Appointment),
        (status = 400, description = "Visit not started or already ended", body = ErrorRes),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn end_visit(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<AppointmentId>,
) -> ApiResult<Appointment> {
    Ok(Json(state.service.end_visit(&actor, id)?))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/checklist",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = ChecklistReq,
    responses(
        (status = 200, description = "Checklist replaced", body = Appointment),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_checklist(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<AppointmentId>,
    ApiJson(req): ApiJson<ChecklistReq>,
) -> ApiResult<Appointment> {
    Ok(Json(state.service.update_checklist(
        &actor,
        id,
        req.checklist_items,
    )?))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/location",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = LocationReport,
    responses(
        (status = 201, description = "Location logged", body = VisitLocationLog),
        (status = 400, description = "Invalid coordinates or client has no location", body = ErrorRes),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn log_location(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<AppointmentId>,
    ApiJson(report): ApiJson<LocationReport>,
) -> Created<VisitLocationLog> {
    created(state.service.log_location(&actor, id, report)?)
}

#[utoipa::path(
    get,
    path = "/appointments/{id}/location-logs",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Location logs, oldest first", body = [VisitLocationLog]),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn location_logs(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<AppointmentId>,
) -> ApiResult<Vec<VisitLocationLog>> {
    Ok(Json(state.service.location_logs(&actor, id)?))
}

// ============================================================================
// CLINICAL RECORDS
// ============================================================================

#[utoipa::path(
    post,
    path = "/seizures",
    request_body = Seizure,
    responses(
        (status = 201, description = "Seizure recorded", body = SeizureRes),
        (status = 400, description = "Record failed validation", body = ErrorRes),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn record_seizure(
    State(state): State<AppState>,
    Acting(actor): Acting,
    ApiJson(seizure): ApiJson<Seizure>,
) -> Created<SeizureRes> {
    created(state.service.record_seizure(&actor, seizure)?.into())
}

#[utoipa::path(
    post,
    path = "/seizures/{id}/end",
    params(("id" = String, Path, description = "Seizure id")),
    responses(
        (status = 200, description = "Seizure ended", body = SeizureRes),
        (status = 400, description = "Seizure already ended", body = ErrorRes),
        (status = 404, description = "Unknown seizure", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn end_seizure(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<SeizureId>,
) -> ApiResult<SeizureRes> {
    Ok(Json(state.service.end_seizure(&actor, id)?.into()))
}

#[utoipa::path(
    post,
    path = "/incidents",
    request_body = Incident,
    responses(
        (status = 201, description = "Incident recorded", body = Incident),
        (status = 400, description = "Record failed validation", body = ErrorRes),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn record_incident(
    State(state): State<AppState>,
    Acting(actor): Acting,
    ApiJson(incident): ApiJson<Incident>,
) -> Created<Incident> {
    created(state.service.record_incident(&actor, incident)?)
}

#[utoipa::path(
    get,
    path = "/incidents/recent",
    responses(
        (status = 200, description = "Incidents on the actor's visits in the last 30 days", body = [Incident]),
        (status = 401, description = "Missing or invalid credentials", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn recent_incidents(
    State(state): State<AppState>,
    Acting(actor): Acting,
) -> ApiResult<Vec<Incident>> {
    Ok(Json(state.service.recent_incidents(&actor)?))
}

#[utoipa::path(
    post,
    path = "/medications",
    request_body = Medication,
    responses(
        (status = 201, description = "Medication recorded", body = MedicationRes),
        (status = 400, description = "Record failed validation", body = ErrorRes),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn record_medication(
    State(state): State<AppState>,
    Acting(actor): Acting,
    ApiJson(medication): ApiJson<Medication>,
) -> Created<MedicationRes> {
    created(state.service.record_medication(&actor, medication)?.into())
}

#[utoipa::path(
    post,
    path = "/body-maps",
    request_body = BodyMap,
    responses(
        (status = 201, description = "Body map recorded", body = BodyMapRes),
        (status = 400, description = "Record failed validation", body = ErrorRes),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn record_body_map(
    State(state): State<AppState>,
    Acting(actor): Acting,
    ApiJson(body_map): ApiJson<BodyMap>,
) -> Created<BodyMapRes> {
    created(state.service.record_body_map(&actor, body_map)?.into())
}

// ============================================================================
// VISIT NOTES
// ============================================================================

#[utoipa::path(
    post,
    path = "/notes",
    request_body = Note,
    responses(
        (status = 201, description = "Note recorded", body = Note),
        (status = 400, description = "Note has neither content nor a document", body = ErrorRes),
        (status = 403, description = "Visit is assigned to someone else", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn record_note(
    State(state): State<AppState>,
    Acting(actor): Acting,
    ApiJson(note): ApiJson<Note>,
) -> Created<Note> {
    created(state.service.record_note(&actor, note)?)
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = String, Path, description = "Note id")),
    request_body = NoteUpdate,
    responses(
        (status = 200, description = "Note updated", body = Note),
        (status = 400, description = "Edit would leave the note empty", body = ErrorRes),
        (status = 403, description = "Actor neither wrote the note nor is an admin", body = ErrorRes),
        (status = 404, description = "Unknown note", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn update_note(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<NoteId>,
    ApiJson(update): ApiJson<NoteUpdate>,
) -> ApiResult<Note> {
    Ok(Json(state.service.update_note(&actor, id, update)?))
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note deleted", body = Note),
        (status = 403, description = "Actor neither wrote the note nor is an admin", body = ErrorRes),
        (status = 404, description = "Unknown note", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_note(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<NoteId>,
) -> ApiResult<Note> {
    Ok(Json(state.service.delete_note(&actor, id)?))
}

// ============================================================================
// MOBILE SYNC
// ============================================================================

#[utoipa::path(
    post,
    path = "/mobile/sync",
    request_body = SyncRequest,
    responses(
        (status = 200, description = "Per-kind counts of applied items and the reason each failed item was skipped", body = SyncReport),
        (status = 403, description = "Actor is not a staff member", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn mobile_sync(
    State(state): State<AppState>,
    Acting(actor): Acting,
    ApiJson(request): ApiJson<SyncRequest>,
) -> ApiResult<SyncReport> {
    Ok(Json(state.service.sync(&actor, request)?))
}

// ============================================================================
// INVOICING
// ============================================================================

#[utoipa::path(
    get,
    path = "/clients/{id}/invoice",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Billable time for the client's completed visits", body = InvoiceSummary),
        (status = 403, description = "Actor is not an admin", body = ErrorRes),
        (status = 404, description = "Unknown client or no invoice group", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn client_invoice(
    State(state): State<AppState>,
    Acting(actor): Acting,
    Path(id): Path<ClientId>,
) -> ApiResult<InvoiceSummary> {
    Ok(Json(state.service.invoice_summary(&actor, id)?))
}
