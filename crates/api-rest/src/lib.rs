//! # API REST
//!
//! REST API for care visits.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, header authentication)
//!
//! Uses `api-shared` for wire types and authentication, and `care-core` for every rule.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use care_core::VisitService;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;
pub use extract::Acting;

/// Application state for the REST API server
///
/// Shared by every request handler: the visit service and the API key resolved at startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: VisitService,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(service: VisitService, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            service,
            api_key: api_key.into(),
        }
    }
}

/// Builds the application state from the process environment.
///
/// # Environment Variables
/// - `CARE_API_KEY`: shared API key every request must present (required)
/// - `CARE_CONFLICT_POLICY`: `block` (default) or `warn`
/// - `CARE_UTC_OFFSET_MINUTES`: agency offset east of UTC (default `0`)
/// - `CARE_RECURRENCE_OCCURRENCES`: occurrences generated for recurring appointments
/// - `CARE_GEOFENCE_RADIUS_M`: geofence radius in metres
/// - `CARE_SEED_FILE`: optional JSON file of staff, clients, appointments and invoice groups
///
/// # Errors
/// Returns an error if the API key is unset or any value fails to parse, or if the seed file
/// cannot be read or does not match the seed schema.
pub fn app_state_from_env() -> anyhow::Result<AppState> {
    use care_core::config::{
        agency_offset_from_env_value, conflict_policy_from_env_value,
        geofence_radius_from_env_value, recurrence_occurrences_from_env_value,
    };
    use care_core::{CareStore, CoreConfig, Seed};

    let api_key = std::env::var("CARE_API_KEY")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let Some(api_key) = api_key else {
        anyhow::bail!("CARE_API_KEY must be set");
    };

    let cfg = Arc::new(CoreConfig::new(
        conflict_policy_from_env_value(std::env::var("CARE_CONFLICT_POLICY").ok())?,
        agency_offset_from_env_value(std::env::var("CARE_UTC_OFFSET_MINUTES").ok())?,
        recurrence_occurrences_from_env_value(std::env::var("CARE_RECURRENCE_OCCURRENCES").ok())?,
        geofence_radius_from_env_value(std::env::var("CARE_GEOFENCE_RADIUS_M").ok())?,
    )?);

    let store = match std::env::var("CARE_SEED_FILE") {
        Ok(path) if !path.trim().is_empty() => {
            let seed = Seed::from_file(std::path::Path::new(path.trim()))?;
            tracing::info!(
                staff = seed.staff.len(),
                clients = seed.clients.len(),
                appointments = seed.appointments.len(),
                "loaded seed file {}",
                path.trim()
            );
            CareStore::from_seed(seed)?
        }
        _ => CareStore::new(),
    };

    Ok(AppState::new(
        VisitService::new(cfg, Arc::new(store)),
        api_key,
    ))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::appointments_today,
        handlers::appointments_upcoming,
        handlers::appointments_in_progress,
        handlers::appointments_week,
        handlers::dashboard,
        handlers::schedule_appointment,
        handlers::reschedule_appointment,
        handlers::cancel_appointment,
        handlers::appointment_detail,
        handlers::start_visit,
        handlers::end_visit,
        handlers::update_checklist,
        handlers::log_location,
        handlers::location_logs,
        handlers::record_seizure,
        handlers::end_seizure,
        handlers::record_incident,
        handlers::recent_incidents,
        handlers::record_medication,
        handlers::record_body_map,
        handlers::record_note,
        handlers::update_note,
        handlers::delete_note,
        handlers::mobile_sync,
        handlers::client_invoice,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::FieldErrorRes,
        handlers::ChecklistReq,
        handlers::SeizureRes,
        handlers::MedicationRes,
        handlers::BodyMapRes,
        care_core::Appointment,
        care_core::AppointmentStatus,
        care_core::Recurrence,
        care_core::ChecklistItem,
        care_core::Client,
        care_core::StaffMember,
        care_core::StaffRole,
        care_core::AppointmentId,
        care_core::ClientId,
        care_core::StaffId,
        care_core::SeizureId,
        care_core::IncidentId,
        care_core::MedicationId,
        care_core::BodyMapId,
        care_core::LocationLogId,
        care_core::InvoiceGroupId,
        care_core::NoteId,
        care_core::scheduling::ScheduleRequest,
        care_core::scheduling::RescheduleRequest,
        care_core::scheduling::ScheduleOutcome,
        care_core::geofence::LocationLogType,
        care_core::geofence::LocationReport,
        care_core::geofence::VisitLocationLog,
        care_core::clinical::Seizure,
        care_core::clinical::Incident,
        care_core::clinical::PersonInjured,
        care_core::clinical::IncidentClassification,
        care_core::clinical::Medication,
        care_core::clinical::Frequency,
        care_core::clinical::AdministrationTime,
        care_core::clinical::Route,
        care_core::clinical::BodyMap,
        care_core::clinical::Injury,
        care_core::clinical::InjuryType,
        care_core::clinical::InjuryColour,
        care_core::clinical::HealingStage,
        care_core::clinical::ConsentType,
        care_core::clinical::Note,
        care_core::clinical::NoteUpdate,
        care_core::sync::AppointmentSync,
        care_core::sync::SyncRequest,
        care_core::sync::SyncReport,
        care_core::sync::SyncKind,
        care_core::sync::SyncItemError,
        care_core::dashboard::Dashboard,
        care_core::dashboard::DashboardStats,
        care_core::dashboard::AppointmentDetail,
        care_core::invoicing::InvoiceSummary,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/dashboard", get(handlers::dashboard))
        .route("/appointments", post(handlers::schedule_appointment))
        .route("/appointments/today", get(handlers::appointments_today))
        .route("/appointments/upcoming", get(handlers::appointments_upcoming))
        .route(
            "/appointments/in-progress",
            get(handlers::appointments_in_progress),
        )
        .route("/appointments/week", get(handlers::appointments_week))
        .route(
            "/appointments/:id",
            get(handlers::appointment_detail).put(handlers::reschedule_appointment),
        )
        .route("/appointments/:id/cancel", post(handlers::cancel_appointment))
        .route("/appointments/:id/start", post(handlers::start_visit))
        .route("/appointments/:id/end", post(handlers::end_visit))
        .route("/appointments/:id/checklist", post(handlers::update_checklist))
        .route("/appointments/:id/location", post(handlers::log_location))
        .route(
            "/appointments/:id/location-logs",
            get(handlers::location_logs),
        )
        .route("/seizures", post(handlers::record_seizure))
        .route("/seizures/:id/end", post(handlers::end_seizure))
        .route("/incidents", post(handlers::record_incident))
        .route("/incidents/recent", get(handlers::recent_incidents))
        .route("/medications", post(handlers::record_medication))
        .route("/body-maps", post(handlers::record_body_map))
        .route("/notes", post(handlers::record_note))
        .route(
            "/notes/:id",
            put(handlers::update_note).delete(handlers::delete_note),
        )
        .route("/mobile/sync", post(handlers::mobile_sync))
        .route("/clients/:id/invoice", get(handlers::client_invoice))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_shared::{API_KEY_HEADER, STAFF_ID_HEADER};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use care_core::scheduling::ScheduleRequest;
    use care_core::{
        AppointmentId, CareStore, ChecklistItem, Client, ClientId, Clock, ConflictPolicy,
        CoreConfig, NonEmptyText, StaffId, StaffMember, StaffRole,
    };
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    #[derive(Debug)]
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    struct Fixture {
        app: Router,
        nurse: StaffId,
        other_nurse: StaffId,
        admin: StaffId,
        client: ClientId,
        appointment: AppointmentId,
    }

    fn staff(role: StaffRole) -> StaffMember {
        StaffMember {
            id: StaffId::new(),
            first_name: NonEmptyText::new("Test").unwrap(),
            last_name: NonEmptyText::new("Staff").unwrap(),
            role,
            is_staff_member: true,
        }
    }

    fn fixture() -> Fixture {
        let cfg = CoreConfig::new(
            ConflictPolicy::Block,
            FixedOffset::east_opt(0).unwrap(),
            0,
            100.0,
        )
        .unwrap();
        let store = Arc::new(CareStore::new());

        let nurse = staff(StaffRole::Nurse);
        let other_nurse = staff(StaffRole::Nurse);
        let admin = staff(StaffRole::Admin);
        for s in [&nurse, &other_nurse, &admin] {
            store.insert_staff(s.clone()).unwrap();
        }

        let client = Client {
            id: ClientId::new(),
            first_name: NonEmptyText::new("Ada").unwrap(),
            last_name: NonEmptyText::new("Lovelace").unwrap(),
            address: "1 Test Street".into(),
            phone: None,
            email: None,
            latitude: Some(51.5074),
            longitude: Some(-0.1278),
            care_checklist: vec![ChecklistItem::Hygiene, ChecklistItem::Nutrition],
        };
        store.insert_client(client.clone()).unwrap();

        let appointment = ScheduleRequest {
            title: NonEmptyText::new("Morning visit").unwrap(),
            description: None,
            client: client.id,
            assigned_staff: nurse.id,
            start_time: at(9, 0),
            end_time: at(10, 0),
            recurrence: None,
        }
        .into_appointment();
        store.insert_appointment(appointment.clone()).unwrap();

        let service = VisitService::with_clock(
            Arc::new(cfg),
            store,
            Arc::new(FixedClock(at(8, 30))),
        );
        Fixture {
            app: router(AppState::new(service, KEY)),
            nurse: nurse.id,
            other_nurse: other_nurse.id,
            admin: admin.id,
            client: client.id,
            appointment: appointment.id,
        }
    }

    fn request(method: Method, uri: &str, staff: Option<StaffId>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(API_KEY_HEADER, KEY);
        if let Some(staff) = staff {
            builder = builder.header(STAFF_ID_HEADER, staff.to_string());
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    #[tokio::test]
    async fn health_needs_no_credentials() {
        let f = fixture();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&f.app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn missing_api_key_is_unauthorized() {
        let f = fixture();
        let req = Request::builder()
            .uri("/appointments/today")
            .header(STAFF_ID_HEADER, f.nurse.to_string())
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&f.app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_api_key");
    }

    #[tokio::test]
    async fn missing_staff_header_is_unauthorized() {
        let f = fixture();
        let (status, body) = send(
            &f.app,
            request(Method::GET, "/appointments/today", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_staff_id");
    }

    #[tokio::test]
    async fn unknown_staff_is_forbidden() {
        let f = fixture();
        let (status, body) = send(
            &f.app,
            request(Method::GET, "/dashboard", Some(StaffId::new()), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "not_staff_member");
    }

    #[tokio::test]
    async fn todays_appointments_lists_the_visit() {
        let f = fixture();
        let (status, body) = send(
            &f.app,
            request(Method::GET, "/appointments/today", Some(f.nurse), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], f.appointment.to_string());
    }

    #[tokio::test]
    async fn starting_twice_is_rejected() {
        let f = fixture();
        let uri = format!("/appointments/{}/start", f.appointment);

        let (status, body) = send(&f.app, request(Method::POST, &uri, Some(f.nurse), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "in_progress");

        let (status, body) = send(&f.app, request(Method::POST, &uri, Some(f.nurse), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "already_started");
    }

    #[tokio::test]
    async fn other_staff_cannot_start_the_visit() {
        let f = fixture();
        let uri = format!("/appointments/{}/start", f.appointment);
        let (status, body) =
            send(&f.app, request(Method::POST, &uri, Some(f.other_nurse), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "not_assigned");
    }

    #[tokio::test]
    async fn unknown_appointment_is_not_found() {
        let f = fixture();
        let uri = format!("/appointments/{}", AppointmentId::new());
        let (status, body) = send(&f.app, request(Method::GET, &uri, Some(f.nurse), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "appointment_not_found");
    }

    #[tokio::test]
    async fn overlapping_booking_is_a_conflict() {
        let f = fixture();
        let body = json!({
            "title": "Overlapping visit",
            "client": f.client,
            "assigned_staff": f.nurse,
            "start_time": "2026-03-10T09:30:00Z",
            "end_time": "2026-03-10T10:30:00Z"
        });
        let (status, res) = send(
            &f.app,
            request(Method::POST, "/appointments", Some(f.admin), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(res["error"], "conflict_detected");
        assert!(res["message"]
            .as_str()
            .unwrap()
            .contains(&f.appointment.to_string()));
    }

    #[tokio::test]
    async fn admin_schedules_a_free_slot() {
        let f = fixture();
        let body = json!({
            "title": "Afternoon visit",
            "client": f.client,
            "assigned_staff": f.nurse,
            "start_time": "2026-03-10T14:00:00Z",
            "end_time": "2026-03-10T15:00:00Z"
        });
        let (status, res) = send(
            &f.app,
            request(Method::POST, "/appointments", Some(f.admin), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(res["appointments"].as_array().unwrap().len(), 1);
        assert_eq!(res["appointments"][0]["status"], "scheduled");
    }

    #[tokio::test]
    async fn nurses_cannot_schedule() {
        let f = fixture();
        let body = json!({
            "title": "Afternoon visit",
            "client": f.client,
            "assigned_staff": f.nurse,
            "start_time": "2026-03-10T14:00:00Z",
            "end_time": "2026-03-10T15:00:00Z"
        });
        let (status, res) = send(
            &f.app,
            request(Method::POST, "/appointments", Some(f.nurse), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(res["error"], "not_permitted");
    }

    #[tokio::test]
    async fn invalid_incident_lists_field_errors() {
        let f = fixture();
        let body = json!({
            "appointment": f.appointment,
            "time": "2026-03-10T09:15:00Z",
            "persons_involved": "Ada Lovelace",
            "addresses_of_persons_involved": "1 Test Street",
            "incident_details": "Slipped in the kitchen",
            "remediation_taken": "Floor dried",
            "was_person_injured": true,
            "incident_notifiable_riddor": true
        });
        let (status, res) = send(
            &f.app,
            request(Method::POST, "/incidents", Some(f.nurse), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["error"], "validation_failed");
        let fields: Vec<&str> = res["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"person_injured"));
        assert!(fields.contains(&"injury_details"));
        assert!(fields.contains(&"f2508_document"));
    }

    #[tokio::test]
    async fn medication_reports_total_daily_dose() {
        let f = fixture();
        let body = json!({
            "appointment": f.appointment,
            "name": "Paracetamol",
            "strength": 500.0,
            "dose": 500.0,
            "frequency": "twice_daily",
            "route": "oral"
        });
        let (status, res) = send(
            &f.app,
            request(Method::POST, "/medications", Some(f.nurse), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(res["total_daily_dose"], 1000.0);
        assert_eq!(res["name"], "Paracetamol");
    }

    #[tokio::test]
    async fn invoice_is_admin_only() {
        let f = fixture();
        let uri = format!("/clients/{}/invoice", f.client);
        let (status, _) = send(&f.app, request(Method::GET, &uri, Some(f.nurse), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, res) = send(&f.app, request(Method::GET, &uri, Some(f.admin), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(res["error"], "invoice_group_not_found");
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let f = fixture();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/incidents")
            .header(API_KEY_HEADER, KEY)
            .header(STAFF_ID_HEADER, f.nurse.to_string())
            .header("content-type", "application/json")
            .body(Body::from("{\"appointment\": "))
            .unwrap();
        let (status, res) = send(&f.app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["error"], "malformed_json");

        let (status, res) = send(
            &f.app,
            request(
                Method::POST,
                "/incidents",
                Some(f.nurse),
                Some(json!({"appointment": f.appointment})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(res["error"], "invalid_body");
        assert!(res["message"].as_str().unwrap().contains("time"));
    }

    #[tokio::test]
    async fn body_without_json_content_type_is_rejected_as_json() {
        let f = fixture();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/notes")
            .header(API_KEY_HEADER, KEY)
            .header(STAFF_ID_HEADER, f.nurse.to_string())
            .body(Body::from("plain text"))
            .unwrap();
        let (status, res) = send(&f.app, req).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(res["error"], "unsupported_media_type");
    }

    #[tokio::test]
    async fn notes_can_be_written_edited_and_removed() {
        let f = fixture();
        let body = json!({"appointment": f.appointment, "content": "Ate a full lunch"});
        let (status, note) = send(
            &f.app,
            request(Method::POST, "/notes", Some(f.nurse), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(note["uploaded_by"], f.nurse.to_string());
        let uri = format!("/notes/{}", note["id"].as_str().unwrap());

        let (status, res) = send(
            &f.app,
            request(
                Method::PUT,
                &uri,
                Some(f.other_nurse),
                Some(json!({"content": "Overwritten"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(res["error"], "not_assigned");

        let (status, res) = send(
            &f.app,
            request(
                Method::PUT,
                &uri,
                Some(f.nurse),
                Some(json!({"content": "Ate half of lunch"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["content"], "Ate half of lunch");

        let detail = format!("/appointments/{}", f.appointment);
        let (_, res) = send(&f.app, request(Method::GET, &detail, Some(f.nurse), None)).await;
        assert_eq!(res["notes"].as_array().unwrap().len(), 1);

        let (status, _) = send(&f.app, request(Method::DELETE, &uri, Some(f.nurse), None)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, res) = send(&f.app, request(Method::DELETE, &uri, Some(f.nurse), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(res["error"], "note_not_found");
    }

    #[tokio::test]
    async fn mobile_sync_reports_failed_items_without_failing_the_batch() {
        let f = fixture();
        let body = json!({
            "appointments": [{"id": f.appointment, "checklist_items": ["hygiene", "nutrition"]}],
            "seizures": [
                {"appointment": f.appointment, "start_time": "2026-03-10T09:15:00Z"},
                {"appointment": AppointmentId::new(), "start_time": "2026-03-10T09:15:00Z"}
            ],
            "medications": [{
                "appointment": f.appointment,
                "name": "Paracetamol",
                "strength": 500.0,
                "dose": 1000.0,
                "frequency": "once_daily",
                "route": "oral"
            }]
        });
        let (status, res) = send(
            &f.app,
            request(Method::POST, "/mobile/sync", Some(f.nurse), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["appointments_updated"], 1);
        assert_eq!(res["seizures_created"], 1);
        assert_eq!(res["medications_created"], 0);

        let errors = res["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0]["kind"], "seizure");
        assert_eq!(errors[0]["index"], 1);
        assert_eq!(errors[1]["kind"], "medication");
        assert_eq!(errors[1]["fields"], json!(["dose"]));

        let detail = format!("/appointments/{}", f.appointment);
        let (_, res) = send(&f.app, request(Method::GET, &detail, Some(f.nurse), None)).await;
        assert_eq!(res["completion_percentage"], 100.0);
    }
}
