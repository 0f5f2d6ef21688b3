//! # Care Core
//!
//! Core business logic for the care-agency visit record system.
//!
//! This crate contains the domain model and the rules that govern it:
//! - Visit lifecycle (start, end, duration) and the appointment status machine
//! - Scheduling conflict detection and recurring appointment generation
//! - Care checklist completion
//! - Clinical record validators (seizures, incidents, medications, body maps)
//! - Geofence distance for visit location logs
//! - Staff dashboard queries and invoice summaries
//! - Visit notes and batch upload of work captured offline
//! - An in-memory record store and the [`VisitService`] operation surface
//!
//! **No API concerns**: HTTP routing, request authentication and wire status codes belong in
//! `api-rest` and `api-shared`.

pub mod checklist;
pub mod clinical;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod geofence;
pub mod ids;
pub mod invoicing;
pub mod lifecycle;
pub mod model;
pub mod repositories;
pub mod scheduling;
pub mod sync;
pub mod validation;

pub use care_types::NonEmptyText;
pub use config::{ConflictPolicy, CoreConfig};
pub use error::{CareError, CareResult, FieldError};
pub use ids::{
    AppointmentId, BodyMapId, ClientId, IncidentId, InvoiceGroupId, LocationLogId, MedicationId,
    NoteId, SeizureId, StaffId,
};
pub use model::{
    Actor, Appointment, AppointmentStatus, ChecklistItem, Client, Recurrence, StaffMember,
    StaffRole,
};
pub use repositories::store::{CareStore, Seed};
pub use repositories::visits::{Clock, SystemClock, VisitService};
pub use validation::Validate;
