use crate::ids::{AppointmentId, ClientId, NoteId, SeizureId, StaffId};
use crate::model::AppointmentStatus;
use chrono::{DateTime, NaiveDate, Utc};

/// A single cross-field rule violated by a clinical record.
///
/// Validators return every violation they find; an empty list means the record is valid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("{field}: end time {end} must be after start time {start}")]
    InvalidWindow {
        field: &'static str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("{field} must be provided if someone was injured")]
    MissingInjuryDetail { field: &'static str },
    #[error("an F2508 document is required if the incident is RIDDOR notifiable")]
    MissingRiddorDocument,
    #[error("dose {dose} cannot be greater than the medication strength {strength}")]
    DoseExceedsStrength { dose: f64, strength: f64 },
    #[error("{field} must be greater than zero, got {value}")]
    NonPositiveAmount { field: &'static str, value: f64 },
    #[error("consent type must be specified if consent was given")]
    MissingConsentType,
    #[error("photography consent is required if photos were taken")]
    PhotographyConsentRequired,
    #[error("a note needs either content or a document")]
    EmptyNote,
}

impl FieldError {
    /// Name of the wire field the error should be rendered against.
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::InvalidWindow { field, .. }
            | FieldError::MissingInjuryDetail { field }
            | FieldError::NonPositiveAmount { field, .. } => field,
            FieldError::MissingRiddorDocument => "f2508_document",
            FieldError::DoseExceedsStrength { .. } => "dose",
            FieldError::MissingConsentType => "consent_type",
            FieldError::PhotographyConsentRequired => "photography_consent",
            FieldError::EmptyNote => "content",
        }
    }

    /// Stable machine-readable code for the violated rule.
    pub fn code(&self) -> &'static str {
        match self {
            FieldError::InvalidWindow { .. } => "invalid_window",
            FieldError::MissingInjuryDetail { .. } => "missing_injury_detail",
            FieldError::MissingRiddorDocument => "missing_riddor_document",
            FieldError::DoseExceedsStrength { .. } => "dose_exceeds_strength",
            FieldError::NonPositiveAmount { .. } => "non_positive_amount",
            FieldError::MissingConsentType => "missing_consent_type",
            FieldError::PhotographyConsentRequired => "photography_consent_required",
            FieldError::EmptyNote => "empty_note",
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum CareError {
    #[error("end time {end} must be after start time {start}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("this visit has already been started at {started_at}")]
    AlreadyStarted { started_at: DateTime<Utc> },
    #[error("this visit has already been ended at {ended_at}")]
    AlreadyEnded { ended_at: DateTime<Utc> },
    #[error("visit has not been started")]
    NotStarted,
    #[error("visit is scheduled for {scheduled} and can only be started on that day (today is {today})")]
    NotToday {
        scheduled: NaiveDate,
        today: NaiveDate,
    },
    #[error("this staff member already has {} appointment(s) during this time", .conflicting.len())]
    ConflictDetected { conflicting: Vec<AppointmentId> },
    #[error("appointment cannot move from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("start time {start} must be in the future")]
    StartNotInFuture { start: DateTime<Utc> },

    #[error("appointment {appointment} is not assigned to staff member {staff}")]
    NotAssigned {
        appointment: AppointmentId,
        staff: StaffId,
    },
    #[error("user {0} is not a staff member")]
    NotStaffMember(StaffId),
    #[error("staff member {staff} is not permitted to {action}")]
    NotPermitted {
        staff: StaffId,
        action: &'static str,
    },

    #[error("seizure has already been ended at {ended_at}")]
    SeizureAlreadyEnded { ended_at: DateTime<Utc> },
    #[error("client {0} does not have latitude/longitude set")]
    MissingClientLocation(ClientId),
    #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    #[error("rate per hour cannot be negative, got {0}")]
    NegativeRate(f64),
    #[error("record failed validation: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("appointment {0} not found")]
    AppointmentNotFound(AppointmentId),
    #[error("client {0} not found")]
    ClientNotFound(ClientId),
    #[error("seizure {0} not found")]
    SeizureNotFound(SeizureId),
    #[error("staff member {0} not found")]
    StaffNotFound(StaffId),
    #[error("no invoice group for client {0}")]
    InvoiceGroupNotFound(ClientId),
    #[error("note {0} not found")]
    NoteNotFound(NoteId),

    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read seed file: {0}")]
    SeedRead(std::io::Error),
    #[error("seed file schema mismatch at {path}: {message}")]
    SeedParse { path: String, message: String },
    #[error("record store lock was poisoned")]
    StorePoisoned,
}

pub type CareResult<T> = std::result::Result<T, CareError>;

impl From<Vec<FieldError>> for CareError {
    fn from(errors: Vec<FieldError>) -> Self {
        CareError::Validation(errors)
    }
}
