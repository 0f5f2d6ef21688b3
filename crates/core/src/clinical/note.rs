use crate::error::FieldError;
use crate::ids::{AppointmentId, NoteId, StaffId};
use crate::validation::Validate;
use care_types::has_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Free-text note or attached document left on a visit.
///
/// `uploaded_by` and the timestamps are owned by the service: whatever the caller sends is
/// replaced with the acting staff member and the current time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Note {
    #[serde(default)]
    pub id: NoteId,
    pub appointment: AppointmentId,
    #[serde(default)]
    pub content: String,
    /// Reference to an uploaded document.
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<StaffId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Replacement content for an existing note.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NoteUpdate {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub document: Option<String>,
}

impl Note {
    /// Applies an edit; validation is left to the caller.
    pub fn apply(&mut self, update: NoteUpdate, now: DateTime<Utc>) {
        self.content = update.content;
        self.document = update.document;
        self.updated_at = Some(now);
    }
}

impl Validate for Note {
    fn validate(&self) -> Vec<FieldError> {
        if has_text(Some(&self.content)) || has_text(self.document.as_deref()) {
            Vec::new()
        } else {
            vec![FieldError::EmptyNote]
        }
    }
}
