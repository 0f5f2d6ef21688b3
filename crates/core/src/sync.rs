//! Batch upload of work captured offline by the mobile app.
//!
//! Each item is parsed and applied on its own through the regular [`VisitService`] operations,
//! so one bad item is reported in [`SyncReport::errors`] without rejecting the rest of the batch.
//!
//! [`VisitService`]: crate::VisitService

use crate::clinical::{BodyMap, Incident, Medication, Note, Seizure};
use crate::error::{CareError, CareResult};
use crate::ids::AppointmentId;
use crate::model::ChecklistItem;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Checklist state of a visit as last seen on the device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppointmentSync {
    pub id: AppointmentId,
    pub checklist_items: Vec<ChecklistItem>,
}

/// Items are kept as raw JSON so that a malformed one fails alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SyncRequest {
    #[schema(value_type = Vec<AppointmentSync>)]
    pub appointments: Vec<Value>,
    #[schema(value_type = Vec<Seizure>)]
    pub seizures: Vec<Value>,
    #[schema(value_type = Vec<Incident>)]
    pub incidents: Vec<Value>,
    #[schema(value_type = Vec<Medication>)]
    pub medications: Vec<Value>,
    #[schema(value_type = Vec<BodyMap>)]
    pub body_maps: Vec<Value>,
    #[schema(value_type = Vec<Note>)]
    pub notes: Vec<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Appointment,
    Seizure,
    Incident,
    Medication,
    BodyMap,
    Note,
}

/// Why one uploaded item was not applied.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct SyncItemError {
    pub kind: SyncKind,
    /// Position of the item within its list in the request.
    pub index: usize,
    pub message: String,
    /// Wire fields named by validation failures, empty for other errors.
    pub fields: Vec<String>,
}

impl SyncItemError {
    fn new(kind: SyncKind, index: usize, err: &CareError) -> Self {
        let fields = match err {
            CareError::Validation(errors) => errors.iter().map(|e| e.field().to_string()).collect(),
            _ => Vec::new(),
        };
        Self {
            kind,
            index,
            message: err.to_string(),
            fields,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct SyncReport {
    pub appointments_updated: usize,
    pub seizures_created: usize,
    pub incidents_created: usize,
    pub medications_created: usize,
    pub body_maps_created: usize,
    pub notes_created: usize,
    pub errors: Vec<SyncItemError>,
}

impl SyncReport {
    pub fn applied(&self) -> usize {
        self.appointments_updated
            + self.seizures_created
            + self.incidents_created
            + self.medications_created
            + self.body_maps_created
            + self.notes_created
    }

    fn counter(&mut self, kind: SyncKind) -> &mut usize {
        match kind {
            SyncKind::Appointment => &mut self.appointments_updated,
            SyncKind::Seizure => &mut self.seizures_created,
            SyncKind::Incident => &mut self.incidents_created,
            SyncKind::Medication => &mut self.medications_created,
            SyncKind::BodyMap => &mut self.body_maps_created,
            SyncKind::Note => &mut self.notes_created,
        }
    }

    /// Counts a successful item or records why it failed. A poisoned store aborts the batch.
    fn tally(&mut self, kind: SyncKind, index: usize, outcome: CareResult<()>) -> CareResult<()> {
        match outcome {
            Ok(()) => *self.counter(kind) += 1,
            Err(CareError::StorePoisoned) => return Err(CareError::StorePoisoned),
            Err(err) => self.errors.push(SyncItemError::new(kind, index, &err)),
        }
        Ok(())
    }
}

/// Parses one uploaded item, naming the JSON path of any schema mismatch.
///
/// # Errors
///
/// Returns [`CareError::InvalidInput`] if the item does not match `T`.
pub fn parse_item<T: DeserializeOwned>(item: Value) -> CareResult<T> {
    serde_path_to_error::deserialize(item).map_err(|err| {
        let path = err.path().to_string();
        CareError::InvalidInput(format!("{} at {path}", err.into_inner()))
    })
}

/// Parses and applies every item of one list, tallying the outcome of each into `report`.
pub(crate) fn apply_each<T, R>(
    report: &mut SyncReport,
    kind: SyncKind,
    items: Vec<Value>,
    mut apply: impl FnMut(T) -> CareResult<R>,
) -> CareResult<()>
where
    T: DeserializeOwned,
{
    for (index, item) in items.into_iter().enumerate() {
        let outcome = parse_item(item).and_then(|parsed| apply(parsed)).map(drop);
        report.tally(kind, index, outcome)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use serde_json::json;

    #[test]
    fn failures_are_listed_with_their_position() {
        let mut report = SyncReport::default();
        apply_each(
            &mut report,
            SyncKind::Incident,
            vec![json!(1), json!(2), json!(3)],
            |n: u32| {
                if n == 2 {
                    Err(CareError::Validation(vec![FieldError::MissingRiddorDocument]))
                } else {
                    Ok(())
                }
            },
        )
        .unwrap();

        assert_eq!(report.incidents_created, 2);
        assert_eq!(report.applied(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, SyncKind::Incident);
        assert_eq!(report.errors[0].index, 1);
        assert_eq!(report.errors[0].fields, vec!["f2508_document".to_string()]);
    }

    #[test]
    fn malformed_item_names_the_path() {
        let err = parse_item::<AppointmentSync>(json!({
            "id": "c3b0a2de-1c7b-4c43-8f5e-2a3d5c6b7e81",
            "checklist_items": ["hygiene", "flying"]
        }))
        .unwrap_err();
        assert!(matches!(err, CareError::InvalidInput(ref msg) if msg.contains("checklist_items")));
    }

    #[test]
    fn poisoned_store_aborts_the_batch() {
        let mut report = SyncReport::default();
        let result = apply_each(
            &mut report,
            SyncKind::Note,
            vec![json!(null), json!(null)],
            |_: Value| -> CareResult<()> { Err(CareError::StorePoisoned) },
        );
        assert!(matches!(result, Err(CareError::StorePoisoned)));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let request: SyncRequest = serde_json::from_value(json!({"seizures": []})).unwrap();
        assert!(request.appointments.is_empty());
        assert!(request.notes.is_empty());
    }
}
