use crate::error::FieldError;
use crate::ids::{AppointmentId, IncidentId};
use crate::validation::Validate;
use crate::NonEmptyText;
use care_types::has_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PersonInjured {
    ServiceUser,
    Carer,
    Visitor,
    Other,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum IncidentClassification {
    MinorInjury,
    MajorInjury,
    #[serde(rename = "injury_3_days_sick_leave")]
    Injury3DaysSickLeave,
    AdmittedHospital,
    Fatality,
    SelfHarmOverdose,
    SelfHarmOther,
    VerbalAbuse,
    PhysicalAbuse,
    Assault,
    Arson,
    DamageTheftProperty,
    SubstanceMisuse,
    Other,
}

/// An incident report raised during a visit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Incident {
    #[serde(default)]
    pub id: IncidentId,
    pub appointment: AppointmentId,
    /// When the incident occurred.
    pub time: DateTime<Utc>,
    #[schema(value_type = String)]
    pub persons_involved: NonEmptyText,
    #[schema(value_type = String)]
    pub addresses_of_persons_involved: NonEmptyText,
    #[schema(value_type = String)]
    pub incident_details: NonEmptyText,
    #[serde(default)]
    pub was_person_injured: bool,
    #[serde(default)]
    pub person_injured: Option<PersonInjured>,
    #[serde(default)]
    pub injury_details: Option<String>,
    #[serde(default)]
    pub incident_classification: BTreeSet<IncidentClassification>,
    #[schema(value_type = String)]
    pub remediation_taken: NonEmptyText,
    #[serde(default)]
    pub incident_notifiable_riddor: bool,
    /// Reference to the uploaded F2508 form.
    #[serde(default)]
    pub f2508_document: Option<String>,
    #[serde(default)]
    pub other_people_notified: Option<String>,
    #[serde(default)]
    pub additional_information: Option<String>,
    #[serde(default)]
    pub insurers_advised: bool,
}

impl Validate for Incident {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.was_person_injured {
            if self.person_injured.is_none() {
                errors.push(FieldError::MissingInjuryDetail {
                    field: "person_injured",
                });
            }
            if !has_text(self.injury_details.as_deref()) {
                errors.push(FieldError::MissingInjuryDetail {
                    field: "injury_details",
                });
            }
        }

        if self.incident_notifiable_riddor && !has_text(self.f2508_document.as_deref()) {
            errors.push(FieldError::MissingRiddorDocument);
        }

        errors
    }
}
