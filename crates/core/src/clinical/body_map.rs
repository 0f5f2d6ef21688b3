use crate::error::FieldError;
use crate::ids::{AppointmentId, BodyMapId, StaffId};
use crate::validation::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConsentType {
    Verbal,
    Written,
    Implied,
    Emergency,
    Guardian,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InjuryType {
    PressureUlcer,
    Cut,
    Abrasion,
    Burn,
    Swelling,
    Redness,
    Scar,
    Tenderness,
    Bruise,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InjuryColour {
    Red,
    Purple,
    Blue,
    Green,
    Yellow,
    Brown,
    Black,
    Pink,
    White,
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealingStage {
    Fresh,
    Early,
    Intermediate,
    Late,
    Healed,
    #[default]
    Unknown,
}

/// One injury marked on a body map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Injury {
    /// Body location, free text (for example "left forearm").
    pub location: String,
    #[serde(rename = "type")]
    pub injury_type: InjuryType,
    #[serde(default, rename = "color")]
    pub colour: Option<InjuryColour>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub healing_stage: HealingStage,
    #[serde(default)]
    pub serious: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Marked regions per view (`front`, `back`), each mapping a region name such as `head` or
/// `arms` to its markings.
pub type BodyRegions = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// A structured injury record taken during a visit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BodyMap {
    #[serde(default)]
    pub id: BodyMapId,
    pub appointment: AppointmentId,
    /// Set from the recording staff member when the body map is stored.
    #[serde(default)]
    pub practitioner: Option<StaffId>,
    #[serde(default)]
    pub date_recorded: Option<DateTime<Utc>>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub body_regions: BodyRegions,
    #[serde(default)]
    pub injuries: Vec<Injury>,
    #[serde(default)]
    pub consent_given: bool,
    #[serde(default)]
    pub consent_type: Option<ConsentType>,
    #[serde(default)]
    pub consent_notes: Option<String>,
    #[serde(default)]
    pub photography_consent: bool,
    #[serde(default)]
    pub photos_taken: bool,
    #[serde(default)]
    pub photo_documentation: Option<String>,
    #[serde(default)]
    pub medical_referral: bool,
    #[serde(default)]
    pub medical_referral_details: Option<String>,
    #[serde(default)]
    pub police_notified: bool,
    #[serde(default)]
    pub police_notification_details: Option<String>,
    #[serde(default)]
    pub safeguarding_referral: bool,
    #[serde(default)]
    pub safeguarding_referral_details: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub follow_up_required: bool,
    #[serde(default)]
    pub follow_up_details: Option<String>,
}

impl BodyMap {
    pub fn injury_count(&self) -> usize {
        self.injuries.len()
    }

    pub fn has_serious_injuries(&self) -> bool {
        self.injuries.iter().any(|injury| injury.serious)
    }
}

impl Validate for BodyMap {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.consent_given && self.consent_type.is_none() {
            errors.push(FieldError::MissingConsentType);
        }
        if self.photos_taken && !self.photography_consent {
            errors.push(FieldError::PhotographyConsentRequired);
        }
        errors
    }
}
