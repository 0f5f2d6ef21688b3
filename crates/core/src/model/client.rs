//! Clients (service users) and the care checklist vocabulary.

use crate::geofence::GeoPoint;
use crate::ids::ClientId;
use crate::NonEmptyText;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named care task a client's care plan can require per visit.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    BasicCare,
    MedicationManagement,
    WoundCare,
    PhysicalTherapy,
    NursingCare,
    SocialWork,
    Nutrition,
    Hygiene,
    Mobility,
    Monitoring,
    Education,
    FamilySupport,
    EmergencyPrep,
    Equipment,
    Transportation,
}

impl ChecklistItem {
    pub const ALL: [ChecklistItem; 15] = [
        ChecklistItem::BasicCare,
        ChecklistItem::MedicationManagement,
        ChecklistItem::WoundCare,
        ChecklistItem::PhysicalTherapy,
        ChecklistItem::NursingCare,
        ChecklistItem::SocialWork,
        ChecklistItem::Nutrition,
        ChecklistItem::Hygiene,
        ChecklistItem::Mobility,
        ChecklistItem::Monitoring,
        ChecklistItem::Education,
        ChecklistItem::FamilySupport,
        ChecklistItem::EmergencyPrep,
        ChecklistItem::Equipment,
        ChecklistItem::Transportation,
    ];

    /// Wire name of the item, as used in JSON bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecklistItem::BasicCare => "basic_care",
            ChecklistItem::MedicationManagement => "medication_management",
            ChecklistItem::WoundCare => "wound_care",
            ChecklistItem::PhysicalTherapy => "physical_therapy",
            ChecklistItem::NursingCare => "nursing_care",
            ChecklistItem::SocialWork => "social_work",
            ChecklistItem::Nutrition => "nutrition",
            ChecklistItem::Hygiene => "hygiene",
            ChecklistItem::Mobility => "mobility",
            ChecklistItem::Monitoring => "monitoring",
            ChecklistItem::Education => "education",
            ChecklistItem::FamilySupport => "family_support",
            ChecklistItem::EmergencyPrep => "emergency_prep",
            ChecklistItem::Equipment => "equipment",
            ChecklistItem::Transportation => "transportation",
        }
    }
}

impl std::str::FromStr for ChecklistItem {
    type Err = crate::CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChecklistItem::ALL
            .into_iter()
            .find(|item| item.as_str() == wanted)
            .ok_or_else(|| crate::CareError::InvalidInput(format!("unknown checklist item '{s}'")))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Client {
    #[serde(default)]
    pub id: ClientId,
    #[schema(value_type = String)]
    pub first_name: NonEmptyText,
    #[schema(value_type = String)]
    pub last_name: NonEmptyText,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Care items required for this client, in care-plan order.
    #[serde(default)]
    pub care_checklist: Vec<ChecklistItem>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Registered residence, if both coordinates are set.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}
