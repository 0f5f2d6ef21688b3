//! Clinical records documented during a visit, with their cross-field validators.
//!
//! Every record here belongs to exactly one appointment. Validators are pure functions of the
//! full candidate record (see [`crate::validation::Validate`]).

pub mod body_map;
pub mod incident;
pub mod medication;
pub mod note;
pub mod seizure;

pub use body_map::{BodyMap, ConsentType, HealingStage, Injury, InjuryColour, InjuryType};
pub use incident::{Incident, IncidentClassification, PersonInjured};
pub use medication::{total_daily_dose, AdministrationTime, Frequency, Medication, Route};
pub use note::{Note, NoteUpdate};
pub use seizure::Seizure;
