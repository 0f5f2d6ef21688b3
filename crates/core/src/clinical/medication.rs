use crate::error::FieldError;
use crate::ids::{AppointmentId, MedicationId};
use crate::validation::{check_positive, Validate};
use crate::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// How often a medication is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThreeTimesDaily,
    FourTimesDaily,
    #[serde(rename = "every_4_hours")]
    Every4Hours,
    #[serde(rename = "every_6_hours")]
    Every6Hours,
    #[serde(rename = "every_8_hours")]
    Every8Hours,
    #[serde(rename = "every_12_hours")]
    Every12Hours,
    AsNeeded,
    BeforeMeals,
    AfterMeals,
    WithMeals,
    AtBedtime,
    Weekly,
    Monthly,
    Other,
}

impl Frequency {
    pub const ALL: [Frequency; 16] = [
        Frequency::OnceDaily,
        Frequency::TwiceDaily,
        Frequency::ThreeTimesDaily,
        Frequency::FourTimesDaily,
        Frequency::Every4Hours,
        Frequency::Every6Hours,
        Frequency::Every8Hours,
        Frequency::Every12Hours,
        Frequency::AsNeeded,
        Frequency::BeforeMeals,
        Frequency::AfterMeals,
        Frequency::WithMeals,
        Frequency::AtBedtime,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::OnceDaily => "once_daily",
            Frequency::TwiceDaily => "twice_daily",
            Frequency::ThreeTimesDaily => "three_times_daily",
            Frequency::FourTimesDaily => "four_times_daily",
            Frequency::Every4Hours => "every_4_hours",
            Frequency::Every6Hours => "every_6_hours",
            Frequency::Every8Hours => "every_8_hours",
            Frequency::Every12Hours => "every_12_hours",
            Frequency::AsNeeded => "as_needed",
            Frequency::BeforeMeals => "before_meals",
            Frequency::AfterMeals => "after_meals",
            Frequency::WithMeals => "with_meals",
            Frequency::AtBedtime => "at_bedtime",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Other => "other",
        }
    }

    /// Administrations per day, or `None` when the schedule is variable.
    ///
    /// Meal-based schedules assume three meals a day; weekly and monthly are spread as 1/7 and
    /// 1/30 of a dose per day.
    pub fn daily_multiplier(self) -> Option<f64> {
        match self {
            Frequency::OnceDaily | Frequency::AtBedtime => Some(1.0),
            Frequency::TwiceDaily | Frequency::Every12Hours => Some(2.0),
            Frequency::ThreeTimesDaily
            | Frequency::Every8Hours
            | Frequency::BeforeMeals
            | Frequency::AfterMeals
            | Frequency::WithMeals => Some(3.0),
            Frequency::FourTimesDaily | Frequency::Every6Hours => Some(4.0),
            Frequency::Every4Hours => Some(6.0),
            Frequency::Weekly => Some(1.0 / 7.0),
            Frequency::Monthly => Some(1.0 / 30.0),
            Frequency::AsNeeded | Frequency::Other => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown frequency: {s}"))
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AdministrationTime {
    Morning,
    MidMorning,
    Noon,
    Afternoon,
    Evening,
    Night,
    Bedtime,
    BeforeBreakfast,
    AfterBreakfast,
    BeforeLunch,
    AfterLunch,
    BeforeDinner,
    AfterDinner,
    AsNeeded,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Oral,
    Buccal,
    Sublingual,
    Intravenous,
    Intramuscular,
    Subcutaneous,
    Topical,
    Inhalation,
    Nasal,
    Ophthalmic,
    Otic,
    Rectal,
    Transdermal,
    Other,
}

/// A medication administered during a visit. Strength and dose are in mg.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Medication {
    #[serde(default)]
    pub id: MedicationId,
    pub appointment: AppointmentId,
    #[schema(value_type = String)]
    pub name: NonEmptyText,
    pub strength: f64,
    pub dose: f64,
    pub frequency: Frequency,
    #[serde(default)]
    pub administration_times: BTreeSet<AdministrationTime>,
    pub route: Route,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Medication {
    pub fn total_daily_dose(&self) -> Option<f64> {
        total_daily_dose(self.dose, self.frequency)
    }
}

/// Dose multiplied by the frequency's daily multiplier.
///
/// Returns `None` for variable schedules (`as_needed`, `other`) instead of failing.
pub fn total_daily_dose(dose: f64, frequency: Frequency) -> Option<f64> {
    frequency.daily_multiplier().map(|m| dose * m)
}

impl Validate for Medication {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = [
            check_positive("strength", self.strength),
            check_positive("dose", self.dose),
        ]
        .into_iter()
        .flatten()
        .collect();

        if self.dose.is_finite() && self.strength.is_finite() && self.dose > self.strength {
            errors.push(FieldError::DoseExceedsStrength {
                dose: self.dose,
                strength: self.strength,
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medication(strength: f64, dose: f64, frequency: Frequency) -> Medication {
        Medication {
            id: MedicationId::new(),
            appointment: AppointmentId::new(),
            name: NonEmptyText::new("Paracetamol").unwrap(),
            strength,
            dose,
            frequency,
            administration_times: [AdministrationTime::Morning, AdministrationTime::Evening]
                .into_iter()
                .collect(),
            route: Route::Oral,
            notes: None,
        }
    }

    #[test]
    fn daily_dose_for_fixed_schedules() {
        assert_eq!(total_daily_dose(500.0, Frequency::TwiceDaily), Some(1000.0));
        assert_eq!(total_daily_dose(100.0, Frequency::Every4Hours), Some(600.0));
        assert_eq!(total_daily_dose(250.0, Frequency::WithMeals), Some(750.0));
        assert_eq!(total_daily_dose(10.0, Frequency::AtBedtime), Some(10.0));
    }

    #[test]
    fn daily_dose_undefined_for_variable_schedules() {
        assert_eq!(total_daily_dose(500.0, Frequency::AsNeeded), None);
        assert_eq!(total_daily_dose(500.0, Frequency::Other), None);
    }

    #[test]
    fn weekly_and_monthly_are_fractional() {
        let weekly = total_daily_dose(70.0, Frequency::Weekly).unwrap();
        assert!((weekly - 10.0).abs() < 1e-9);
        let monthly = total_daily_dose(300.0, Frequency::Monthly).unwrap();
        assert!((monthly - 10.0).abs() < 1e-9);
    }

    #[test]
    fn every_frequency_round_trips_its_name() {
        for f in Frequency::ALL {
            assert_eq!(f.as_str().parse::<Frequency>(), Ok(f));
            let json = serde_json::to_string(&f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.as_str()));
        }
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn dose_may_equal_but_not_exceed_strength() {
        assert!(medication(500.0, 500.0, Frequency::OnceDaily)
            .validate()
            .is_empty());
        assert_eq!(
            medication(500.0, 1000.0, Frequency::OnceDaily).validate(),
            vec![FieldError::DoseExceedsStrength {
                dose: 1000.0,
                strength: 500.0
            }]
        );
    }

    #[test]
    fn amounts_must_be_positive() {
        let errors = medication(0.0, -1.0, Frequency::OnceDaily).validate();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, FieldError::NonPositiveAmount { .. })));
    }

    #[test]
    fn negative_strength_still_reports_excess_dose() {
        let errors = medication(-5.0, 1.0, Frequency::OnceDaily).validate();
        assert_eq!(
            errors,
            vec![
                FieldError::NonPositiveAmount {
                    field: "strength",
                    value: -5.0
                },
                FieldError::DoseExceedsStrength {
                    dose: 1.0,
                    strength: -5.0
                },
            ]
        );
        assert!(medication(f64::NAN, 1.0, Frequency::OnceDaily)
            .validate()
            .iter()
            .all(|e| matches!(e, FieldError::NonPositiveAmount { .. })));
    }

    #[test]
    fn record_daily_dose_uses_its_frequency() {
        assert_eq!(
            medication(500.0, 500.0, Frequency::TwiceDaily).total_daily_dose(),
            Some(1000.0)
        );
    }
}
