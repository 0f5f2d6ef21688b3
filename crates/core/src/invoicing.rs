//! Per-client invoice groups and billable time summaries.

use crate::error::{CareError, CareResult};
use crate::ids::{ClientId, InvoiceGroupId};
use crate::lifecycle::duration_minutes;
use crate::model::{Appointment, AppointmentStatus};
use crate::NonEmptyText;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Billing arrangement for a single client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceGroup {
    #[serde(default)]
    pub id: InvoiceGroupId,
    #[schema(value_type = String)]
    pub name: NonEmptyText,
    pub client: ClientId,
    #[serde(default)]
    pub rate_per_hour: f64,
}

impl InvoiceGroup {
    /// # Errors
    ///
    /// Returns [`CareError::NegativeRate`] if the hourly rate is negative or not a number.
    pub fn validate(&self) -> CareResult<()> {
        if !self.rate_per_hour.is_finite() || self.rate_per_hour < 0.0 {
            return Err(CareError::NegativeRate(self.rate_per_hour));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct InvoiceSummary {
    pub invoice_group: InvoiceGroupId,
    pub client: ClientId,
    pub completed_visits: usize,
    pub total_minutes: i64,
    pub rate_per_hour: f64,
    /// `total_minutes / 60 * rate_per_hour`, rounded to two decimals.
    pub amount: f64,
}

fn round_to_pence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarises the billable time of a client's completed visits.
///
/// Appointments for other clients and visits that are not completed are ignored.
pub fn invoice_summary(group: &InvoiceGroup, appointments: &[Appointment]) -> InvoiceSummary {
    let minutes: Vec<i64> = appointments
        .iter()
        .filter(|a| a.client == group.client && a.status == AppointmentStatus::Completed)
        .filter_map(duration_minutes)
        .collect();

    let total_minutes: i64 = minutes.iter().sum();
    let amount = round_to_pence(total_minutes as f64 / 60.0 * group.rate_per_hour);

    InvoiceSummary {
        invoice_group: group.id,
        client: group.client,
        completed_visits: minutes.len(),
        total_minutes,
        rate_per_hour: group.rate_per_hour,
        amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::StaffId;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn group(client: ClientId, rate: f64) -> InvoiceGroup {
        InvoiceGroup {
            id: InvoiceGroupId::new(),
            name: NonEmptyText::new("March care").unwrap(),
            client,
            rate_per_hour: rate,
        }
    }

    fn visit(client: ClientId, actual: Option<(DateTime<Utc>, DateTime<Utc>)>) -> Appointment {
        Appointment {
            id: Default::default(),
            title: NonEmptyText::new("Visit").unwrap(),
            description: None,
            client,
            assigned_staff: StaffId::new(),
            start_time: at(9, 0),
            end_time: at(11, 0),
            status: if actual.is_some() {
                AppointmentStatus::Completed
            } else {
                AppointmentStatus::Scheduled
            },
            recurrence: None,
            actual_start_time: actual.map(|(s, _)| s),
            actual_end_time: actual.map(|(_, e)| e),
            checklist_items: Default::default(),
        }
    }

    #[test]
    fn negative_rate_is_rejected() {
        let g = group(ClientId::new(), -1.0);
        assert!(matches!(g.validate(), Err(CareError::NegativeRate(r)) if r == -1.0));
        assert!(group(ClientId::new(), 0.0).validate().is_ok());
    }

    #[test]
    fn sums_completed_visits_for_the_client() {
        let client = ClientId::new();
        let appointments = vec![
            visit(client, Some((at(9, 0), at(10, 30)))),
            visit(client, Some((at(9, 10), at(9, 30)))),
            visit(client, None),
            visit(ClientId::new(), Some((at(9, 0), at(11, 0)))),
        ];

        let summary = invoice_summary(&group(client, 20.0), &appointments);
        assert_eq!(summary.completed_visits, 2);
        assert_eq!(summary.total_minutes, 110);
        assert_eq!(summary.amount, 36.67);
    }

    #[test]
    fn no_visits_bill_nothing() {
        let summary = invoice_summary(&group(ClientId::new(), 15.0), &[]);
        assert_eq!(summary.total_minutes, 0);
        assert_eq!(summary.amount, 0.0);
    }
}
