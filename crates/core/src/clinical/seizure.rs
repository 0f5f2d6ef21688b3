use crate::error::{CareError, CareResult, FieldError};
use crate::ids::{AppointmentId, SeizureId};
use crate::lifecycle::elapsed_whole_minutes;
use crate::validation::{check_end_after_start, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A seizure episode observed during a visit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Seizure {
    #[serde(default)]
    pub id: SeizureId,
    pub appointment: AppointmentId,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl Seizure {
    /// Episode length in whole minutes, `None` while the episode is still open.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end_time
            .map(|end| elapsed_whole_minutes(self.start_time, end))
    }

    /// Closes an open episode at `now`.
    ///
    /// # Errors
    ///
    /// - [`CareError::SeizureAlreadyEnded`] if the episode already has an end time
    /// - [`CareError::InvalidWindow`] if `now` is not after the start time
    pub fn end(&mut self, now: DateTime<Utc>) -> CareResult<()> {
        if let Some(ended_at) = self.end_time {
            return Err(CareError::SeizureAlreadyEnded { ended_at });
        }
        if now <= self.start_time {
            return Err(CareError::InvalidWindow {
                start: self.start_time,
                end: now,
            });
        }
        self.end_time = Some(now);
        Ok(())
    }
}

impl Validate for Seizure {
    fn validate(&self) -> Vec<FieldError> {
        check_end_after_start("end_time", self.start_time, self.end_time)
            .into_iter()
            .collect()
    }
}
