//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads process-wide environment variables;
//! binaries call the `*_from_env_value` helpers below and build a [`CoreConfig`] up front.

use crate::constants::{
    DEFAULT_GEOFENCE_RADIUS_M, DEFAULT_RECURRENCE_OCCURRENCES, MAX_RECURRENCE_OCCURRENCES,
};
use crate::{CareError, CareResult};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use std::str::FromStr;

/// What scheduling does when a staff member would be double-booked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Reject the appointment with `ConflictDetected`.
    #[default]
    Block,
    /// Save the appointment and report the conflicts as warnings.
    Warn,
}

impl FromStr for ConflictPolicy {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(ConflictPolicy::Block),
            "warn" => Ok(ConflictPolicy::Warn),
            other => Err(CareError::InvalidInput(format!(
                "unknown conflict policy '{other}' (expected 'block' or 'warn')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    conflict_policy: ConflictPolicy,
    agency_offset: FixedOffset,
    recurrence_occurrences: u32,
    geofence_radius_m: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            agency_offset: utc_offset(),
            recurrence_occurrences: DEFAULT_RECURRENCE_OCCURRENCES,
            geofence_radius_m: DEFAULT_GEOFENCE_RADIUS_M,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::InvalidInput`] if the geofence radius is not a positive, finite number
    /// or the recurrence occurrence count exceeds [`MAX_RECURRENCE_OCCURRENCES`].
    pub fn new(
        conflict_policy: ConflictPolicy,
        agency_offset: FixedOffset,
        recurrence_occurrences: u32,
        geofence_radius_m: f64,
    ) -> CareResult<Self> {
        if !geofence_radius_m.is_finite() || geofence_radius_m <= 0.0 {
            return Err(CareError::InvalidInput(format!(
                "geofence radius must be a positive number of metres, got {geofence_radius_m}"
            )));
        }

        if recurrence_occurrences > MAX_RECURRENCE_OCCURRENCES {
            return Err(CareError::InvalidInput(format!(
                "recurrence occurrences must be at most {MAX_RECURRENCE_OCCURRENCES}, got {recurrence_occurrences}"
            )));
        }

        Ok(Self {
            conflict_policy,
            agency_offset,
            recurrence_occurrences,
            geofence_radius_m,
        })
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    pub fn agency_offset(&self) -> FixedOffset {
        self.agency_offset
    }

    pub fn recurrence_occurrences(&self) -> u32 {
        self.recurrence_occurrences
    }

    pub fn geofence_radius_m(&self) -> f64 {
        self.geofence_radius_m
    }

    /// Calendar date of `instant` as seen by the agency.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.agency_offset).date_naive()
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the conflict policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`ConflictPolicy::Block`].
pub fn conflict_policy_from_env_value(value: Option<String>) -> CareResult<ConflictPolicy> {
    trimmed(value)
        .map(|v| v.parse::<ConflictPolicy>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse the agency UTC offset, in minutes east of UTC, from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns UTC.
pub fn agency_offset_from_env_value(value: Option<String>) -> CareResult<FixedOffset> {
    let Some(value) = trimmed(value) else {
        return Ok(utc_offset());
    };

    let minutes: i32 = value.parse().map_err(|_| {
        CareError::InvalidInput(format!("UTC offset must be whole minutes, got '{value}'"))
    })?;

    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| CareError::InvalidInput(format!("UTC offset out of range: {minutes}")))
}

/// Parse the recurrence occurrence count from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default occurrence count.
pub fn recurrence_occurrences_from_env_value(value: Option<String>) -> CareResult<u32> {
    trimmed(value)
        .map(|v| {
            v.parse::<u32>().map_err(|_| {
                CareError::InvalidInput(format!(
                    "recurrence occurrences must be a non-negative integer, got '{v}'"
                ))
            })
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(DEFAULT_RECURRENCE_OCCURRENCES))
}

/// Parse the geofence radius in metres from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default radius.
pub fn geofence_radius_from_env_value(value: Option<String>) -> CareResult<f64> {
    trimmed(value)
        .map(|v| {
            v.parse::<f64>().map_err(|_| {
                CareError::InvalidInput(format!("geofence radius must be a number, got '{v}'"))
            })
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(DEFAULT_GEOFENCE_RADIUS_M))
}
