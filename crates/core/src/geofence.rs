//! Geofence distance for visit location logs.

use crate::constants::EARTH_RADIUS_M;
use crate::error::{CareError, CareResult};
use crate::ids::{AppointmentId, LocationLogId};
use crate::model::Client;
use crate::validation::validate_coordinates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Great-circle distance in metres between two points given in decimal degrees.
///
/// Uses the mean Earth radius. The result is never negative and is exactly zero for identical
/// points.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationLogType {
    Start,
    End,
    Deviation,
}

/// A position reported by the visiting staff member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationReport {
    pub log_type: LocationLogType,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VisitLocationLog {
    pub id: LocationLogId,
    pub appointment: AppointmentId,
    pub log_type: LocationLogType,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Distance from the client's residence in metres.
    pub distance_from_client: f64,
    pub within_geofence: bool,
}

impl VisitLocationLog {
    /// Builds a log entry for `report`, measured against the client's registered residence.
    ///
    /// # Errors
    ///
    /// - [`CareError::InvalidCoordinates`] if the reported position is out of range
    /// - [`CareError::MissingClientLocation`] if the client has no coordinates
    pub fn record(
        appointment: AppointmentId,
        client: &Client,
        report: LocationReport,
        timestamp: DateTime<Utc>,
        geofence_radius_m: f64,
    ) -> CareResult<Self> {
        validate_coordinates(report.latitude, report.longitude)?;
        let residence = client
            .location()
            .ok_or(CareError::MissingClientLocation(client.id))?;

        let distance_from_client = residence.distance_to(&GeoPoint {
            latitude: report.latitude,
            longitude: report.longitude,
        });

        Ok(Self {
            id: LocationLogId::new(),
            appointment,
            log_type: report.log_type,
            latitude: report.latitude,
            longitude: report.longitude,
            timestamp,
            distance_from_client,
            within_geofence: distance_from_client <= geofence_radius_m,
        })
    }
}
