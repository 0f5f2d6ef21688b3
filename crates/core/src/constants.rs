//! Constants used throughout the care core crate.
//!
//! Business constants live here so the rules that depend on them read the same everywhere.

/// Mean Earth radius in metres, used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Number of further occurrences generated for a recurring appointment.
pub const DEFAULT_RECURRENCE_OCCURRENCES: u32 = 5;

/// Upper bound on the configured recurrence occurrence count (a year of daily visits).
pub const MAX_RECURRENCE_OCCURRENCES: u32 = 366;

/// Monthly recurrences are approximated as a fixed number of days.
pub const MONTHLY_RECURRENCE_DAYS: i64 = 30;

/// Default radius around a client's residence inside which a location log counts as on-site.
pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 100.0;

/// Maximum number of appointments returned by the "upcoming" staff view.
pub const UPCOMING_LIMIT: usize = 10;

/// Window for the "recent incidents" staff view.
pub const RECENT_INCIDENT_DAYS: i64 = 30;

/// Look-back and look-ahead window used by the staff dashboard.
pub const DASHBOARD_WINDOW_DAYS: i64 = 7;

/// Seconds per minute, for whole-minute durations.
pub const SECONDS_PER_MINUTE: i64 = 60;
