//! Domain records owned by the visit core.
//!
//! Clinical child records (seizures, incidents, medications, body maps) live beside their
//! validators in [`crate::clinical`]; location logs live in [`crate::geofence`].

pub mod appointment;
pub mod client;
pub mod staff;

pub use appointment::{Appointment, AppointmentStatus, Recurrence};
pub use client::{ChecklistItem, Client};
pub use staff::{Actor, StaffMember, StaffRole};
