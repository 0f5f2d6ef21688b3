//! # API Shared
//!
//! Shared utilities and definitions for the care APIs.
//!
//! Contains:
//! - Wire types common to every endpoint (`HealthRes`, `ErrorRes`)
//! - Shared services like `HealthService`
//! - Request authentication helpers
//!
//! Used by `api-rest` and the combined `care-run` binary.

pub mod auth;
pub mod health;
pub mod wire;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER, STAFF_ID_HEADER};
pub use health::HealthService;
pub use wire::{ErrorRes, FieldErrorRes, HealthRes};
