//! Request authentication and JSON bodies as axum extractors.

use crate::error::ApiError;
use crate::AppState;
use api_shared::{validate_api_key, AuthError, API_KEY_HEADER, STAFF_ID_HEADER};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use care_core::{Actor, CareError, StaffId};
use serde::de::DeserializeOwned;

/// The staff member a request acts for.
///
/// Extraction checks the shared API key, then resolves `x-staff-id` to a staff member. An id
/// that matches nobody is reported as "not a staff member" so callers cannot enumerate staff ids.
#[derive(Clone, Copy, Debug)]
pub struct Acting(pub Actor);

#[axum::async_trait]
impl FromRequestParts<AppState> for Acting {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());

        validate_api_key(header(API_KEY_HEADER), &state.api_key)?;

        let staff_id: StaffId = header(STAFF_ID_HEADER)
            .and_then(|v| v.trim().parse().ok())
            .ok_or(AuthError::MissingStaffId)?;

        let actor = state
            .service
            .resolve_actor(staff_id)
            .map_err(|err| match err {
                CareError::StaffNotFound(id) => CareError::NotStaffMember(id),
                other => other,
            })?;

        Ok(Acting(actor))
    }
}

/// A JSON request body whose rejections are reported as [`ApiError`] bodies
/// rather than axum's plain-text ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}
