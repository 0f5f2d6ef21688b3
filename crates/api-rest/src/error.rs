//! Mapping of core and auth failures to HTTP responses.
//!
//! Every error body is an [`ErrorRes`], including malformed request bodies rejected by
//! [`crate::extract::ApiJson`]. Validation failures carry one entry per violated rule.

use api_shared::{AuthError, ErrorRes, FieldErrorRes};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use care_core::CareError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Care(#[from] CareError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Body(#[from] JsonRejection),
}

/// Status and stable error code for a request body that could not be read as JSON.
fn body_rejection_status(rejection: &JsonRejection) -> (StatusCode, &'static str) {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type")
        }
        JsonRejection::JsonSyntaxError(_) => (StatusCode::BAD_REQUEST, "malformed_json"),
        JsonRejection::JsonDataError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_body"),
        _ => (rejection.status(), "invalid_body"),
    }
}

/// HTTP status and stable error code for a core failure.
pub fn care_error_status(err: &CareError) -> (StatusCode, &'static str) {
    use CareError::*;
    match err {
        InvalidWindow { .. } => (StatusCode::BAD_REQUEST, "invalid_window"),
        AlreadyStarted { .. } => (StatusCode::BAD_REQUEST, "already_started"),
        AlreadyEnded { .. } => (StatusCode::BAD_REQUEST, "already_ended"),
        NotStarted => (StatusCode::BAD_REQUEST, "not_started"),
        NotToday { .. } => (StatusCode::BAD_REQUEST, "not_today"),
        InvalidTransition { .. } => (StatusCode::BAD_REQUEST, "invalid_transition"),
        StartNotInFuture { .. } => (StatusCode::BAD_REQUEST, "start_not_in_future"),
        SeizureAlreadyEnded { .. } => (StatusCode::BAD_REQUEST, "seizure_already_ended"),
        MissingClientLocation(_) => (StatusCode::BAD_REQUEST, "missing_client_location"),
        InvalidCoordinates { .. } => (StatusCode::BAD_REQUEST, "invalid_coordinates"),
        NegativeRate(_) => (StatusCode::BAD_REQUEST, "negative_rate"),
        Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
        InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),

        NotAssigned { .. } => (StatusCode::FORBIDDEN, "not_assigned"),
        NotStaffMember(_) => (StatusCode::FORBIDDEN, "not_staff_member"),
        NotPermitted { .. } => (StatusCode::FORBIDDEN, "not_permitted"),

        AppointmentNotFound(_) => (StatusCode::NOT_FOUND, "appointment_not_found"),
        ClientNotFound(_) => (StatusCode::NOT_FOUND, "client_not_found"),
        SeizureNotFound(_) => (StatusCode::NOT_FOUND, "seizure_not_found"),
        StaffNotFound(_) => (StatusCode::NOT_FOUND, "staff_not_found"),
        InvoiceGroupNotFound(_) => (StatusCode::NOT_FOUND, "invoice_group_not_found"),
        NoteNotFound(_) => (StatusCode::NOT_FOUND, "note_not_found"),

        ConflictDetected { .. } => (StatusCode::CONFLICT, "conflict_detected"),

        SeedRead(_) | SeedParse { .. } | StorePoisoned => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    }
}

fn care_error_body(err: &CareError) -> ErrorRes {
    let (_, code) = care_error_status(err);
    match err {
        CareError::Validation(errors) => ErrorRes::new(code, err.to_string()).with_fields(
            errors
                .iter()
                .map(|e| FieldErrorRes {
                    field: e.field().to_string(),
                    code: e.code().to_string(),
                    message: e.to_string(),
                })
                .collect(),
        ),
        CareError::ConflictDetected { conflicting } => {
            let ids: Vec<String> = conflicting.iter().map(ToString::to_string).collect();
            ErrorRes::new(code, format!("{err}: {}", ids.join(", ")))
        }
        CareError::SeedRead(_) | CareError::SeedParse { .. } | CareError::StorePoisoned => {
            ErrorRes::new(code, "An internal error occurred")
        }
        _ => ErrorRes::new(code, err.to_string()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Care(err) => {
                let (status, _) = care_error_status(err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                } else {
                    tracing::debug!(error = %err, "request rejected");
                }
                (status, care_error_body(err))
            }
            ApiError::Auth(err) => {
                let code = match err {
                    AuthError::MissingApiKey => "missing_api_key",
                    AuthError::InvalidApiKey => "invalid_api_key",
                    AuthError::MissingStaffId => "missing_staff_id",
                };
                (StatusCode::UNAUTHORIZED, ErrorRes::new(code, err.to_string()))
            }
            ApiError::Body(rejection) => {
                let (status, code) = body_rejection_status(rejection);
                tracing::debug!(error = %rejection.body_text(), "request body rejected");
                (status, ErrorRes::new(code, rejection.body_text()))
            }
        };

        (status, Json(body)).into_response()
    }
}
