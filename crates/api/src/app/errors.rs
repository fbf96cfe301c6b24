use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use tradeerp_auth::AuthzError;
use tradeerp_core::DomainError;
use tradeerp_infra::StoreError;
use tradeerp_notifications::NotificationError;
use tradeerp_validation::RequestError;

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("{0} not found")]
    NotFound(String),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Request(e) => request_error_to_response(e),
            ApiError::Domain(e) => domain_error_to_response(e),
            ApiError::Authz(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
            ApiError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
            }
            ApiError::Notification(e) => {
                tracing::error!(error = %e, "notification store failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "notification_error", e.to_string())
            }
        }
    }
}

pub fn request_error_to_response(err: RequestError) -> Response {
    match err {
        RequestError::Forbidden(message) => json_error(StatusCode::FORBIDDEN, "forbidden", message),
        RequestError::Invalid(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "message": "The given data was invalid.",
                "errors": errors,
            })),
        )
            .into_response(),
        RequestError::Malformed(message) => json_error(StatusCode::BAD_REQUEST, "malformed_request", message),
        RequestError::Presence(e) => {
            tracing::error!(error = %e, "presence lookup failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "presence_error", e.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized"),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use tradeerp_validation::ValidationErrors;

    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "The email field is required.");

        let cases = [
            (ApiError::from(RequestError::Forbidden("no".into())), StatusCode::FORBIDDEN),
            (ApiError::from(RequestError::Invalid(errors)), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::from(RequestError::Malformed("array".into())), StatusCode::BAD_REQUEST),
            (ApiError::from(DomainError::conflict("dup")), StatusCode::CONFLICT),
            (ApiError::from(DomainError::not_found("order 9")), StatusCode::NOT_FOUND),
            (ApiError::not_found("product 3"), StatusCode::NOT_FOUND),
            (ApiError::from(AuthzError::TenantMismatch), StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
