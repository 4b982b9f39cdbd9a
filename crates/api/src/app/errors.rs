use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use apflow_core::DomainError;
use apflow_infra::UpdateError;

pub fn update_error_to_response(err: UpdateError) -> axum::response::Response {
    match err {
        UpdateError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", err.to_string())
        }
        UpdateError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
        UpdateError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        UpdateError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        UpdateError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        UpdateError::MatchDependency(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "matching_unavailable", msg)
        }
        UpdateError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    update_error_to_response(err.into())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
