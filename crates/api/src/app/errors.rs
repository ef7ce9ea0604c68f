use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use planora_core::DomainError;
use planora_infra::document_store::StoreError;
use planora_infra::reservations::ReservationError;
use planora_inventory::AdmissionError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => {
            json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized")
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::DuplicateId(msg) => json_error(StatusCode::CONFLICT, "duplicate_id", msg),
        StoreError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::InvalidQuery(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_query", msg)
        }
        StoreError::Backend(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn reservation_error_to_response(err: ReservationError) -> axum::response::Response {
    match err {
        ReservationError::NotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "inventory item not found")
        }
        ReservationError::Admission(AdmissionError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        ReservationError::Admission(err @ AdmissionError::CapacityExceeded {
            available, ..
        }) => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "capacity_exceeded",
                "message": err.to_string(),
                "available": available,
            })),
        )
            .into_response(),
        ReservationError::Contention(item_id) => json_error(
            StatusCode::CONFLICT,
            "conflict",
            format!("concurrent reservations on item {item_id}; retry the request"),
        ),
        ReservationError::CancellationDisabled => json_error(
            StatusCode::FORBIDDEN,
            "cancellation_disabled",
            "reservation cancellation is disabled on this deployment",
        ),
        ReservationError::ReservationNotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "reservation not found")
        }
        ReservationError::Store(err) => store_error_to_response(err),
    }
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
