//! Response envelope and the single place domain errors become HTTP.
//!
//! Every response carries `{ status, success, message, data? }` with a
//! stable (status, message) pair per failure kind; clients match on these,
//! so the mapping below is part of the API contract.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::io::alerting;

/// Stable message constants, one per (status, failure-kind) pair.
pub mod messages {
    pub const NO_AUTHENTICATED: &str = "authentication required";
    pub const NULL_VALUE: &str = "required value missing or malformed";
    pub const NO_USER: &str = "user not found";
    pub const NO_MEMBER: &str = "no member connection";
    pub const NO_PILL: &str = "pill not found";
    pub const NO_PILL_NAME: &str = "pill name must be 1 to 10 characters";
    pub const PILL_COUNT_OVER: &str = "pill limit exceeded";
    pub const PILL_UNAUTHORIZED: &str = "no permission for this pill";
    pub const ALREADY_PILL_STOP: &str = "pill already stopped";
    pub const ALREADY_MEMBER: &str = "member already connected";
    pub const NO_SCHEDULE: &str = "no schedule on that date and time";
    pub const INTERNAL_SERVER_ERROR: &str = "internal server error";

    pub const ADD_PILL_SUCCESS: &str = "pill added";
    pub const ADD_MEMBER_PILL_SUCCESS: &str = "member pill added";
    pub const READ_PILL_COUNT: &str = "pill count retrieved";
    pub const UPDATE_PILL_SUCCESS: &str = "pill updated";
    pub const STOP_PILL_SUCCESS: &str = "pill stopped";
    pub const DELETE_PILL_SUCCESS: &str = "pill deleted";
    pub const READ_CALENDAR_SUCCESS: &str = "calendar retrieved";
    pub const READ_SCHEDULE_SUCCESS: &str = "schedule retrieved";
    pub const UPDATE_SCHEDULE_CHECK: &str = "schedule check updated";
    pub const READ_MEMBER_SUCCESS: &str = "members retrieved";
    pub const ADD_MEMBER_SUCCESS: &str = "member connected";
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiEnvelope<T> {
    pub status: u16,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (
        status,
        Json(ApiEnvelope {
            status: status.as_u16(),
            success: true,
            message: message.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

pub fn fail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiEnvelope::<()> {
            status: status.as_u16(),
            success: false,
            message: message.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// Convert a domain failure into its contractual (status, message) pair.
///
/// Infrastructure faults are logged and forwarded to alerting here, and the
/// body never leaks internal detail.
pub fn domain_failure(route: &str, err: DomainError) -> Response {
    match err {
        DomainError::NonExistentUser => fail(StatusCode::NOT_FOUND, messages::NO_USER),
        DomainError::NonExistentPill => fail(StatusCode::NOT_FOUND, messages::NO_PILL),
        DomainError::NoMember => fail(StatusCode::FORBIDDEN, messages::NO_MEMBER),
        DomainError::NoPillUser => fail(StatusCode::FORBIDDEN, messages::PILL_UNAUTHORIZED),
        DomainError::PillCountOver => fail(StatusCode::BAD_REQUEST, messages::PILL_COUNT_OVER),
        DomainError::AlreadyStoppedPill => {
            fail(StatusCode::BAD_REQUEST, messages::ALREADY_PILL_STOP)
        }
        DomainError::AlreadyMember => fail(StatusCode::BAD_REQUEST, messages::ALREADY_MEMBER),
        DomainError::InvalidPillName => fail(StatusCode::BAD_REQUEST, messages::NO_PILL_NAME),
        DomainError::InvalidInput(_) => fail(StatusCode::BAD_REQUEST, messages::NULL_VALUE),
        DomainError::NonExistentSchedule => fail(StatusCode::BAD_REQUEST, messages::NO_SCHEDULE),
        DomainError::Storage(inner) => {
            tracing::error!("{} failed: {:#}", route, inner);
            alerting::report_failure(route, &inner);
            fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
