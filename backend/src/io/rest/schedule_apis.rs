//! Calendar, day-checklist and check-toggle endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::domain::models::pill::{parse_date, parse_time};
use crate::domain::schedule_service::parse_month_param;
use crate::io::auth::AuthUser;
use crate::io::response::{domain_failure, fail, messages, success};
use crate::AppState;
use shared::{DayScheduleResponse, ScheduleCheckRequest};

/// Query parameters shared by the calendar and detail endpoints.
#[derive(Deserialize, Debug)]
pub struct ScheduleQuery {
    pub date: Option<String>,
}

/// GET /api/schedule?date=YYYY-MM
pub async fn get_my_calendar(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ScheduleQuery>,
) -> Response {
    info!("GET /api/schedule - user {} query {:?}", user.id, query);

    let Some((year, month)) = query.date.as_deref().and_then(parse_month_param) else {
        return fail(StatusCode::BAD_REQUEST, messages::NULL_VALUE);
    };

    match state.schedule_service.month_calendar(user.id, year, month).await {
        Ok(calendar) => success(StatusCode::OK, messages::READ_CALENDAR_SUCCESS, calendar),
        Err(err) => domain_failure("GET /api/schedule", err),
    }
}

/// GET /api/schedule/detail?date=YYYY-MM-DD
pub async fn get_my_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ScheduleQuery>,
) -> Response {
    info!("GET /api/schedule/detail - user {} query {:?}", user.id, query);

    let Some(date) = query.date.as_deref().and_then(parse_date) else {
        return fail(StatusCode::BAD_REQUEST, messages::NULL_VALUE);
    };

    match state.schedule_service.day_schedule(user.id, date).await {
        Ok(entries) => success(
            StatusCode::OK,
            messages::READ_SCHEDULE_SUCCESS,
            DayScheduleResponse {
                date: query.date.unwrap_or_default(),
                schedules: entries.iter().map(|e| e.to_dto()).collect(),
            },
        ),
        Err(err) => domain_failure("GET /api/schedule/detail", err),
    }
}

/// GET /api/schedule/:member_id?date=YYYY-MM
pub async fn get_member_calendar(
    State(state): State<AppState>,
    user: AuthUser,
    Path(member_id): Path<i64>,
    Query(query): Query<ScheduleQuery>,
) -> Response {
    info!("GET /api/schedule/{} - user {}", member_id, user.id);

    let Some((year, month)) = query.date.as_deref().and_then(parse_month_param) else {
        return fail(StatusCode::BAD_REQUEST, messages::NULL_VALUE);
    };

    match state
        .schedule_service
        .member_month_calendar(user.id, member_id, year, month)
        .await
    {
        Ok(calendar) => success(StatusCode::OK, messages::READ_CALENDAR_SUCCESS, calendar),
        Err(err) => domain_failure("GET /api/schedule/:member_id", err),
    }
}

/// GET /api/schedule/:member_id/detail?date=YYYY-MM-DD
pub async fn get_member_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(member_id): Path<i64>,
    Query(query): Query<ScheduleQuery>,
) -> Response {
    info!("GET /api/schedule/{}/detail - user {}", member_id, user.id);

    let Some(date) = query.date.as_deref().and_then(parse_date) else {
        return fail(StatusCode::BAD_REQUEST, messages::NULL_VALUE);
    };

    match state
        .schedule_service
        .member_day_schedule(user.id, member_id, date)
        .await
    {
        Ok(entries) => success(
            StatusCode::OK,
            messages::READ_SCHEDULE_SUCCESS,
            DayScheduleResponse {
                date: query.date.unwrap_or_default(),
                schedules: entries.iter().map(|e| e.to_dto()).collect(),
            },
        ),
        Err(err) => domain_failure("GET /api/schedule/:member_id/detail", err),
    }
}

/// PUT /api/schedule/check
pub async fn check_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ScheduleCheckRequest>,
) -> Response {
    info!("PUT /api/schedule/check - user {}", user.id);
    toggle_schedule(state, user, request, true).await
}

/// PUT /api/schedule/uncheck
pub async fn uncheck_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ScheduleCheckRequest>,
) -> Response {
    info!("PUT /api/schedule/uncheck - user {}", user.id);
    toggle_schedule(state, user, request, false).await
}

async fn toggle_schedule(
    state: AppState,
    user: AuthUser,
    request: ScheduleCheckRequest,
    checked: bool,
) -> Response {
    let (Some(date), Some(time)) = (parse_date(&request.date), parse_time(&request.time)) else {
        return fail(StatusCode::BAD_REQUEST, messages::NULL_VALUE);
    };

    let result = if checked {
        state
            .schedule_service
            .check(user.id, request.pill_id, date, time)
            .await
    } else {
        state
            .schedule_service
            .uncheck(user.id, request.pill_id, date, time)
            .await
    };

    match result {
        Ok(check_state) => success(
            StatusCode::OK,
            messages::UPDATE_SCHEDULE_CHECK,
            check_state.to_response(),
        ),
        Err(err) => domain_failure("PUT /api/schedule/check", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;
    use shared::CreatePillRequest;

    async fn setup() -> (AppState, AuthUser) {
        let db = DbConnection::init_test().await.expect("test db");
        let state = AppState::new(db);
        let user = state.user_service.create_user("minji").await.unwrap();
        let auth = AuthUser { id: user.id };
        state
            .pill_service
            .add_pill(
                user.id,
                &CreatePillRequest {
                    pill_name: "vitamin".to_string(),
                    color: None,
                    take_interval: None,
                    day: Some(vec!["mon".to_string()]),
                    specific: None,
                    time_list: vec!["08:00".to_string()],
                    start: "2024-01-01".to_string(),
                    end: None,
                },
            )
            .await
            .unwrap();
        (state, auth)
    }

    #[tokio::test]
    async fn test_calendar_requires_a_date_param() {
        let (state, user) = setup().await;

        let response =
            get_my_calendar(State(state), user, Query(ScheduleQuery { date: None })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_calendar_happy_path() {
        let (state, user) = setup().await;

        let response = get_my_calendar(
            State(state),
            user,
            Query(ScheduleQuery {
                date: Some("2024-01".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_detail_happy_path() {
        let (state, user) = setup().await;

        let response = get_my_schedule(
            State(state),
            user,
            Query(ScheduleQuery {
                date: Some("2024-01-01".to_string()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_check_with_malformed_time_is_rejected() {
        let (state, user) = setup().await;

        let response = check_schedule(
            State(state),
            user,
            Json(ScheduleCheckRequest {
                pill_id: 1,
                date: "2024-01-01".to_string(),
                time: "morning".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
