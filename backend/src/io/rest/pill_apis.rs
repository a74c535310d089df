//! Pill lifecycle endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use tracing::info;

use crate::domain::models::pill::parse_date;
use crate::io::auth::AuthUser;
use crate::io::response::{domain_failure, fail, messages, success};
use crate::AppState;
use shared::{CreatePillRequest, ModifyPillRequest, StopPillRequest};

/// POST /api/pill
pub async fn add_pill(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreatePillRequest>,
) -> Response {
    info!("POST /api/pill - user {}", user.id);

    match state.pill_service.add_pill(user.id, &request).await {
        Ok(pill) => {
            state.notifier.dispatch(user.id, "pill_added");
            success(StatusCode::OK, messages::ADD_PILL_SUCCESS, pill.to_dto())
        }
        Err(err) => domain_failure("POST /api/pill", err),
    }
}

/// POST /api/pill/:member_id
pub async fn add_member_pill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(member_id): Path<i64>,
    Json(request): Json<CreatePillRequest>,
) -> Response {
    info!("POST /api/pill/{} - user {}", member_id, user.id);

    match state
        .pill_service
        .add_member_pill(user.id, member_id, &request)
        .await
    {
        Ok(pill) => {
            state.notifier.dispatch(member_id, "pill_added");
            success(
                StatusCode::OK,
                messages::ADD_MEMBER_PILL_SUCCESS,
                pill.to_dto(),
            )
        }
        Err(err) => domain_failure("POST /api/pill/:member_id", err),
    }
}

/// GET /api/pill/count
pub async fn get_pill_count(State(state): State<AppState>, user: AuthUser) -> Response {
    info!("GET /api/pill/count - user {}", user.id);

    match state.pill_service.get_pill_count(user.id).await {
        Ok(count) => success(StatusCode::OK, messages::READ_PILL_COUNT, count),
        Err(err) => domain_failure("GET /api/pill/count", err),
    }
}

/// GET /api/pill/:member_id/count
pub async fn get_member_pill_count(
    State(state): State<AppState>,
    user: AuthUser,
    Path(member_id): Path<i64>,
) -> Response {
    info!("GET /api/pill/{}/count - user {}", member_id, user.id);

    match state
        .pill_service
        .get_member_pill_count(user.id, member_id)
        .await
    {
        Ok(count) => success(StatusCode::OK, messages::READ_PILL_COUNT, count),
        Err(err) => domain_failure("GET /api/pill/:member_id/count", err),
    }
}

/// PUT /api/pill/:pill_id
pub async fn modify_pill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pill_id): Path<i64>,
    Json(request): Json<ModifyPillRequest>,
) -> Response {
    info!("PUT /api/pill/{} - user {}", pill_id, user.id);

    match state
        .pill_service
        .modify_pill(user.id, pill_id, &request)
        .await
    {
        Ok(pill) => success(StatusCode::OK, messages::UPDATE_PILL_SUCCESS, pill.to_dto()),
        Err(err) => domain_failure("PUT /api/pill/:pill_id", err),
    }
}

/// PUT /api/pill/stop/:pill_id
pub async fn stop_pill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pill_id): Path<i64>,
    Json(request): Json<StopPillRequest>,
) -> Response {
    info!("PUT /api/pill/stop/{} - user {}", pill_id, user.id);

    let Some(stop_date) = parse_date(&request.date) else {
        return fail(StatusCode::BAD_REQUEST, messages::NULL_VALUE);
    };

    match state.pill_service.stop_pill(user.id, pill_id, stop_date).await {
        Ok(pill) => {
            state.notifier.dispatch(pill.user_id, "pill_stopped");
            success(StatusCode::OK, messages::STOP_PILL_SUCCESS, pill.to_dto())
        }
        Err(err) => domain_failure("PUT /api/pill/stop/:pill_id", err),
    }
}

/// DELETE /api/pill/:pill_id
pub async fn delete_pill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pill_id): Path<i64>,
) -> Response {
    info!("DELETE /api/pill/{} - user {}", pill_id, user.id);

    match state.pill_service.delete_pill(user.id, pill_id).await {
        Ok(()) => success(StatusCode::OK, messages::DELETE_PILL_SUCCESS, ()),
        Err(err) => domain_failure("DELETE /api/pill/:pill_id", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;

    fn request(name: &str) -> CreatePillRequest {
        CreatePillRequest {
            pill_name: name.to_string(),
            color: None,
            take_interval: Some(1),
            day: None,
            specific: None,
            time_list: vec!["08:00".to_string()],
            start: "2024-01-01".to_string(),
            end: None,
        }
    }

    async fn setup() -> (AppState, AuthUser) {
        let db = DbConnection::init_test().await.expect("test db");
        let state = AppState::new(db);
        let user = state.user_service.create_user("minji").await.unwrap();
        (state, AuthUser { id: user.id })
    }

    #[tokio::test]
    async fn test_add_pill_handler_returns_ok() {
        let (state, user) = setup().await;

        let response = add_pill(State(state), user, Json(request("vitamin"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_add_pill_handler_maps_name_validation() {
        let (state, user) = setup().await;

        let response = add_pill(State(state), user, Json(request("elevenchars"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stop_pill_handler_rejects_bad_date() {
        let (state, user) = setup().await;

        let response = stop_pill(
            State(state),
            user,
            Path(1),
            Json(StopPillRequest {
                date: "soon".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_unknown_pill_is_not_found() {
        let (state, user) = setup().await;

        let response = delete_pill(State(state), user, Path(99)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
