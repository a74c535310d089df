//! Member-link endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use tracing::info;

use crate::io::auth::AuthUser;
use crate::io::response::{domain_failure, messages, success};
use crate::AppState;
use shared::{CreateMemberRequest, MemberListResponse};

/// GET /api/user/member
pub async fn list_members(State(state): State<AppState>, user: AuthUser) -> Response {
    info!("GET /api/user/member - user {}", user.id);

    match state.user_service.list_members(user.id).await {
        Ok(links) => success(
            StatusCode::OK,
            messages::READ_MEMBER_SUCCESS,
            MemberListResponse {
                members: links.iter().map(|l| l.to_dto()).collect(),
            },
        ),
        Err(err) => domain_failure("GET /api/user/member", err),
    }
}

/// POST /api/user/member
pub async fn add_member(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateMemberRequest>,
) -> Response {
    info!(
        "POST /api/user/member - user {} linking {}",
        user.id, request.member_id
    );

    match state
        .user_service
        .add_member(user.id, request.member_id, &request.member_name)
        .await
    {
        Ok(link) => {
            state.notifier.dispatch(request.member_id, "member_linked");
            success(StatusCode::OK, messages::ADD_MEMBER_SUCCESS, link.to_dto())
        }
        Err(err) => domain_failure("POST /api/user/member", err),
    }
}
