//! REST surface: route table and handlers.

pub mod pill_apis;
pub mod schedule_apis;
pub mod user_apis;

use axum::routing::{get, post, put};
use axum::Router;

use crate::AppState;

/// The /api route table.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/pill", post(pill_apis::add_pill))
        .route("/pill/count", get(pill_apis::get_pill_count))
        .route("/pill/stop/:id", put(pill_apis::stop_pill))
        .route(
            "/pill/:id",
            post(pill_apis::add_member_pill)
                .put(pill_apis::modify_pill)
                .delete(pill_apis::delete_pill),
        )
        .route("/pill/:id/count", get(pill_apis::get_member_pill_count))
        .route("/schedule", get(schedule_apis::get_my_calendar))
        .route("/schedule/detail", get(schedule_apis::get_my_schedule))
        .route("/schedule/check", put(schedule_apis::check_schedule))
        .route("/schedule/uncheck", put(schedule_apis::uncheck_schedule))
        .route("/schedule/:member_id", get(schedule_apis::get_member_calendar))
        .route(
            "/schedule/:member_id/detail",
            get(schedule_apis::get_member_schedule),
        )
        .route(
            "/user/member",
            get(user_apis::list_members).post(user_apis::add_member),
        )
}
