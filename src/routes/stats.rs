use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{ApiResponse, stats::UserStatsResponse},
    error::{AppError, ErrorBody},
    routes::identity::AuthenticatedUser,
    services::stats_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/users/me/stats", get(get_stats))
        .route("/users/me/stats/recompute", post(recompute_stats))
}

/// Lifetime statistics of the caller.
#[utoipa::path(
    get,
    path = "/users/me/stats",
    tag = "stats",
    params(("X-User-Id" = String, Header, description = "Authenticated user identity")),
    responses(
        (status = 200, description = "Current statistics", body = ApiResponse<UserStatsResponse>),
        (status = 401, description = "Missing identity", body = ErrorBody)
    )
)]
pub async fn get_stats(
    State(state): State<SharedState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ApiResponse<UserStatsResponse>>, AppError> {
    let stats = stats_service::get_user_stats(&state, user).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// Rebuild the caller's statistics from their completed sessions.
#[utoipa::path(
    post,
    path = "/users/me/stats/recompute",
    tag = "stats",
    params(("X-User-Id" = String, Header, description = "Authenticated user identity")),
    responses(
        (status = 200, description = "Recomputed statistics", body = ApiResponse<UserStatsResponse>),
        (status = 401, description = "Missing identity", body = ErrorBody)
    )
)]
pub async fn recompute_stats(
    State(state): State<SharedState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ApiResponse<UserStatsResponse>>, AppError> {
    let stats = stats_service::recompute_user_stats(&state, user).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
