use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        ApiResponse,
        session::{
            NextSongRequest, NextSongResponse, SessionStatusResponse, StartSessionRequest,
            StartSessionResponse, SubmitAnswerRequest, SubmitAnswerResponse,
        },
    },
    error::{AppError, ErrorBody},
    routes::identity::{AuthenticatedUser, ValidatedJson},
    services::session_service,
    state::SharedState,
};

/// Routes driving a game session from start to completion.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game-sessions", post(start_session))
        .route("/game-sessions/next-song", post(next_song))
        .route("/game-sessions/submit", post(submit_answer))
        .route("/game-sessions/{session_id}", get(get_session))
}

/// Start a game session, abandoning any other active session of the caller.
#[utoipa::path(
    post,
    path = "/game-sessions",
    tag = "game-sessions",
    params(("X-User-Id" = String, Header, description = "Authenticated user identity")),
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "Session started", body = ApiResponse<StartSessionResponse>),
        (status = 400, description = "Invalid request or playlist", body = ErrorBody),
        (status = 401, description = "Missing identity", body = ErrorBody),
        (status = 404, description = "Playlist not found", body = ErrorBody)
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<StartSessionRequest>,
) -> Result<Json<ApiResponse<StartSessionResponse>>, AppError> {
    let session = session_service::start_session(&state, user, payload).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// Serve the song of the current round.
#[utoipa::path(
    post,
    path = "/game-sessions/next-song",
    tag = "game-sessions",
    params(("X-User-Id" = String, Header, description = "Authenticated user identity")),
    request_body = NextSongRequest,
    responses(
        (status = 200, description = "Song served, or session finished", body = ApiResponse<NextSongResponse>),
        (status = 400, description = "Session not active", body = ErrorBody),
        (status = 403, description = "Not the owner or wrong client session", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody),
        (status = 408, description = "Session expired", body = ErrorBody)
    )
)]
pub async fn next_song(
    State(state): State<SharedState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<NextSongRequest>,
) -> Result<Json<ApiResponse<NextSongResponse>>, AppError> {
    let next = session_service::next_song(&state, user, payload).await?;
    Ok(Json(ApiResponse::ok(next)))
}

/// Submit a guess for the served song.
#[utoipa::path(
    post,
    path = "/game-sessions/submit",
    tag = "game-sessions",
    params(("X-User-Id" = String, Header, description = "Authenticated user identity")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Round scored", body = ApiResponse<SubmitAnswerResponse>),
        (status = 400, description = "Invalid input or session state", body = ErrorBody),
        (status = 403, description = "Not the owner or wrong client session", body = ErrorBody),
        (status = 404, description = "Session or song not found", body = ErrorBody),
        (status = 408, description = "Session expired", body = ErrorBody),
        (status = 409, description = "Concurrent update", body = ErrorBody)
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<SubmitAnswerRequest>,
) -> Result<Json<ApiResponse<SubmitAnswerResponse>>, AppError> {
    let result = session_service::submit_answer(&state, user, payload).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// Fetch a session with its rounds and derived statistics.
#[utoipa::path(
    get,
    path = "/game-sessions/{session_id}",
    tag = "game-sessions",
    params(
        ("X-User-Id" = String, Header, description = "Authenticated user identity"),
        ("session_id" = Uuid, Path, description = "Identifier of the game session")
    ),
    responses(
        (status = 200, description = "Session state", body = ApiResponse<SessionStatusResponse>),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody)
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionStatusResponse>>, AppError> {
    let session_id = Uuid::parse_str(&session_id)
        .map_err(|_| AppError::BadRequest(format!("invalid session id `{session_id}`")))?;
    let status = session_service::get_status(&state, user, session_id).await?;
    Ok(Json(ApiResponse::ok(status)))
}
