use utoipa::OpenApi;

use crate::dto::{
    ApiResponse,
    session::{NextSongResponse, SessionStatusResponse, StartSessionResponse, SubmitAnswerResponse},
    stats::UserStatsResponse,
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Song Guess Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::start_session,
        crate::routes::session::next_song,
        crate::routes::session::submit_answer,
        crate::routes::session::get_session,
        crate::routes::stats::get_stats,
        crate::routes::stats::recompute_stats,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::session::StartSessionRequest,
            crate::dto::session::NextSongRequest,
            crate::dto::session::SubmitAnswerRequest,
            crate::dto::session::SongPayload,
            crate::dto::session::SessionProgress,
            crate::dto::session::RoundResult,
            crate::dto::session::SubmitSessionSummary,
            crate::dto::session::RoundView,
            crate::error::ErrorBody,
            ApiResponse<StartSessionResponse>,
            ApiResponse<NextSongResponse>,
            ApiResponse<SubmitAnswerResponse>,
            ApiResponse<SessionStatusResponse>,
            ApiResponse<UserStatsResponse>,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game-sessions", description = "Game session lifecycle"),
        (name = "stats", description = "User lifetime statistics"),
    )
)]
pub struct ApiDoc;
