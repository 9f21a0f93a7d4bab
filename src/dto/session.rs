use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        format_system_time,
        validation::{validate_client_session_id, validate_game_mode},
    },
    state::{
        catalog::Song,
        session::{GameSession, Round},
        state_machine::SessionStatus,
    },
};

/// Payload used to start a new game session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub playlist_id: Uuid,
    /// `classic` (guess the title) or `artist` (guess the artist).
    #[validate(custom(function = "validate_game_mode"))]
    pub game_mode: String,
    /// Defaults to the configured round count.
    #[serde(default)]
    #[validate(range(min = 1, max = 20))]
    pub total_rounds: Option<u8>,
}

/// Session created by a start request, including the nonce required by later calls.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub game_mode: String,
    pub total_rounds: u8,
    pub total_score: u32,
    pub max_possible_score: u32,
    pub status: String,
    pub client_session_id: String,
    pub session_start_time: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NextSongRequest {
    pub game_session_id: Uuid,
    #[validate(custom(function = "validate_client_session_id"))]
    pub client_session_id: String,
}

/// Song to play. The answer fields are always `null` until the round is submitted.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SongPayload {
    pub id: Uuid,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub media_url: String,
    pub media_track_id: Option<String>,
    pub starting_offset: u32,
    pub difficulty: Option<String>,
}

/// Round and score summary returned alongside the next song.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub id: Uuid,
    pub current_round: usize,
    pub total_rounds: u8,
    pub total_score: u32,
    pub max_possible_score: u32,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextSongResponse {
    /// `true` when the session has no more songs to offer.
    pub finished: bool,
    pub song: Option<SongPayload>,
    pub game_session: SessionProgress,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub game_session_id: Uuid,
    pub song_id: Uuid,
    /// Missing guesses count as wrong answers.
    #[serde(default)]
    pub user_guess: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub hints_used: u8,
    /// Seconds spent before answering.
    #[validate(range(min = 0.0))]
    pub time_to_guess: f64,
    #[validate(custom(function = "validate_client_session_id"))]
    pub client_session_id: String,
    /// 1-based round being answered; a stale value is rejected.
    #[serde(default)]
    #[validate(range(min = 1, max = 20))]
    pub round_number: Option<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub is_correct: bool,
    pub correct_answer: String,
    pub points_earned: u32,
    pub time_to_guess: f64,
    pub hints_used: u8,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSessionSummary {
    pub id: Uuid,
    pub total_score: u32,
    pub current_round: usize,
    pub total_rounds: u8,
    pub is_complete: bool,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub round: RoundResult,
    pub game_session: SubmitSessionSummary,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub round_number: usize,
    pub song_id: Uuid,
    pub user_guess: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub hints_used: u8,
    pub time_to_guess: f64,
    pub points_earned: u32,
    pub round_start_time: String,
    pub round_end_time: String,
}

/// Full read-only view of a session with derived statistics.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub id: Uuid,
    pub user_id: String,
    pub playlist_id: Uuid,
    pub game_mode: String,
    pub status: String,
    pub total_rounds: u8,
    pub total_score: u32,
    pub max_possible_score: u32,
    pub current_round: usize,
    pub completed_rounds: usize,
    pub is_complete: bool,
    /// Percentage of correct rounds.
    pub accuracy: f64,
    pub average_time_per_round: f64,
    pub average_hints_used: f64,
    pub session_start_time: String,
    pub session_end_time: Option<String>,
    /// Milliseconds between start and completion.
    pub total_game_time: Option<u64>,
    pub last_action_time: String,
    pub rounds: Vec<RoundView>,
}

pub fn status_label(status: SessionStatus) -> String {
    match status {
        SessionStatus::Active => "active",
        SessionStatus::Completed => "completed",
        SessionStatus::Abandoned => "abandoned",
    }
    .to_owned()
}

impl From<&GameSession> for StartSessionResponse {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id,
            playlist_id: session.playlist_id,
            game_mode: session.mode.to_string(),
            total_rounds: session.total_rounds,
            total_score: session.total_score,
            max_possible_score: session.max_possible_score(),
            status: status_label(session.status),
            client_session_id: session.client_session_id.clone(),
            session_start_time: format_system_time(session.session_start_time),
        }
    }
}

impl From<&Song> for SongPayload {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id,
            title: None,
            artist: None,
            media_url: song.media_url.clone(),
            media_track_id: song.media_track_id.clone(),
            starting_offset: song.starting_offset,
            difficulty: song.difficulty.clone(),
        }
    }
}

impl From<&GameSession> for SessionProgress {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id,
            current_round: session.current_round(),
            total_rounds: session.total_rounds,
            total_score: session.total_score,
            max_possible_score: session.max_possible_score(),
            status: status_label(session.status),
        }
    }
}

impl From<&Round> for RoundResult {
    fn from(round: &Round) -> Self {
        Self {
            is_correct: round.is_correct,
            correct_answer: round.correct_answer.clone(),
            points_earned: round.points_earned,
            time_to_guess: round.time_to_guess,
            hints_used: round.hints_used,
        }
    }
}

impl From<&GameSession> for SubmitSessionSummary {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id,
            total_score: session.total_score,
            current_round: session.current_round(),
            total_rounds: session.total_rounds,
            is_complete: session.is_complete(),
            status: status_label(session.status),
        }
    }
}

impl From<&GameSession> for SessionStatusResponse {
    fn from(session: &GameSession) -> Self {
        let rounds = session
            .rounds
            .iter()
            .enumerate()
            .map(|(index, round)| RoundView {
                round_number: index + 1,
                song_id: round.song_id,
                user_guess: round.user_guess.clone(),
                correct_answer: round.correct_answer.clone(),
                is_correct: round.is_correct,
                hints_used: round.hints_used,
                time_to_guess: round.time_to_guess,
                points_earned: round.points_earned,
                round_start_time: format_system_time(round.started_at),
                round_end_time: format_system_time(round.ended_at),
            })
            .collect();

        Self {
            id: session.id,
            user_id: session.user_id.to_string(),
            playlist_id: session.playlist_id,
            game_mode: session.mode.to_string(),
            status: status_label(session.status),
            total_rounds: session.total_rounds,
            total_score: session.total_score,
            max_possible_score: session.max_possible_score(),
            current_round: session.current_round(),
            completed_rounds: session.completed_rounds(),
            is_complete: session.is_complete(),
            accuracy: session.accuracy(),
            average_time_per_round: session.average_time_per_round(),
            average_hints_used: session.average_hints_used(),
            session_start_time: format_system_time(session.session_start_time),
            session_end_time: session.session_end_time.map(format_system_time),
            total_game_time: session
                .total_game_time
                .map(|duration| duration.as_millis() as u64),
            last_action_time: format_system_time(session.last_action_time),
            rounds,
        }
    }
}
