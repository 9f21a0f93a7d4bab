use std::{
    collections::HashSet,
    time::{Duration, SystemTime},
};

use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::{GameSessionEntity, RoundEntity, SessionStatusEntity},
    services::scoring::MAX_POINTS_PER_ROUND,
    state::{
        catalog::GameMode,
        identity::UserId,
        state_machine::{InvalidTransition, SessionEvent, SessionStatus},
    },
};

/// Number of random bytes behind a client session id.
const CLIENT_SESSION_ID_BYTES: usize = 24;

/// One answered round. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub song_id: Uuid,
    pub user_guess: String,
    /// Answer captured when the round was submitted.
    pub correct_answer: String,
    pub is_correct: bool,
    pub hints_used: u8,
    /// Seconds the player reported spending on the guess.
    pub time_to_guess: f64,
    pub points_earned: u32,
    pub started_at: SystemTime,
    pub ended_at: SystemTime,
}

/// Song handed out by next-song and still waiting for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServedSong {
    pub song_id: Uuid,
    pub served_at: SystemTime,
}

/// Reasons a round cannot be appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundRejected {
    #[error("session is {0:?}")]
    NotActive(SessionStatus),
    #[error("all {0} rounds have already been played")]
    AllRoundsPlayed(u8),
    #[error("round would push the score past the maximum of {0}")]
    ScoreOverflow(u32),
}

/// Aggregated state of a single play-through.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub id: Uuid,
    pub user_id: UserId,
    pub playlist_id: Uuid,
    pub mode: GameMode,
    pub status: SessionStatus,
    pub total_rounds: u8,
    pub total_score: u32,
    pub rounds: Vec<Round>,
    pub session_start_time: SystemTime,
    pub session_end_time: Option<SystemTime>,
    pub total_game_time: Option<Duration>,
    pub client_session_id: String,
    pub last_action_time: SystemTime,
    pub current_song: Option<ServedSong>,
    /// Version read from storage; writes are conditional on it.
    pub version: u64,
}

impl GameSession {
    /// Build a fresh active session with a newly generated client session id.
    pub fn new(
        user_id: UserId,
        playlist_id: Uuid,
        mode: GameMode,
        total_rounds: u8,
        now: SystemTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            playlist_id,
            mode,
            status: SessionStatus::Active,
            total_rounds,
            total_score: 0,
            rounds: Vec::with_capacity(usize::from(total_rounds)),
            session_start_time: now,
            session_end_time: None,
            total_game_time: None,
            client_session_id: generate_client_session_id(),
            last_action_time: now,
            current_song: None,
            version: 0,
        }
    }

    pub fn max_possible_score(&self) -> u32 {
        u32::from(self.total_rounds) * MAX_POINTS_PER_ROUND
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Whether the session is active but idle for longer than `timeout`.
    pub fn is_expired(&self, now: SystemTime, timeout: Duration) -> bool {
        self.is_active()
            && now
                .duration_since(self.last_action_time)
                .map(|idle| idle > timeout)
                .unwrap_or(false)
    }

    /// Apply a lifecycle event. Completion stamps the end time and total duration.
    pub fn apply(
        &mut self,
        event: SessionEvent,
        now: SystemTime,
    ) -> Result<SessionStatus, InvalidTransition> {
        let next = self.status.transition(event)?;
        self.status = next;
        self.current_song = None;
        if let SessionEvent::Complete = event {
            self.session_end_time = Some(now);
            self.total_game_time = Some(
                now.duration_since(self.session_start_time)
                    .unwrap_or_default(),
            );
        }
        Ok(next)
    }

    pub fn touch(&mut self, now: SystemTime) {
        self.last_action_time = now;
    }

    /// Songs already answered in this session.
    pub fn played_song_ids(&self) -> HashSet<Uuid> {
        self.rounds.iter().map(|round| round.song_id).collect()
    }

    pub fn serve_song(&mut self, song_id: Uuid, now: SystemTime) {
        self.current_song = Some(ServedSong {
            song_id,
            served_at: now,
        });
    }

    /// Append an answered round and add its points to the running score.
    pub fn record_round(&mut self, round: Round) -> Result<(), RoundRejected> {
        if !self.is_active() {
            return Err(RoundRejected::NotActive(self.status));
        }
        if self.rounds.len() >= usize::from(self.total_rounds) {
            return Err(RoundRejected::AllRoundsPlayed(self.total_rounds));
        }
        let max = self.max_possible_score();
        if self.total_score + round.points_earned > max {
            return Err(RoundRejected::ScoreOverflow(max));
        }

        self.total_score += round.points_earned;
        self.rounds.push(round);
        self.current_song = None;
        Ok(())
    }

    /// Every configured round has been answered.
    pub fn all_rounds_played(&self) -> bool {
        self.rounds.len() >= usize::from(self.total_rounds)
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn completed_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// 1-based index of the next round, `completed_rounds + 1`.
    pub fn current_round(&self) -> usize {
        self.completed_rounds() + 1
    }

    pub fn correct_rounds(&self) -> usize {
        self.rounds.iter().filter(|round| round.is_correct).count()
    }

    /// Percentage of answered rounds guessed correctly.
    pub fn accuracy(&self) -> f64 {
        if self.rounds.is_empty() {
            return 0.0;
        }
        self.correct_rounds() as f64 / self.rounds.len() as f64 * 100.0
    }

    pub fn average_time_per_round(&self) -> f64 {
        if self.rounds.is_empty() {
            return 0.0;
        }
        self.rounds.iter().map(|round| round.time_to_guess).sum::<f64>() / self.rounds.len() as f64
    }

    pub fn average_hints_used(&self) -> f64 {
        if self.rounds.is_empty() {
            return 0.0;
        }
        self.rounds
            .iter()
            .map(|round| f64::from(round.hints_used))
            .sum::<f64>()
            / self.rounds.len() as f64
    }
}

fn generate_client_session_id() -> String {
    let mut bytes = [0u8; CLIENT_SESSION_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

impl From<SessionStatusEntity> for SessionStatus {
    fn from(value: SessionStatusEntity) -> Self {
        match value {
            SessionStatusEntity::Active => SessionStatus::Active,
            SessionStatusEntity::Completed => SessionStatus::Completed,
            SessionStatusEntity::Abandoned => SessionStatus::Abandoned,
        }
    }
}

impl From<SessionStatus> for SessionStatusEntity {
    fn from(value: SessionStatus) -> Self {
        match value {
            SessionStatus::Active => SessionStatusEntity::Active,
            SessionStatus::Completed => SessionStatusEntity::Completed,
            SessionStatus::Abandoned => SessionStatusEntity::Abandoned,
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(value: RoundEntity) -> Self {
        Self {
            song_id: value.song_id,
            user_guess: value.user_guess,
            correct_answer: value.correct_answer,
            is_correct: value.is_correct,
            hints_used: value.hints_used,
            time_to_guess: value.time_to_guess,
            points_earned: value.points_earned,
            started_at: value.round_start_time,
            ended_at: value.round_end_time,
        }
    }
}

impl From<Round> for RoundEntity {
    fn from(value: Round) -> Self {
        Self {
            song_id: value.song_id,
            user_guess: value.user_guess,
            correct_answer: value.correct_answer,
            is_correct: value.is_correct,
            hints_used: value.hints_used,
            time_to_guess: value.time_to_guess,
            points_earned: value.points_earned,
            round_start_time: value.started_at,
            round_end_time: value.ended_at,
        }
    }
}

impl From<GameSessionEntity> for GameSession {
    fn from(value: GameSessionEntity) -> Self {
        let current_song = value.current_song_id.map(|song_id| ServedSong {
            song_id,
            served_at: value
                .current_song_started_at
                .unwrap_or(value.last_action_time),
        });

        Self {
            id: value.id,
            user_id: value.user_id,
            playlist_id: value.playlist_id,
            mode: value.game_mode.into(),
            status: value.status.into(),
            total_rounds: value.total_rounds,
            total_score: value.total_score,
            rounds: value.rounds.into_iter().map(Into::into).collect(),
            session_start_time: value.session_start_time,
            session_end_time: value.session_end_time,
            total_game_time: value.total_game_time_ms.map(Duration::from_millis),
            client_session_id: value.client_session_id,
            last_action_time: value.last_action_time,
            current_song,
            version: value.version,
        }
    }
}

impl From<GameSession> for GameSessionEntity {
    fn from(value: GameSession) -> Self {
        let max_possible_score = value.max_possible_score();
        Self {
            id: value.id,
            user_id: value.user_id,
            playlist_id: value.playlist_id,
            game_mode: value.mode.into(),
            status: value.status.into(),
            total_rounds: value.total_rounds,
            total_score: value.total_score,
            max_possible_score,
            rounds: value.rounds.into_iter().map(Into::into).collect(),
            session_start_time: value.session_start_time,
            session_end_time: value.session_end_time,
            total_game_time_ms: value
                .total_game_time
                .map(|duration| duration.as_millis() as u64),
            client_session_id: value.client_session_id,
            last_action_time: value.last_action_time,
            current_song_id: value.current_song.map(|served| served.song_id),
            current_song_started_at: value.current_song.map(|served| served.served_at),
            version: value.version,
        }
    }
}
