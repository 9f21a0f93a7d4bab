//! BSON document shapes. Identifiers are stored as hyphenated UUID strings so
//! that filters built with `doc!` and typed documents always agree.

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{
        GameModeEntity, GameSessionEntity, PlaylistEntity, RoundEntity, SessionStatusEntity,
        SongEntity, UserStatsEntity,
    },
    state::identity::UserId,
};

pub const SESSION_COLLECTION_NAME: &str = "game_sessions";
pub const PLAYLIST_COLLECTION_NAME: &str = "playlists";
pub const SONG_COLLECTION_NAME: &str = "songs";
pub const STATS_COLLECTION_NAME: &str = "user_stats";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoundDocument {
    song_id: String,
    user_guess: String,
    correct_answer: String,
    is_correct: bool,
    hints_used: i32,
    time_to_guess: f64,
    points_earned: i64,
    round_start_time: DateTime,
    round_end_time: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: String,
    user_id: String,
    playlist_id: String,
    game_mode: GameModeEntity,
    status: SessionStatusEntity,
    total_rounds: i32,
    total_score: i64,
    max_possible_score: i64,
    #[serde(default)]
    rounds: Vec<MongoRoundDocument>,
    session_start_time: DateTime,
    session_end_time: Option<DateTime>,
    total_game_time_ms: Option<i64>,
    client_session_id: String,
    last_action_time: DateTime,
    current_song_id: Option<String>,
    current_song_started_at: Option<DateTime>,
    #[serde(default)]
    version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSongDocument {
    #[serde(rename = "_id")]
    id: String,
    title: Option<String>,
    artist: Option<String>,
    media_url: String,
    media_track_id: Option<String>,
    #[serde(default)]
    starting_offset: i64,
    difficulty: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlaylistDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    song_ids: Vec<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStatsDocument {
    #[serde(rename = "_id")]
    user_id: String,
    games_played: i64,
    games_won: i64,
    total_score: i64,
    best_score: i64,
    average_score: f64,
    updated_at: DateTime,
}

fn default_active() -> bool {
    true
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

fn parse_uuid(collection: &'static str, owner: &str, value: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(value).map_err(|err| MongoDaoError::CorruptDocument {
        collection,
        id: owner.to_owned(),
        reason: format!("invalid uuid `{value}`: {err}"),
    })
}

fn parse_user(collection: &'static str, owner: &str, value: &str) -> MongoResult<UserId> {
    parse_uuid(collection, owner, value).map(UserId::new)
}

fn narrow<T: TryFrom<i64>>(collection: &'static str, owner: &str, field: &str, value: i64) -> MongoResult<T> {
    T::try_from(value).map_err(|_| MongoDaoError::CorruptDocument {
        collection,
        id: owner.to_owned(),
        reason: format!("`{field}` out of range: {value}"),
    })
}

impl From<RoundEntity> for MongoRoundDocument {
    fn from(value: RoundEntity) -> Self {
        Self {
            song_id: value.song_id.to_string(),
            user_guess: value.user_guess,
            correct_answer: value.correct_answer,
            is_correct: value.is_correct,
            hints_used: i32::from(value.hints_used),
            time_to_guess: value.time_to_guess,
            points_earned: i64::from(value.points_earned),
            round_start_time: DateTime::from_system_time(value.round_start_time),
            round_end_time: DateTime::from_system_time(value.round_end_time),
        }
    }
}

impl From<GameSessionEntity> for MongoSessionDocument {
    fn from(value: GameSessionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            user_id: value.user_id.to_string(),
            playlist_id: value.playlist_id.to_string(),
            game_mode: value.game_mode,
            status: value.status,
            total_rounds: i32::from(value.total_rounds),
            total_score: i64::from(value.total_score),
            max_possible_score: i64::from(value.max_possible_score),
            rounds: value.rounds.into_iter().map(Into::into).collect(),
            session_start_time: DateTime::from_system_time(value.session_start_time),
            session_end_time: value.session_end_time.map(DateTime::from_system_time),
            total_game_time_ms: value.total_game_time_ms.map(|ms| ms as i64),
            client_session_id: value.client_session_id,
            last_action_time: DateTime::from_system_time(value.last_action_time),
            current_song_id: value.current_song_id.map(|id| id.to_string()),
            current_song_started_at: value.current_song_started_at.map(DateTime::from_system_time),
            version: value.version as i64,
        }
    }
}

impl TryFrom<MongoSessionDocument> for GameSessionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSessionDocument) -> Result<Self, Self::Error> {
        const C: &str = SESSION_COLLECTION_NAME;
        let owner = value.id.clone();

        let rounds = value
            .rounds
            .into_iter()
            .map(|round| {
                Ok(RoundEntity {
                    song_id: parse_uuid(C, &owner, &round.song_id)?,
                    user_guess: round.user_guess,
                    correct_answer: round.correct_answer,
                    is_correct: round.is_correct,
                    hints_used: narrow(C, &owner, "hints_used", i64::from(round.hints_used))?,
                    time_to_guess: round.time_to_guess,
                    points_earned: narrow(C, &owner, "points_earned", round.points_earned)?,
                    round_start_time: round.round_start_time.to_system_time(),
                    round_end_time: round.round_end_time.to_system_time(),
                })
            })
            .collect::<MongoResult<Vec<_>>>()?;

        Ok(Self {
            id: parse_uuid(C, &owner, &value.id)?,
            user_id: parse_user(C, &owner, &value.user_id)?,
            playlist_id: parse_uuid(C, &owner, &value.playlist_id)?,
            game_mode: value.game_mode,
            status: value.status,
            total_rounds: narrow(C, &owner, "total_rounds", i64::from(value.total_rounds))?,
            total_score: narrow(C, &owner, "total_score", value.total_score)?,
            max_possible_score: narrow(C, &owner, "max_possible_score", value.max_possible_score)?,
            rounds,
            session_start_time: value.session_start_time.to_system_time(),
            session_end_time: value.session_end_time.map(|at| at.to_system_time()),
            total_game_time_ms: value
                .total_game_time_ms
                .map(|ms| narrow(C, &owner, "total_game_time_ms", ms))
                .transpose()?,
            client_session_id: value.client_session_id,
            last_action_time: value.last_action_time.to_system_time(),
            current_song_id: value
                .current_song_id
                .map(|id| parse_uuid(C, &owner, &id))
                .transpose()?,
            current_song_started_at: value.current_song_started_at.map(|at| at.to_system_time()),
            version: narrow(C, &owner, "version", value.version)?,
        })
    }
}

impl From<SongEntity> for MongoSongDocument {
    fn from(value: SongEntity) -> Self {
        Self {
            id: value.id.to_string(),
            title: value.title,
            artist: value.artist,
            media_url: value.media_url,
            media_track_id: value.media_track_id,
            starting_offset: i64::from(value.starting_offset),
            difficulty: value.difficulty,
            is_active: value.is_active,
        }
    }
}

impl TryFrom<MongoSongDocument> for SongEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSongDocument) -> Result<Self, Self::Error> {
        const C: &str = SONG_COLLECTION_NAME;
        Ok(Self {
            id: parse_uuid(C, &value.id, &value.id)?,
            starting_offset: narrow(C, &value.id, "starting_offset", value.starting_offset)?,
            title: value.title,
            artist: value.artist,
            media_url: value.media_url,
            media_track_id: value.media_track_id,
            difficulty: value.difficulty,
            is_active: value.is_active,
        })
    }
}

impl From<PlaylistEntity> for MongoPlaylistDocument {
    fn from(value: PlaylistEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            song_ids: value.song_ids.iter().map(Uuid::to_string).collect(),
            is_active: value.is_active,
        }
    }
}

impl TryFrom<MongoPlaylistDocument> for PlaylistEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlaylistDocument) -> Result<Self, Self::Error> {
        const C: &str = PLAYLIST_COLLECTION_NAME;
        let song_ids = value
            .song_ids
            .iter()
            .map(|id| parse_uuid(C, &value.id, id))
            .collect::<MongoResult<Vec<_>>>()?;
        Ok(Self {
            id: parse_uuid(C, &value.id, &value.id)?,
            name: value.name,
            song_ids,
            is_active: value.is_active,
        })
    }
}

impl From<UserStatsEntity> for MongoStatsDocument {
    fn from(value: UserStatsEntity) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            games_played: i64::from(value.games_played),
            games_won: i64::from(value.games_won),
            total_score: value.total_score as i64,
            best_score: i64::from(value.best_score),
            average_score: value.average_score,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoStatsDocument> for UserStatsEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoStatsDocument) -> Result<Self, Self::Error> {
        const C: &str = STATS_COLLECTION_NAME;
        let owner = value.user_id.clone();
        Ok(Self {
            user_id: parse_user(C, &owner, &value.user_id)?,
            games_played: narrow(C, &owner, "games_played", value.games_played)?,
            games_won: narrow(C, &owner, "games_won", value.games_won)?,
            total_score: narrow(C, &owner, "total_score", value.total_score)?,
            best_score: narrow(C, &owner, "best_score", value.best_score)?,
            average_score: value.average_score,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}
