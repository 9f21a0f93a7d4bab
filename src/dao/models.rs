use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::identity::UserId;

/// Game mode persisted alongside a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameModeEntity {
    Classic,
    Artist,
}

/// Lifecycle status persisted alongside a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatusEntity {
    Active,
    Completed,
    Abandoned,
}

impl SessionStatusEntity {
    /// Textual form used by backends that filter on the status column.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatusEntity::Active => "active",
            SessionStatusEntity::Completed => "completed",
            SessionStatusEntity::Abandoned => "abandoned",
        }
    }
}

/// Song catalog entry, read-only from the game's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongEntity {
    /// Stable identifier for the song.
    pub id: Uuid,
    /// Song title, the answer of classic games.
    #[serde(default)]
    pub title: Option<String>,
    /// Performing artist, the answer of artist games.
    #[serde(default)]
    pub artist: Option<String>,
    /// URL of the playable media resource.
    pub media_url: String,
    /// Track identifier understood by the embedded player.
    #[serde(default)]
    pub media_track_id: Option<String>,
    /// Offset (seconds) where the clip starts.
    #[serde(default)]
    pub starting_offset: u32,
    /// Free-form difficulty label.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Inactive songs are never served.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Playlist definition referencing catalog songs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistEntity {
    /// Stable identifier for the playlist.
    pub id: Uuid,
    /// Human readable playlist name.
    pub name: String,
    /// Songs eligible for games started on this playlist.
    pub song_ids: Vec<Uuid>,
    /// Inactive playlists cannot seed new games.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// One answered round embedded in a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundEntity {
    pub song_id: Uuid,
    pub user_guess: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub hints_used: u8,
    pub time_to_guess: f64,
    pub points_earned: u32,
    pub round_start_time: SystemTime,
    pub round_end_time: SystemTime,
}

/// Aggregate game session persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSessionEntity {
    /// Primary key of the session.
    pub id: Uuid,
    /// Owner of the session in canonical form.
    pub user_id: UserId,
    /// Playlist the songs are drawn from.
    pub playlist_id: Uuid,
    pub game_mode: GameModeEntity,
    pub status: SessionStatusEntity,
    pub total_rounds: u8,
    pub total_score: u32,
    pub max_possible_score: u32,
    /// Answered rounds in play order.
    pub rounds: Vec<RoundEntity>,
    pub session_start_time: SystemTime,
    pub session_end_time: Option<SystemTime>,
    /// Wall-clock duration of the whole game in milliseconds.
    pub total_game_time_ms: Option<u64>,
    /// Nonce binding the session to the browser context that created it.
    pub client_session_id: String,
    pub last_action_time: SystemTime,
    /// Song served by the latest next-song call and not answered yet.
    pub current_song_id: Option<Uuid>,
    pub current_song_started_at: Option<SystemTime>,
    /// Optimistic concurrency counter, bumped on every write.
    pub version: u64,
}

/// Lifetime statistics of a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStatsEntity {
    pub user_id: UserId,
    pub games_played: u32,
    pub games_won: u32,
    pub total_score: u64,
    pub best_score: u32,
    pub average_score: f64,
    pub updated_at: SystemTime,
}

impl UserStatsEntity {
    /// Fresh statistics for a user that never completed a game.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            games_played: 0,
            games_won: 0,
            total_score: 0,
            best_score: 0,
            average_score: 0.0,
            updated_at: SystemTime::now(),
        }
    }
}

fn default_active() -> bool {
    true
}
