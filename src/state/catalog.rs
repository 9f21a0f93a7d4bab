use std::{fmt, str::FromStr};

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{GameModeEntity, PlaylistEntity, SongEntity};

/// Which song attribute the player has to guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// Guess the song title.
    Classic,
    /// Guess the performing artist.
    Artist,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game mode `{0}` (expected `classic` or `artist`)")]
pub struct UnknownGameMode(pub String);

impl GameMode {
    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Artist => "artist",
        }
    }
}

impl FromStr for GameMode {
    type Err = UnknownGameMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "classic" => Ok(GameMode::Classic),
            "artist" => Ok(GameMode::Artist),
            other => Err(UnknownGameMode(other.to_owned())),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog song as seen by the game logic.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    /// Stable identifier for the song.
    pub id: Uuid,
    /// Song title.
    pub title: Option<String>,
    /// Performing artist.
    pub artist: Option<String>,
    /// URL of the playable media resource.
    pub media_url: String,
    /// Track identifier understood by the embedded player.
    pub media_track_id: Option<String>,
    /// Offset (seconds) where the clip starts.
    pub starting_offset: u32,
    /// Free-form difficulty label.
    pub difficulty: Option<String>,
    /// Inactive songs are never served.
    pub is_active: bool,
}

impl Song {
    /// Canonical answer for `mode`, ignoring blank values.
    pub fn answer_for(&self, mode: GameMode) -> Option<&str> {
        let value = match mode {
            GameMode::Classic => self.title.as_deref(),
            GameMode::Artist => self.artist.as_deref(),
        };
        value.map(str::trim).filter(|answer| !answer.is_empty())
    }

    /// Whether the song can be served in a game of the given mode.
    pub fn is_playable(&self, mode: GameMode) -> bool {
        self.is_active && self.answer_for(mode).is_some()
    }
}

/// Playlist a game draws its songs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub song_ids: Vec<Uuid>,
    pub is_active: bool,
}

impl Playlist {
    /// Number of songs referenced by the playlist, duplicates excluded.
    pub fn song_count(&self) -> usize {
        let mut ids = self.song_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

impl From<GameModeEntity> for GameMode {
    fn from(value: GameModeEntity) -> Self {
        match value {
            GameModeEntity::Classic => GameMode::Classic,
            GameModeEntity::Artist => GameMode::Artist,
        }
    }
}

impl From<GameMode> for GameModeEntity {
    fn from(value: GameMode) -> Self {
        match value {
            GameMode::Classic => GameModeEntity::Classic,
            GameMode::Artist => GameModeEntity::Artist,
        }
    }
}

impl From<SongEntity> for Song {
    fn from(value: SongEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            artist: value.artist,
            media_url: value.media_url,
            media_track_id: value.media_track_id,
            starting_offset: value.starting_offset,
            difficulty: value.difficulty,
            is_active: value.is_active,
        }
    }
}

impl From<PlaylistEntity> for Playlist {
    fn from(value: PlaylistEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            song_ids: value.song_ids,
            is_active: value.is_active,
        }
    }
}
