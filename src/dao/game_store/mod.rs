pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    GameSessionEntity, PlaylistEntity, SessionStatusEntity, SongEntity, UserStatsEntity,
};
use crate::dao::storage::StorageResult;
use crate::state::identity::UserId;
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Abstraction over the persistence layer for sessions, the song catalog and user statistics.
///
/// Session records are written wholesale. [`GameStore::update_session`] is a
/// conditional write: it only succeeds when the stored version still equals
/// `expected_version`, and the caller is responsible for handing over a record
/// whose `version` is `expected_version + 1`.
pub trait GameStore: Send + Sync {
    fn insert_session(&self, session: GameSessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_session(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>>;
    fn find_sessions_by_user(
        &self,
        user_id: UserId,
        status: SessionStatusEntity,
    ) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>>;
    fn save_playlist(&self, playlist: PlaylistEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_playlist(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlaylistEntity>>>;
    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_song(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SongEntity>>>;
    fn save_user_stats(&self, stats: UserStatsEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_user_stats(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Songs and playlists loaded from a JSON file at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub songs: Vec<SongEntity>,
    #[serde(default)]
    pub playlists: Vec<PlaylistEntity>,
}

/// Upsert every song and playlist of `catalog` into `store`.
pub async fn seed_catalog(store: &dyn GameStore, catalog: CatalogSeed) -> StorageResult<()> {
    let songs = catalog.songs.len();
    let playlists = catalog.playlists.len();

    for song in catalog.songs {
        store.save_song(song).await?;
    }
    for playlist in catalog.playlists {
        store.save_playlist(playlist).await?;
    }

    info!(songs, playlists, "song catalog seeded");
    Ok(())
}
