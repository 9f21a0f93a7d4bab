use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoPlaylistDocument, MongoSessionDocument, MongoSongDocument, MongoStatsDocument,
        PLAYLIST_COLLECTION_NAME, SESSION_COLLECTION_NAME, SONG_COLLECTION_NAME,
        STATS_COLLECTION_NAME, doc_id,
    },
};
use crate::{
    dao::{
        game_store::GameStore,
        models::{
            GameSessionEntity, PlaylistEntity, SessionStatusEntity, SongEntity, UserStatsEntity,
        },
        storage::{StorageError, StorageResult},
    },
    state::identity::UserId,
};

/// [`GameStore`] persisting into four MongoDB collections.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_, database) = config.open().await?;
        let store = Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let sessions = self.database().await.collection::<Document>(SESSION_COLLECTION_NAME);

        let indexes = [
            ("session_user_status_idx", doc! {"user_id": 1, "status": 1}),
            (
                "session_client_user_idx",
                doc! {"client_session_id": 1, "user_id": 1},
            ),
        ];
        for (name, keys) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(Some(name.to_owned())).build())
                .build();
            sessions
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: SESSION_COLLECTION_NAME,
                    index: name,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.database.read().await.clone()
    }

    async fn sessions(&self) -> Collection<MongoSessionDocument> {
        self.database().await.collection(SESSION_COLLECTION_NAME)
    }

    async fn playlists(&self) -> Collection<MongoPlaylistDocument> {
        self.database().await.collection(PLAYLIST_COLLECTION_NAME)
    }

    async fn songs(&self) -> Collection<MongoSongDocument> {
        self.database().await.collection(SONG_COLLECTION_NAME)
    }

    async fn stats(&self) -> Collection<MongoStatsDocument> {
        self.database().await.collection(STATS_COLLECTION_NAME)
    }

    async fn insert_session(&self, session: GameSessionEntity) -> MongoResult<()> {
        let id = session.id;
        let document = MongoSessionDocument::from(session);
        self.sessions()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveSession { id, source })?;
        Ok(())
    }

    /// Replace the session only if nobody bumped its version in between.
    async fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> StorageResult<()> {
        let id = session.id;
        let document = MongoSessionDocument::from(session);
        let filter = doc! {"_id": id.to_string(), "version": expected_version as i64};

        let result = self
            .sessions()
            .await
            .replace_one(filter, &document)
            .await
            .map_err(|source| MongoDaoError::SaveSession { id, source })?;

        if result.matched_count == 0 {
            return Err(StorageError::Conflict {
                id,
                expected: expected_version,
            });
        }
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> MongoResult<Option<GameSessionEntity>> {
        self.sessions()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadSession { id, source })?
            .map(GameSessionEntity::try_from)
            .transpose()
    }

    async fn find_sessions_by_user(
        &self,
        user_id: UserId,
        status: SessionStatusEntity,
    ) -> MongoResult<Vec<GameSessionEntity>> {
        let filter = doc! {"user_id": user_id.to_string(), "status": status.as_str()};
        let documents: Vec<MongoSessionDocument> = self
            .sessions()
            .await
            .find(filter)
            .sort(doc! {"session_start_time": 1})
            .await
            .map_err(|source| MongoDaoError::ListSessions { user_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSessions { user_id, source })?;

        documents
            .into_iter()
            .map(GameSessionEntity::try_from)
            .collect()
    }

    async fn save_playlist(&self, playlist: PlaylistEntity) -> MongoResult<()> {
        let id = playlist.id;
        self.playlists()
            .await
            .replace_one(doc_id(id), MongoPlaylistDocument::from(playlist))
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SavePlaylist { id, source })?;
        Ok(())
    }

    async fn find_playlist(&self, id: Uuid) -> MongoResult<Option<PlaylistEntity>> {
        self.playlists()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadPlaylist { id, source })?
            .map(PlaylistEntity::try_from)
            .transpose()
    }

    async fn save_song(&self, song: SongEntity) -> MongoResult<()> {
        let id = song.id;
        self.songs()
            .await
            .replace_one(doc_id(id), MongoSongDocument::from(song))
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSong { id, source })?;
        Ok(())
    }

    async fn find_song(&self, id: Uuid) -> MongoResult<Option<SongEntity>> {
        self.songs()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadSong { id, source })?
            .map(SongEntity::try_from)
            .transpose()
    }

    async fn save_user_stats(&self, stats: UserStatsEntity) -> MongoResult<()> {
        let user_id = stats.user_id;
        self.stats()
            .await
            .replace_one(doc! {"_id": user_id.to_string()}, MongoStatsDocument::from(stats))
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveStats { user_id, source })?;
        Ok(())
    }

    async fn find_user_stats(&self, user_id: UserId) -> MongoResult<Option<UserStatsEntity>> {
        self.stats()
            .await
            .find_one(doc! {"_id": user_id.to_string()})
            .await
            .map_err(|source| MongoDaoError::LoadStats { user_id, source })?
            .map(UserStatsEntity::try_from)
            .transpose()
    }

    async fn ping(&self) -> MongoResult<()> {
        self.database()
            .await
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_, database) = self.inner.config.open().await?;
        *self.inner.database.write().await = database;
        Ok(())
    }
}

impl GameStore for MongoGameStore {
    fn insert_session(&self, session: GameSessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_session(session).await.map_err(Into::into) })
    }

    fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_session(session, expected_version).await })
    }

    fn find_session(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_session(id).await.map_err(Into::into) })
    }

    fn find_sessions_by_user(
        &self,
        user_id: UserId,
        status: SessionStatusEntity,
    ) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_sessions_by_user(user_id, status)
                .await
                .map_err(Into::into)
        })
    }

    fn save_playlist(&self, playlist: PlaylistEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_playlist(playlist).await.map_err(Into::into) })
    }

    fn find_playlist(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlaylistEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_playlist(id).await.map_err(Into::into) })
    }

    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_song(song).await.map_err(Into::into) })
    }

    fn find_song(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_song(id).await.map_err(Into::into) })
    }

    fn save_user_stats(&self, stats: UserStatsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_user_stats(stats).await.map_err(Into::into) })
    }

    fn find_user_stats(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user_stats(user_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reconnect().await.map_err(Into::into) })
    }
}
