//! Process-local [`GameStore`] backed by concurrent maps.
//!
//! Used when no database is configured and throughout the test-suite. Apart
//! from durability it honours the same contract as the MongoDB store,
//! including conditional session writes.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

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

#[derive(Clone, Default)]
pub struct InMemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    sessions: DashMap<Uuid, GameSessionEntity>,
    playlists: DashMap<Uuid, PlaylistEntity>,
    songs: DashMap<Uuid, SongEntity>,
    stats: DashMap<UserId, UserStatsEntity>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_session(&self, session: GameSessionEntity) -> StorageResult<()> {
        match self.inner.sessions.entry(session.id) {
            Entry::Occupied(_) => Err(StorageError::Conflict {
                id: session.id,
                expected: 0,
            }),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            }
        }
    }

    fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> StorageResult<()> {
        let id = session.id;
        let conflict = || StorageError::Conflict {
            id,
            expected: expected_version,
        };

        let mut stored = self.inner.sessions.get_mut(&id).ok_or_else(conflict)?;
        if stored.version != expected_version {
            return Err(conflict());
        }
        *stored = session;
        Ok(())
    }

    fn find_sessions_by_user(
        &self,
        user_id: UserId,
        status: SessionStatusEntity,
    ) -> Vec<GameSessionEntity> {
        let mut sessions: Vec<GameSessionEntity> = self
            .inner
            .sessions
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.status == status)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by_key(|session| session.session_start_time);
        sessions
    }
}

impl GameStore for InMemoryGameStore {
    fn insert_session(&self, session: GameSessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_session(session) })
    }

    fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_session(session, expected_version) })
    }

    fn find_session(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .sessions
                .get(&id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn find_sessions_by_user(
        &self,
        user_id: UserId,
        status: SessionStatusEntity,
    ) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_sessions_by_user(user_id, status)) })
    }

    fn save_playlist(&self, playlist: PlaylistEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.playlists.insert(playlist.id, playlist);
            Ok(())
        })
    }

    fn find_playlist(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlaylistEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .playlists
                .get(&id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.songs.insert(song.id, song);
            Ok(())
        })
    }

    fn find_song(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.songs.get(&id).map(|entry| entry.value().clone())) })
    }

    fn save_user_stats(&self, stats: UserStatsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.stats.insert(stats.user_id, stats);
            Ok(())
        })
    }

    fn find_user_stats(
        &self,
        user_id: UserId,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .stats
                .get(&user_id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::state::{catalog::GameMode, session::GameSession};

    fn entity() -> GameSessionEntity {
        GameSession::new(
            UserId::random(),
            Uuid::new_v4(),
            GameMode::Classic,
            3,
            SystemTime::now(),
        )
        .into()
    }

    #[tokio::test]
    async fn conditional_update_rejects_stale_versions() {
        let store = InMemoryGameStore::new();
        let mut session = entity();
        GameStore::insert_session(&store, session.clone()).await.unwrap();

        session.version = 1;
        GameStore::update_session(&store, session.clone(), 0)
            .await
            .unwrap();

        let mut stale = session.clone();
        stale.version = 1;
        let err = GameStore::update_session(&store, stale, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 0, .. }));
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = InMemoryGameStore::new();
        let session = entity();
        GameStore::insert_session(&store, session.clone()).await.unwrap();
        assert!(GameStore::insert_session(&store, session).await.is_err());
    }

    #[tokio::test]
    async fn sessions_are_filtered_by_owner_and_status() {
        let store = InMemoryGameStore::new();
        let mine = entity();
        let mut abandoned = entity();
        abandoned.user_id = mine.user_id;
        abandoned.status = SessionStatusEntity::Abandoned;
        let foreign = entity();

        for session in [mine.clone(), abandoned, foreign] {
            GameStore::insert_session(&store, session).await.unwrap();
        }

        let active = GameStore::find_sessions_by_user(
            &store,
            mine.user_id,
            SessionStatusEntity::Active,
        )
        .await
        .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, mine.id);
    }
}
