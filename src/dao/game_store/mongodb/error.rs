use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

use crate::state::identity::UserId;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI")]
    InvalidUri {
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game session `{id}`")]
    SaveSession {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game session `{id}`")]
    LoadSession {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list game sessions of user `{user_id}`")]
    ListSessions {
        user_id: UserId,
        #[source]
        source: MongoError,
    },
    #[error("failed to save playlist `{id}`")]
    SavePlaylist {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load playlist `{id}`")]
    LoadPlaylist {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save song `{id}`")]
    SaveSong {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load song `{id}`")]
    LoadSong {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save statistics of user `{user_id}`")]
    SaveStats {
        user_id: UserId,
        #[source]
        source: MongoError,
    },
    #[error("failed to load statistics of user `{user_id}`")]
    LoadStats {
        user_id: UserId,
        #[source]
        source: MongoError,
    },
    #[error("document `{id}` in collection `{collection}` is corrupt: {reason}")]
    CorruptDocument {
        collection: &'static str,
        id: String,
        reason: String,
    },
}
