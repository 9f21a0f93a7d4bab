/// Storage trait and its in-memory and MongoDB backends.
pub mod game_store;
/// Persisted record shapes shared by every backend.
pub mod models;
/// Backend-agnostic storage errors.
pub mod storage;
