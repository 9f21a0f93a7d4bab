/// Fuzzy comparison of guesses against canonical answers.
pub mod answer_matcher;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Points awarded per round.
pub mod scoring;
/// Session lifecycle operations.
pub mod session_service;
/// Ownership and client-binding checks.
pub mod session_validator;
/// Random song selection without repetition.
pub mod song_selector;
/// User lifetime statistics.
pub mod stats_service;
/// Storage connection supervisor driving degraded mode.
pub mod storage_supervisor;
