use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::{game_store::GameStore, models::{SessionStatusEntity, UserStatsEntity}},
    dto::stats::UserStatsResponse,
    error::ServiceError,
    state::{SharedState, identity::UserId, session::GameSession},
};

/// Whether a finished game scored at least `threshold_percent` of its maximum.
pub fn is_win(session: &GameSession, threshold_percent: u8) -> bool {
    let max = u64::from(session.max_possible_score());
    max > 0 && u64::from(session.total_score) * 100 >= max * u64::from(threshold_percent)
}

/// Fold one completed game into running aggregates.
pub fn fold_game(stats: &mut UserStatsEntity, session: &GameSession, threshold_percent: u8) {
    stats.games_played += 1;
    stats.total_score += u64::from(session.total_score);
    if is_win(session, threshold_percent) {
        stats.games_won += 1;
    }
    stats.best_score = stats.best_score.max(session.total_score);
    stats.average_score = stats.total_score as f64 / f64::from(stats.games_played);
}

/// Apply a freshly completed session to its owner's statistics.
pub async fn apply_completed_game(
    store: &dyn GameStore,
    session: &GameSession,
    threshold_percent: u8,
) -> Result<UserStatsEntity, ServiceError> {
    let mut stats = store
        .find_user_stats(session.user_id)
        .await?
        .unwrap_or_else(|| UserStatsEntity::empty(session.user_id));

    fold_game(&mut stats, session, threshold_percent);
    stats.updated_at = SystemTime::now();
    store.save_user_stats(stats.clone()).await?;

    info!(
        user_id = %session.user_id,
        session_id = %session.id,
        score = session.total_score,
        accuracy = session.accuracy(),
        won = is_win(session, threshold_percent),
        games_played = stats.games_played,
        "user statistics updated"
    );
    Ok(stats)
}

/// Rebuild a user's statistics from every completed session they own.
pub async fn recompute_user_stats(
    state: &SharedState,
    user: UserId,
) -> Result<UserStatsResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let _gate = state.user_gate(user).await;
    let threshold = state.config().win_threshold_percent();

    let completed = store
        .find_sessions_by_user(user, SessionStatusEntity::Completed)
        .await?;

    let mut stats = UserStatsEntity::empty(user);
    for entity in completed {
        fold_game(&mut stats, &GameSession::from(entity), threshold);
    }
    stats.updated_at = SystemTime::now();
    store.save_user_stats(stats.clone()).await?;

    info!(user_id = %user, games_played = stats.games_played, "user statistics recomputed");
    Ok(stats.into())
}

pub async fn get_user_stats(
    state: &SharedState,
    user: UserId,
) -> Result<UserStatsResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let stats = store
        .find_user_stats(user)
        .await?
        .unwrap_or_else(|| UserStatsEntity::empty(user));
    Ok(stats.into())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        dao::game_store::memory::InMemoryGameStore,
        state::{catalog::GameMode, session::Round},
    };

    fn finished(rounds: u8, points: &[u32]) -> GameSession {
        let now = SystemTime::now();
        let mut session = GameSession::new(UserId::random(), Uuid::new_v4(), GameMode::Classic, rounds, now);
        for &earned in points {
            session
                .record_round(Round {
                    song_id: Uuid::new_v4(),
                    user_guess: String::new(),
                    correct_answer: "x".into(),
                    is_correct: earned > 0,
                    hints_used: 1,
                    time_to_guess: 1.0,
                    points_earned: earned,
                    started_at: now,
                    ended_at: now,
                })
                .unwrap();
        }
        session
    }

    #[test]
    fn win_needs_sixty_percent() {
        assert!(is_win(&finished(2, &[5, 1]), 60));
        assert!(!is_win(&finished(2, &[5, 0]), 60));
        assert!(is_win(&finished(1, &[3]), 60));
        assert!(!is_win(&finished(1, &[2]), 60));
    }

    #[test]
    fn folding_updates_every_aggregate() {
        let user = UserId::random();
        let mut stats = UserStatsEntity::empty(user);

        fold_game(&mut stats, &finished(2, &[5, 5]), 60);
        fold_game(&mut stats, &finished(2, &[1, 0]), 60);

        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.games_won, 1);
        assert_eq!(stats.total_score, 11);
        assert_eq!(stats.best_score, 10);
        assert_eq!(stats.average_score, 5.5);
    }

    #[tokio::test]
    async fn applying_a_game_persists_the_new_totals() {
        let store = InMemoryGameStore::new();
        let session = finished(1, &[4]);

        apply_completed_game(&store, &session, 60).await.unwrap();
        let stats = apply_completed_game(&store, &session, 60).await.unwrap();

        assert_eq!(stats.games_played, 2);
        let stored = GameStore::find_user_stats(&store, session.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_score, 8);
    }
}
