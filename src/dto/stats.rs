use serde::Serialize;
use utoipa::ToSchema;

use crate::{dao::models::UserStatsEntity, dto::format_system_time};

/// Lifetime statistics of the calling user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub user_id: String,
    pub games_played: u32,
    pub games_won: u32,
    pub total_score: u64,
    pub best_score: u32,
    pub average_score: f64,
    pub updated_at: String,
}

impl From<UserStatsEntity> for UserStatsResponse {
    fn from(value: UserStatsEntity) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            games_played: value.games_played,
            games_won: value.games_won,
            total_score: value.total_score,
            best_score: value.best_score,
            average_score: value.average_score,
            updated_at: format_system_time(value.updated_at),
        }
    }
}
