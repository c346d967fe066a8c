use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::AuthContext;
use crate::db::{self, try_lock, PracticeRepository};
use crate::domain::{Achievement, TestAttempt, UserStats};
use crate::error::AppError;
use crate::gamification::GamificationEngine;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsDashboard {
    pub stats: UserStats,
    pub next_level_xp: u32,
    pub xp_to_next_level: u32,
    /// Keys of unlocked achievements, sorted
    pub unlocked: Vec<String>,
    /// Completed attempts, newest first
    pub history: Vec<TestAttempt>,
}

/// GET /me/stats
pub async fn my_stats(auth: AuthContext, State(state): State<AppState>) -> Result<Json<StatsDashboard>, AppError> {
    let conn = try_lock(&state.db)?;
    let stats = GamificationEngine::new(&*conn).load_stats(&auth.user_id)?;
    let mut unlocked: Vec<String> = conn.list_unlocked_keys(&auth.user_id)?.into_iter().collect();
    unlocked.sort();
    let history = db::list_completed_attempts(&conn, &auth.user_id).map_err(AppError::load("attempt history"))?;

    Ok(Json(StatsDashboard {
        next_level_xp: stats.next_level_xp(),
        xp_to_next_level: stats.xp_to_next_level(),
        stats,
        unlocked,
        history,
    }))
}

#[derive(Debug, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked: bool,
}

/// GET /achievements
pub async fn list_achievements(
    auth: AuthContext,
    State(state): State<AppState>,
) -> Result<Json<Vec<AchievementStatus>>, AppError> {
    let conn = try_lock(&state.db)?;
    let unlocked = conn.list_unlocked_keys(&auth.user_id)?;
    let catalog = conn
        .list_achievements()?
        .into_iter()
        .map(|achievement| AchievementStatus {
            unlocked: unlocked.contains(&achievement.key),
            achievement,
        })
        .collect();
    Ok(Json(catalog))
}
