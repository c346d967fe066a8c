//! Results and review of completed attempts.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthContext;
use crate::db::{self, try_lock, LogOnError, PracticeRepository};
use crate::domain::{ReviewFilter, ReviewItem, TestAttempt};
use crate::error::AppError;
use crate::scoring::{ScoreReport, SectionScore};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SectionResult {
    #[serde(flatten)]
    pub score: SectionScore,
    pub percent: u32,
}

impl SectionResult {
    fn new(score: SectionScore) -> Self {
        Self {
            percent: score.percent(),
            score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsView {
    pub attempt_id: String,
    pub test_id: String,
    pub test_title: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total_score: u32,
    pub reading_writing: SectionResult,
    pub math: SectionResult,
}

/// A completed attempt of the caller
fn completed_attempt(conn: &rusqlite::Connection, auth: &AuthContext, attempt_id: &str) -> Result<TestAttempt, AppError> {
    let attempt = conn
        .get_attempt(attempt_id)
        .map_err(AppError::load("attempt"))?
        .filter(|a| a.user_id == auth.user_id)
        .ok_or_else(|| AppError::NotFound("Attempt".to_string()))?;
    if !attempt.is_completed() {
        return Err(AppError::AttemptInProgress(attempt.id));
    }
    Ok(attempt)
}

/// GET /results/{id}
pub async fn get_results(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<ResultsView>, AppError> {
    let conn = try_lock(&state.db)?;
    let attempt = completed_attempt(&conn, &auth, &attempt_id)?;
    let test_title = db::get_test(&conn, &attempt.test_id)
        .log_warn("Failed to load test title")
        .flatten()
        .map(|t| t.title);

    let scores = ScoreReport::from_attempt(&attempt);

    Ok(Json(ResultsView {
        reading_writing: SectionResult::new(scores.reading_writing),
        math: SectionResult::new(scores.math),
        total_score: scores.total_score,
        // Checked by completed_attempt
        completed_at: attempt.completed_at.unwrap_or(attempt.started_at),
        started_at: attempt.started_at,
        test_title,
        test_id: attempt.test_id,
        attempt_id: attempt.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub filter: Option<String>,
}

/// GET /results/{id}/review?filter=all|wrong|marked
pub async fn get_review(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<ReviewItem>>, AppError> {
    let filter = match query.filter.as_deref() {
        None | Some("") => ReviewFilter::All,
        Some(s) => ReviewFilter::from_str(s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown review filter '{}'", s)))?,
    };

    let conn = try_lock(&state.db)?;
    let attempt = completed_attempt(&conn, &auth, &attempt_id)?;
    let items = conn
        .list_review_answers(&attempt.id, filter)
        .map_err(AppError::load("review"))?;
    Ok(Json(items))
}
