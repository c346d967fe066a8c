//! Untimed topic practice over the question pool.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use super::{with_owned, AnswerRequest};
use crate::auth::AuthContext;
use crate::db::{try_lock, LogOnError, PracticeRepository};
use crate::domain::{Notification, QuestionFilter, UserStats};
use crate::error::AppError;
use crate::gamification::GamificationEngine;
use crate::session::{PracticeFeedback, PracticeSession, PracticeSummary, PracticeView};
use crate::state::AppState;

const PRACTICE: &str = "Practice session";

fn with_practice<T>(
    state: &AppState,
    auth: &AuthContext,
    id: &str,
    f: impl FnOnce(&mut PracticeSession) -> Result<T, AppError>,
) -> Result<T, AppError> {
    with_owned(&state.practice_sessions, auth, id, PRACTICE, |s| s.user_id(), f)
}

/// POST /practice
pub async fn start_practice(
    auth: AuthContext,
    State(state): State<AppState>,
    Json(filter): Json<QuestionFilter>,
) -> Result<(StatusCode, Json<PracticeView>), AppError> {
    let questions = {
        let conn = try_lock(&state.db)?;
        conn.load_practice_questions(&filter)
            .map_err(AppError::load("practice questions"))?
    };

    let session = PracticeSession::new(&auth.user_id, filter, questions, Utc::now())?;
    let view = session.view()?;
    let id = session.id().to_string();
    state.practice_sessions.insert(&id, session);
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /practice/{id}
pub async fn get_practice(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PracticeView>, AppError> {
    Ok(Json(with_practice(&state, &auth, &id, |session| session.view())?))
}

#[derive(Debug, Serialize)]
pub struct PracticeAnswerResponse {
    pub feedback: PracticeFeedback,
    /// Absent when the stats update failed; the answer still counts
    pub stats: Option<UserStats>,
    pub notifications: Vec<Notification>,
}

/// POST /practice/{id}/answer
pub async fn answer_practice(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<PracticeAnswerResponse>, AppError> {
    let feedback = with_practice(&state, &auth, &id, |session| session.answer(request.answer))?;

    let today = Utc::now().date_naive();
    let outcome = try_lock(&state.db)
        .map_err(AppError::from)
        .and_then(|conn| GamificationEngine::new(&*conn).on_question_answered(&auth.user_id, today))
        .log_warn("Failed to update practice stats");

    let (stats, notifications) = match outcome {
        Some(outcome) => (Some(outcome.stats), outcome.notifications),
        None => (None, Vec::new()),
    };
    Ok(Json(PracticeAnswerResponse {
        feedback,
        stats,
        notifications,
    }))
}

/// POST /practice/{id}/next
pub async fn next_practice(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PracticeView>, AppError> {
    let view = with_practice(&state, &auth, &id, |session| {
        session.advance();
        session.view()
    })?;
    Ok(Json(view))
}

/// POST /practice/{id}/previous
pub async fn previous_practice(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PracticeView>, AppError> {
    let view = with_practice(&state, &auth, &id, |session| {
        session.retreat();
        session.view()
    })?;
    Ok(Json(view))
}

/// POST /practice/{id}/finish
///
/// Ends the session and reports correct answers over the whole set.
pub async fn finish_practice(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PracticeSummary>, AppError> {
    let summary = with_practice(&state, &auth, &id, |session| Ok(session.summary()))?;
    state.practice_sessions.remove(&id);
    tracing::debug!(
        "Practice {} finished: {}/{} correct",
        id,
        summary.correct,
        summary.total
    );
    Ok(Json(summary))
}
