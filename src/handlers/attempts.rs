//! Timed test session endpoints.
//!
//! The session store lock is only held while touching the in-memory session.
//! Submission detaches a plan, writes with the database lock, then re-enters
//! the session to record the outcome.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use super::{with_owned, AnswerRequest};
use crate::auth::AuthContext;
use crate::db::{try_lock, LogOnError, PracticeRepository};
use crate::domain::Notification;
use crate::error::AppError;
use crate::session::{SessionView, TestSession};
use crate::state::AppState;
use crate::submission::{self, SubmissionReceipt};

const ATTEMPT: &str = "Attempt";

fn with_attempt<T>(
    state: &AppState,
    auth: &AuthContext,
    attempt_id: &str,
    f: impl FnOnce(&mut TestSession) -> Result<T, AppError>,
) -> Result<T, AppError> {
    with_owned(&state.test_sessions, auth, attempt_id, ATTEMPT, |s| s.user_id(), f)
}

/// GET /attempts/{id}
pub async fn get_attempt(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = with_attempt(&state, &auth, &attempt_id, |session| {
        session.sync_clock(now);
        session.view()
    })?;
    Ok(Json(view))
}

/// POST /attempts/{id}/answer
pub async fn answer_question(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = with_attempt(&state, &auth, &attempt_id, |session| {
        session.record_answer(request.answer, now)?;
        session.view()
    })?;
    Ok(Json(view))
}

/// POST /attempts/{id}/mark
pub async fn mark_question(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = with_attempt(&state, &auth, &attempt_id, |session| {
        session.toggle_mark(now)?;
        session.view()
    })?;
    Ok(Json(view))
}

/// POST /attempts/{id}/next
pub async fn next_question(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = with_attempt(&state, &auth, &attempt_id, |session| {
        session.advance(now)?;
        session.view()
    })?;
    Ok(Json(view))
}

/// POST /attempts/{id}/previous
pub async fn previous_question(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let now = Utc::now();
    let view = with_attempt(&state, &auth, &attempt_id, |session| {
        session.retreat(now)?;
        session.view()
    })?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    #[serde(flatten)]
    pub receipt: SubmissionReceipt,
    pub notifications: Vec<Notification>,
}

/// POST /attempts/{id}/submit
pub async fn submit_attempt(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<Json<SubmitResponse>, AppError> {
    let now = Utc::now();

    let plan = match state.test_sessions.with_session(&attempt_id, |session| {
        if session.user_id() != auth.user_id {
            return Err(AppError::NotFound(ATTEMPT.to_string()));
        }
        submission::begin(session, now)
    }) {
        Some(plan) => plan?,
        None => return Err(missing_session(&state, &auth, &attempt_id)),
    };

    let outcome = match try_lock(&state.db) {
        Ok(conn) => submission::execute(&*conn, &plan, now),
        Err(e) => Err(e.into()),
    };

    let receipt = match state
        .test_sessions
        .with_session(&attempt_id, |session| submission::finish(session, outcome))
    {
        Some(result) => result?,
        None => return Err(missing_session(&state, &auth, &attempt_id)),
    };
    state.test_sessions.remove(&attempt_id);

    let notifications = try_lock(&state.db)
        .map(|conn| submission::reward_completion(&*conn, &auth.user_id))
        .log_warn_default("Skipping completion rewards");

    Ok(Json(SubmitResponse { receipt, notifications }))
}

/// Error for a submit against an attempt with no live session.
/// A completed attempt of the caller reports `AlreadySubmitted`.
fn missing_session(state: &AppState, auth: &AuthContext, attempt_id: &str) -> AppError {
    let conn = match try_lock(&state.db) {
        Ok(conn) => conn,
        Err(e) => return e.into(),
    };
    match conn.get_attempt(attempt_id) {
        Ok(Some(attempt)) if attempt.user_id == auth.user_id && attempt.is_completed() => AppError::AlreadySubmitted,
        Ok(_) => AppError::NotFound(ATTEMPT.to_string()),
        Err(e) => AppError::load("attempt")(e),
    }
}
