//! Test catalog and attempt creation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::auth::AuthContext;
use crate::db::{self, try_lock, PracticeRepository};
use crate::domain::PracticeTest;
use crate::error::AppError;
use crate::session::{SessionView, TestSession};
use crate::state::AppState;

/// GET /tests
///
/// Published tests newest first. Admins also see unpublished ones.
pub async fn list_tests(
    auth: AuthContext,
    State(state): State<AppState>,
) -> Result<Json<Vec<PracticeTest>>, AppError> {
    let conn = try_lock(&state.db)?;
    let tests = conn.list_tests(auth.is_admin).map_err(AppError::load("tests"))?;
    Ok(Json(tests))
}

/// POST /tests/{test_id}/attempts
pub async fn start_attempt(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let now = Utc::now();

    let (attempt, questions) = {
        let conn = try_lock(&state.db)?;
        match db::get_test(&conn, &test_id).map_err(AppError::load("test"))? {
            Some(test) if test.is_published || auth.is_admin => {}
            _ => return Err(AppError::NotFound("Test".to_string())),
        }

        let questions = conn
            .load_test_questions(&test_id)
            .map_err(AppError::load("test questions"))?;
        // No attempt row for a test that cannot be taken
        if questions.is_empty() {
            return Err(AppError::EmptyTest);
        }

        let attempt = conn
            .create_attempt(&auth.user_id, &test_id, now)
            .map_err(AppError::load("attempt"))?;
        (attempt, questions)
    };

    let session = TestSession::new(&attempt, questions, state.config.session_time_limit_secs, now)?;
    let view = session.view()?;
    state.test_sessions.insert(&attempt.id, session);

    tracing::info!("User {} started attempt {} on test {}", auth.user_id, attempt.id, test_id);
    Ok((StatusCode::CREATED, Json(view)))
}
