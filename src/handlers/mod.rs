//! JSON handlers for the practice API.

pub mod attempts;
pub mod catalog;
pub mod practice;
pub mod results;
pub mod stats;

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthContext;
use crate::domain::AnswerLetter;
use crate::error::AppError;
use crate::session::SessionStore;

pub use attempts::{answer_question, get_attempt, mark_question, next_question, previous_question, submit_attempt};
pub use catalog::{list_tests, start_attempt};
pub use practice::{answer_practice, finish_practice, get_practice, next_practice, previous_practice, start_practice};
pub use results::{get_results, get_review};
pub use stats::{list_achievements, my_stats};

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: AnswerLetter,
}

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Run `f` on a live session owned by the caller.
///
/// Sessions of other users are reported as missing.
pub(crate) fn with_owned<S, T>(
    store: &SessionStore<S>,
    auth: &AuthContext,
    id: &str,
    what: &str,
    owner: impl Fn(&S) -> &str,
    f: impl FnOnce(&mut S) -> Result<T, AppError>,
) -> Result<T, AppError> {
    store
        .with_session(id, |session| {
            if owner(session) != auth.user_id {
                return Err(AppError::NotFound(what.to_string()));
            }
            f(session)
        })
        .unwrap_or_else(|| Err(AppError::NotFound(what.to_string())))
}
