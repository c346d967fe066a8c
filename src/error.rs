//! Error taxonomy shared by the session, submission and gamification layers.
//!
//! Every variant returns control to an interactive state: handlers turn it
//! into a JSON body and the user re-triggers the action if it is retryable.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config;
use crate::db::DbLockError;

/// Persistence step of a submission that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStep {
    SaveAnswers,
    CompleteAttempt,
}

impl std::fmt::Display for SubmissionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStep::SaveAnswers => write!(f, "saving answers"),
            SubmissionStep::CompleteAttempt => write!(f, "recording scores"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to load {what}: {source}")]
    LoadFailure {
        what: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("This test doesn't have any questions yet")]
    EmptyTest,

    #[error("Submission failed while {step}: {source}")]
    SubmissionFailure {
        step: SubmissionStep,
        #[source]
        source: rusqlite::Error,
    },

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("This attempt has already been submitted")]
    AlreadySubmitted,

    #[error("Attempt {0} is still in progress")]
    AttemptInProgress(String),

    #[error("This question has already been answered")]
    AlreadyAnswered,

    #[error("Stats for user {0} changed concurrently, please retry")]
    ConcurrentStatsRace(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Not signed in")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Database unavailable")]
    DbUnavailable,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl From<DbLockError> for AppError {
    fn from(_: DbLockError) -> Self {
        AppError::DbUnavailable
    }
}

impl AppError {
    pub fn load(what: &'static str) -> impl FnOnce(rusqlite::Error) -> AppError {
        move |source| AppError::LoadFailure { what, source }
    }

    pub fn submission(step: SubmissionStep) -> impl FnOnce(rusqlite::Error) -> AppError {
        move |source| AppError::SubmissionFailure { step, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::LoadFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::EmptyTest => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SubmissionFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SubmissionInProgress
            | AppError::AlreadySubmitted
            | AppError::AttemptInProgress(_)
            | AppError::AlreadyAnswered
            | AppError::ConcurrentStatsRace(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::DbUnavailable | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether re-invoking the same action can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::LoadFailure { .. }
                | AppError::SubmissionFailure { .. }
                | AppError::SubmissionInProgress
                | AppError::ConcurrentStatsRace(_)
                | AppError::DbUnavailable
        )
    }

    /// Where the client should go instead, if anywhere
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            AppError::LoadFailure { .. } | AppError::EmptyTest => Some(config::SAFE_LISTING_PATH),
            _ => None,
        }
    }

    /// Message safe to show to the user (no SQL details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::LoadFailure { what, .. } => format!("Error loading {}", what),
            AppError::SubmissionFailure { .. } => {
                "Error submitting test. Your answers are safe, please try again.".to_string()
            }
            AppError::Database(_) => "Something went wrong, please try again".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        let body = ErrorBody {
            error: self.user_message(),
            retryable: self.is_retryable(),
            redirect: self.redirect(),
        };
        (status, Json(body)).into_response()
    }
}
