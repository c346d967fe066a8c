//! Submission of a timed attempt.
//!
//! ```text
//! InProgress --submit--> Submitting --ok--> Completed
//!     ^                      |
//!     +------ Failed <-------+ (error)
//! ```
//!
//! `Failed` behaves like `InProgress` for input and may be submitted again.
//! Persistence runs in two steps: an idempotent upsert of every answer row,
//! then a single conditional update of the attempt with its scores. When the
//! second step fails the answers are known to be durable and the retry skips
//! straight to recording scores.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::db::{LogOnError, PracticeRepository};
use crate::domain::{Notification, Question, UserAnswer};
use crate::error::{AppError, SubmissionStep};
use crate::gamification::GamificationEngine;
use crate::scoring::{score_answers, ScoreReport};
use crate::session::TestSession;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionState {
  InProgress,
  Submitting,
  Completed { receipt: SubmissionReceipt },
  Failed { reason: String },
}

impl SubmissionState {
  /// Answers, marks and navigation are accepted before submission and after
  /// a failed one
  pub fn guard_input(&self) -> Result<(), AppError> {
    match self {
      SubmissionState::InProgress | SubmissionState::Failed { .. } => Ok(()),
      SubmissionState::Submitting => Err(AppError::SubmissionInProgress),
      SubmissionState::Completed { .. } => Err(AppError::AlreadySubmitted),
    }
  }
}

/// Outcome of a completed submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
  pub attempt_id: String,
  pub completed_at: DateTime<Utc>,
  pub scores: ScoreReport,
  /// Where the client goes next
  pub results_path: String,
}

/// Everything the persistence steps need, detached from the session so the
/// session store lock is not held while writing
#[derive(Debug, Clone)]
pub struct SubmissionPlan {
  pub attempt_id: String,
  pub user_id: String,
  pub questions: Vec<Question>,
  pub answers: Vec<UserAnswer>,
  pub answers_saved: bool,
}

/// `InProgress | Failed -> Submitting`. Rejects a second trigger while one is
/// outstanding and any trigger after completion.
pub fn begin(session: &mut TestSession, now: DateTime<Utc>) -> Result<SubmissionPlan, AppError> {
  match session.state() {
    SubmissionState::Submitting => return Err(AppError::SubmissionInProgress),
    SubmissionState::Completed { .. } => return Err(AppError::AlreadySubmitted),
    SubmissionState::InProgress | SubmissionState::Failed { .. } => {}
  }

  session.sync_clock(now);
  let plan = SubmissionPlan {
    attempt_id: session.attempt_id().to_string(),
    user_id: session.user_id().to_string(),
    questions: session.questions().to_vec(),
    answers: session.build_answers(now),
    answers_saved: session.answers_saved(),
  };
  session.set_state(SubmissionState::Submitting);
  tracing::debug!(
    "Submitting attempt {} ({} questions, answers already saved: {})",
    plan.attempt_id,
    plan.questions.len(),
    plan.answers_saved
  );
  Ok(plan)
}

/// Persist answers, score, and record completion
pub fn execute<R: PracticeRepository + ?Sized>(
  repo: &R,
  plan: &SubmissionPlan,
  now: DateTime<Utc>,
) -> Result<SubmissionReceipt, AppError> {
  if !plan.answers_saved {
    repo
      .save_answers(&plan.answers)
      .map_err(AppError::submission(SubmissionStep::SaveAnswers))?;
  }

  let selected: HashMap<&str, _> = plan
    .answers
    .iter()
    .map(|a| (a.question_id.as_str(), a.selected_answer))
    .collect();
  let scores = score_answers(&plan.questions, |q| selected.get(q.id.as_str()).copied().flatten());

  let updated = repo
    .complete_attempt(&plan.attempt_id, &scores, now)
    .map_err(AppError::submission(SubmissionStep::CompleteAttempt))?;
  let (scores, completed_at) = if updated {
    (scores, now)
  } else {
    tracing::warn!("Attempt {} was already completed in storage", plan.attempt_id);
    match repo
      .get_attempt(&plan.attempt_id)
      .map_err(AppError::submission(SubmissionStep::CompleteAttempt))?
    {
      Some(stored) => (ScoreReport::from_attempt(&stored), stored.completed_at.unwrap_or(now)),
      None => (scores, now),
    }
  };

  tracing::info!(
    "Attempt {} completed: total {} (R&W {}, Math {})",
    plan.attempt_id,
    scores.total_score,
    scores.reading_writing.score,
    scores.math.score
  );

  Ok(SubmissionReceipt {
    attempt_id: plan.attempt_id.clone(),
    completed_at,
    scores,
    results_path: format!("/results/{}", plan.attempt_id),
  })
}

/// `Submitting -> Completed | Failed`
pub fn finish(
  session: &mut TestSession,
  outcome: Result<SubmissionReceipt, AppError>,
) -> Result<SubmissionReceipt, AppError> {
  match outcome {
    Ok(receipt) => {
      session.set_answers_saved(true);
      session.set_state(SubmissionState::Completed {
        receipt: receipt.clone(),
      });
      Ok(receipt)
    }
    Err(err) => {
      if let AppError::SubmissionFailure {
        step: SubmissionStep::CompleteAttempt,
        ..
      } = &err
      {
        session.set_answers_saved(true);
      }
      tracing::warn!("Submission of attempt {} failed: {}", session.attempt_id(), err);
      session.set_state(SubmissionState::Failed {
        reason: err.user_message(),
      });
      Err(err)
    }
  }
}

/// Run a whole submission against a repository in one go
pub fn submit<R: PracticeRepository + ?Sized>(
  session: &mut TestSession,
  repo: &R,
  now: DateTime<Utc>,
) -> Result<SubmissionReceipt, AppError> {
  let plan = begin(session, now)?;
  let outcome = execute(repo, &plan, now);
  finish(session, outcome)
}

/// Evaluate tests-completed achievements after a successful submission.
/// Failures are logged and yield no notifications.
pub fn reward_completion<R: PracticeRepository + ?Sized>(repo: &R, user_id: &str) -> Vec<Notification> {
  GamificationEngine::new(repo)
    .on_test_completed(user_id)
    .map(|outcome| outcome.notifications)
    .log_warn_default("Failed to evaluate test completion achievements")
}
