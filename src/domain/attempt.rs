use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::{AnswerLetter, Question};

/// One instance of a user taking one test.
///
/// Created with empty completion fields when a session starts and filled in
/// exactly once at submission. An attempt without `completed_at` is still in
/// progress and never counts as a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAttempt {
  pub id: String,
  pub user_id: String,
  pub test_id: String,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub total_score: Option<u32>,
  pub rw_score: Option<u32>,
  pub math_score: Option<u32>,
  pub rw_correct: Option<u32>,
  pub rw_total: Option<u32>,
  pub math_correct: Option<u32>,
  pub math_total: Option<u32>,
}

impl TestAttempt {
  pub fn new(user_id: &str, test_id: &str, started_at: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      user_id: user_id.to_string(),
      test_id: test_id.to_string(),
      started_at,
      completed_at: None,
      total_score: None,
      rw_score: None,
      math_score: None,
      rw_correct: None,
      rw_total: None,
      math_correct: None,
      math_total: None,
    }
  }

  pub fn is_completed(&self) -> bool {
    self.completed_at.is_some()
  }
}

/// Persisted answer for one question of an attempt.
/// Unanswered questions are stored too, with `selected_answer = None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
  pub id: String,
  pub attempt_id: String,
  pub question_id: String,
  pub selected_answer: Option<AnswerLetter>,
  pub is_correct: bool,
  pub is_marked: bool,
  /// Seconds spent on the question (best effort)
  pub time_spent: u32,
  pub answered_at: DateTime<Utc>,
}

impl UserAnswer {
  pub fn for_question(
    attempt_id: &str,
    question: &Question,
    selected_answer: Option<AnswerLetter>,
    is_marked: bool,
    time_spent: u32,
    answered_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      attempt_id: attempt_id.to_string(),
      question_id: question.id.clone(),
      selected_answer,
      is_correct: question.is_correct(selected_answer),
      is_marked,
      time_spent,
      answered_at,
    }
  }
}

/// Which answers the review screen shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFilter {
  #[default]
  All,
  Wrong,
  Marked,
}

impl ReviewFilter {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "all" => Some(Self::All),
      "wrong" => Some(Self::Wrong),
      "marked" => Some(Self::Marked),
      _ => None,
    }
  }

  pub fn matches(&self, answer: &UserAnswer) -> bool {
    match self {
      Self::All => true,
      Self::Wrong => !answer.is_correct,
      Self::Marked => answer.is_marked,
    }
  }
}

/// An answer record joined with its question, for the review screen
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
  pub answer: UserAnswer,
  pub question: Question,
}
