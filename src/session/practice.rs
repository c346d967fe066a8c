use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{AnswerLetter, Question, QuestionFilter};
use crate::error::AppError;
use crate::scoring::percent;

use super::{QuestionSequencer, QuestionView};

/// Untimed topic practice over pool questions.
///
/// Each question takes one answer, which is graded immediately with the
/// explanation revealed. Nothing is written per answer apart from the
/// gamification counters.
#[derive(Debug, Clone)]
pub struct PracticeSession {
  id: String,
  user_id: String,
  filter: QuestionFilter,
  sequencer: QuestionSequencer,
  answers: HashMap<String, AnswerLetter>,
  started_at: DateTime<Utc>,
}

/// Immediate grading of one practice answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeFeedback {
  pub question_id: String,
  pub selected: AnswerLetter,
  pub correct_answer: AnswerLetter,
  pub is_correct: bool,
  pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PracticeSummary {
  pub correct: u32,
  pub total: u32,
  pub percent: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PracticeView {
  pub id: String,
  pub filter: QuestionFilter,
  pub current_index: usize,
  pub total_questions: usize,
  pub question: QuestionView,
  /// Present once the current question has been answered
  pub feedback: Option<PracticeFeedback>,
  pub answered_count: usize,
  pub is_last: bool,
  pub started_at: DateTime<Utc>,
}

impl PracticeSession {
  pub fn new(
    user_id: &str,
    filter: QuestionFilter,
    questions: Vec<Question>,
    now: DateTime<Utc>,
  ) -> Result<Self, AppError> {
    if questions.is_empty() {
      return Err(AppError::NotFound("Practice questions for these filters".to_string()));
    }
    Ok(Self {
      id: Uuid::new_v4().to_string(),
      user_id: user_id.to_string(),
      filter,
      sequencer: QuestionSequencer::new(questions),
      answers: HashMap::new(),
      started_at: now,
    })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  /// Answer the current question. A question can only be answered once.
  pub fn answer(&mut self, letter: AnswerLetter) -> Result<PracticeFeedback, AppError> {
    let question = self
      .sequencer
      .current()
      .ok_or_else(|| AppError::NotFound("Question".to_string()))?;
    if self.answers.contains_key(&question.id) {
      return Err(AppError::AlreadyAnswered);
    }
    let feedback = feedback_for(question, letter);
    self.answers.insert(question.id.clone(), letter);
    Ok(feedback)
  }

  pub fn advance(&mut self) -> usize {
    self.sequencer.advance();
    self.sequencer.current_index()
  }

  pub fn retreat(&mut self) -> usize {
    self.sequencer.retreat();
    self.sequencer.current_index()
  }

  /// Correct answers out of all questions in the set
  pub fn summary(&self) -> PracticeSummary {
    let correct = self
      .sequencer
      .questions()
      .iter()
      .filter(|q| q.is_correct(self.answers.get(&q.id).copied()))
      .count() as u32;
    let total = self.sequencer.len() as u32;
    PracticeSummary {
      correct,
      total,
      percent: percent(correct, total),
    }
  }

  pub fn view(&self) -> Result<PracticeView, AppError> {
    let question = self
      .sequencer
      .current()
      .ok_or_else(|| AppError::NotFound("Question".to_string()))?;
    Ok(PracticeView {
      id: self.id.clone(),
      filter: self.filter.clone(),
      current_index: self.sequencer.current_index(),
      total_questions: self.sequencer.len(),
      question: QuestionView::from(question),
      feedback: self.answers.get(&question.id).map(|&letter| feedback_for(question, letter)),
      answered_count: self.answers.len(),
      is_last: self.sequencer.is_last(),
      started_at: self.started_at,
    })
  }
}

fn feedback_for(question: &Question, selected: AnswerLetter) -> PracticeFeedback {
  PracticeFeedback {
    question_id: question.id.clone(),
    selected,
    correct_answer: question.correct_answer,
    is_correct: question.is_correct(Some(selected)),
    explanation: question.explanation.clone(),
  }
}
