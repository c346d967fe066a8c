use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AnswerLetter, Question, TestAttempt, UserAnswer};
use crate::error::AppError;
use crate::submission::SubmissionState;

use super::{AnswerLedger, QuestionSequencer, QuestionView, SessionClock};

/// One timed attempt being taken
#[derive(Debug, Clone)]
pub struct TestSession {
  attempt_id: String,
  user_id: String,
  test_id: String,
  sequencer: QuestionSequencer,
  ledger: AnswerLedger,
  clock: SessionClock,
  state: SubmissionState,
  /// Answer rows already durable for the current ledger contents
  answers_saved: bool,
}

/// Palette entry for jumping around the test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigatorEntry {
  pub index: usize,
  pub question_id: String,
  pub answered: bool,
  pub marked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
  pub attempt_id: String,
  pub test_id: String,
  pub current_index: usize,
  pub total_questions: usize,
  pub question: QuestionView,
  pub selected: Option<AnswerLetter>,
  pub is_marked: bool,
  pub answered_count: usize,
  pub marked_count: usize,
  pub remaining_secs: u32,
  pub remaining_display: String,
  pub expired: bool,
  pub state: SubmissionState,
  pub navigator: Vec<NavigatorEntry>,
}

impl TestSession {
  /// Open a session over a freshly created attempt.
  /// A test without questions cannot be taken.
  pub fn new(
    attempt: &TestAttempt,
    questions: Vec<Question>,
    time_limit_secs: u32,
    now: DateTime<Utc>,
  ) -> Result<Self, AppError> {
    if questions.is_empty() {
      return Err(AppError::EmptyTest);
    }
    Ok(Self {
      attempt_id: attempt.id.clone(),
      user_id: attempt.user_id.clone(),
      test_id: attempt.test_id.clone(),
      sequencer: QuestionSequencer::new(questions),
      ledger: AnswerLedger::new(),
      clock: SessionClock::new(time_limit_secs, now),
      state: SubmissionState::InProgress,
      answers_saved: false,
    })
  }

  pub fn attempt_id(&self) -> &str {
    &self.attempt_id
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  pub fn test_id(&self) -> &str {
    &self.test_id
  }

  pub fn state(&self) -> &SubmissionState {
    &self.state
  }

  pub fn ledger(&self) -> &AnswerLedger {
    &self.ledger
  }

  pub fn clock(&self) -> &SessionClock {
    &self.clock
  }

  pub fn sequencer(&self) -> &QuestionSequencer {
    &self.sequencer
  }

  pub fn questions(&self) -> &[Question] {
    self.sequencer.questions()
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.sequencer.current()
  }

  /// Fold elapsed wall-clock time into the countdown and charge it to the
  /// question on screen
  pub fn sync_clock(&mut self, now: DateTime<Utc>) {
    let elapsed = self.clock.catch_up(now);
    if let Some(question) = self.sequencer.current() {
      self.ledger.add_time(&question.id, elapsed);
    }
  }

  /// Select an answer for the current question (last write wins)
  pub fn record_answer(&mut self, letter: AnswerLetter, now: DateTime<Utc>) -> Result<(), AppError> {
    self.state.guard_input()?;
    self.sync_clock(now);
    let question_id = self.current_id()?;
    self.ledger.record_answer(&question_id, letter);
    self.answers_saved = false;
    Ok(())
  }

  /// Flip the review mark on the current question. Returns the new mark.
  pub fn toggle_mark(&mut self, now: DateTime<Utc>) -> Result<bool, AppError> {
    self.state.guard_input()?;
    self.sync_clock(now);
    let question_id = self.current_id()?;
    self.answers_saved = false;
    Ok(self.ledger.toggle_mark(&question_id))
  }

  pub fn advance(&mut self, now: DateTime<Utc>) -> Result<usize, AppError> {
    self.state.guard_input()?;
    self.sync_clock(now);
    self.sequencer.advance();
    Ok(self.sequencer.current_index())
  }

  pub fn retreat(&mut self, now: DateTime<Utc>) -> Result<usize, AppError> {
    self.state.guard_input()?;
    self.sync_clock(now);
    self.sequencer.retreat();
    Ok(self.sequencer.current_index())
  }

  /// One answer record per question from the current ledger
  pub fn build_answers(&self, answered_at: DateTime<Utc>) -> Vec<UserAnswer> {
    self
      .sequencer
      .questions()
      .iter()
      .map(|q| {
        UserAnswer::for_question(
          &self.attempt_id,
          q,
          self.ledger.answer(&q.id),
          self.ledger.is_marked(&q.id),
          self.ledger.time_spent(&q.id),
          answered_at,
        )
      })
      .collect()
  }

  pub fn view(&self) -> Result<SessionView, AppError> {
    let question = self
      .sequencer
      .current()
      .ok_or_else(|| AppError::NotFound("Question".to_string()))?;

    let navigator = self
      .sequencer
      .questions()
      .iter()
      .enumerate()
      .map(|(index, q)| NavigatorEntry {
        index,
        question_id: q.id.clone(),
        answered: self.ledger.answer(&q.id).is_some(),
        marked: self.ledger.is_marked(&q.id),
      })
      .collect();

    Ok(SessionView {
      attempt_id: self.attempt_id.clone(),
      test_id: self.test_id.clone(),
      current_index: self.sequencer.current_index(),
      total_questions: self.sequencer.len(),
      question: QuestionView::from(question),
      selected: self.ledger.answer(&question.id),
      is_marked: self.ledger.is_marked(&question.id),
      answered_count: self.ledger.answered_count(),
      marked_count: self.ledger.marked_count(),
      remaining_secs: self.clock.remaining(),
      remaining_display: self.clock.display(),
      expired: self.clock.is_expired(),
      state: self.state.clone(),
      navigator,
    })
  }

  pub(crate) fn answers_saved(&self) -> bool {
    self.answers_saved
  }

  pub(crate) fn set_answers_saved(&mut self, saved: bool) {
    self.answers_saved = saved;
  }

  pub(crate) fn set_state(&mut self, state: SubmissionState) {
    self.state = state;
  }

  fn current_id(&self) -> Result<String, AppError> {
    self
      .sequencer
      .current()
      .map(|q| q.id.clone())
      .ok_or_else(|| AppError::NotFound("Question".to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Section;
  use crate::testing::sample_question;
  use chrono::Duration;

  fn session() -> (TestSession, DateTime<Utc>) {
    let now = Utc::now();
    let attempt = TestAttempt::new("u1", "t1", now);
    let questions = vec![
      sample_question("rw1", Some("t1"), Section::ReadingWriting),
      sample_question("m1", Some("t1"), Section::Math),
    ];
    (TestSession::new(&attempt, questions, 120, now).unwrap(), now)
  }

  #[test]
  fn test_empty_test_is_rejected() {
    let attempt = TestAttempt::new("u1", "t1", Utc::now());
    let result = TestSession::new(&attempt, Vec::new(), 120, Utc::now());
    assert!(matches!(result, Err(AppError::EmptyTest)));
  }

  #[test]
  fn test_answers_follow_the_cursor() {
    let (mut s, now) = session();
    s.record_answer(AnswerLetter::A, now).unwrap();
    s.advance(now).unwrap();
    s.record_answer(AnswerLetter::D, now).unwrap();
    s.record_answer(AnswerLetter::C, now).unwrap();

    assert_eq!(s.ledger().answer("rw1"), Some(AnswerLetter::A));
    assert_eq!(s.ledger().answer("m1"), Some(AnswerLetter::C));
  }

  #[test]
  fn test_time_is_charged_to_question_on_screen() {
    let (mut s, now) = session();
    s.advance(now + Duration::seconds(20)).unwrap();
    s.record_answer(AnswerLetter::B, now + Duration::seconds(35)).unwrap();

    assert_eq!(s.ledger().time_spent("rw1"), 20);
    assert_eq!(s.ledger().time_spent("m1"), 15);
    assert_eq!(s.clock().remaining(), 85);
  }

  #[test]
  fn test_view_hides_answer_key_and_reports_expiry() {
    let (mut s, now) = session();
    s.toggle_mark(now).unwrap();
    s.sync_clock(now + Duration::seconds(500));

    let view = s.view().unwrap();
    assert_eq!(view.total_questions, 2);
    assert!(view.is_marked);
    assert!(view.expired);
    assert_eq!(view.remaining_display, "0:00:00");
    assert!(view.navigator[0].marked);
    assert!(!view.navigator[1].answered);

    let json = serde_json::to_value(&view).unwrap();
    assert!(json["question"].get("correct_answer").is_none());
    assert!(json["question"].get("explanation").is_none());
  }

  #[test]
  fn test_expired_session_still_accepts_answers() {
    let (mut s, now) = session();
    s.record_answer(AnswerLetter::A, now + Duration::seconds(1000)).unwrap();
    assert!(s.clock().is_expired());
    assert_eq!(s.ledger().answer("rw1"), Some(AnswerLetter::A));
  }

  #[test]
  fn test_build_answers_one_per_question() {
    let (mut s, now) = session();
    let correct = s.questions()[0].correct_answer;
    s.record_answer(correct, now).unwrap();
    s.advance(now).unwrap();
    s.toggle_mark(now).unwrap();

    let answers = s.build_answers(now);
    assert_eq!(answers.len(), 2);
    assert!(answers[0].is_correct);
    assert!(!answers[0].is_marked);
    assert_eq!(answers[1].selected_answer, None);
    assert!(!answers[1].is_correct);
    assert!(answers[1].is_marked);
  }

  #[test]
  fn test_input_resets_saved_flag() {
    let (mut s, now) = session();
    s.set_answers_saved(true);
    s.record_answer(AnswerLetter::A, now).unwrap();
    assert!(!s.answers_saved());
  }
}
