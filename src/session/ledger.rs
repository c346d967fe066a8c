use std::collections::{HashMap, HashSet};

use crate::domain::AnswerLetter;

/// In-memory answers and review marks of one session, keyed by question id.
///
/// Answers are last-write-wins until submission. A question with no entry
/// reads as unanswered, which is distinct from every letter.
#[derive(Debug, Clone, Default)]
pub struct AnswerLedger {
  answers: HashMap<String, AnswerLetter>,
  marked: HashSet<String>,
  time_spent: HashMap<String, u32>,
}

impl AnswerLedger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record_answer(&mut self, question_id: &str, letter: AnswerLetter) {
    self.answers.insert(question_id.to_string(), letter);
  }

  pub fn answer(&self, question_id: &str) -> Option<AnswerLetter> {
    self.answers.get(question_id).copied()
  }

  /// Flip the mark for a question. Returns whether it is now marked.
  pub fn toggle_mark(&mut self, question_id: &str) -> bool {
    if self.marked.remove(question_id) {
      false
    } else {
      self.marked.insert(question_id.to_string());
      true
    }
  }

  pub fn is_marked(&self, question_id: &str) -> bool {
    self.marked.contains(question_id)
  }

  pub fn add_time(&mut self, question_id: &str, seconds: u32) {
    if seconds == 0 {
      return;
    }
    let spent = self.time_spent.entry(question_id.to_string()).or_insert(0);
    *spent = spent.saturating_add(seconds);
  }

  pub fn time_spent(&self, question_id: &str) -> u32 {
    self.time_spent.get(question_id).copied().unwrap_or(0)
  }

  pub fn answered_count(&self) -> usize {
    self.answers.len()
  }

  pub fn marked_count(&self) -> usize {
    self.marked.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unanswered_reads_as_none() {
    let ledger = AnswerLedger::new();
    assert_eq!(ledger.answer("q1"), None);
    assert_eq!(ledger.answered_count(), 0);
  }

  #[test]
  fn test_last_write_wins() {
    let mut ledger = AnswerLedger::new();
    ledger.record_answer("q1", AnswerLetter::A);
    ledger.record_answer("q1", AnswerLetter::D);
    ledger.record_answer("q1", AnswerLetter::B);
    assert_eq!(ledger.answer("q1"), Some(AnswerLetter::B));
    assert_eq!(ledger.answered_count(), 1);
  }

  #[test]
  fn test_toggle_mark_twice_restores() {
    let mut ledger = AnswerLedger::new();
    assert!(ledger.toggle_mark("q1"));
    assert!(ledger.is_marked("q1"));
    assert!(!ledger.toggle_mark("q1"));
    assert!(!ledger.is_marked("q1"));
    assert_eq!(ledger.marked_count(), 0);
  }

  #[test]
  fn test_marks_are_independent_of_answers() {
    let mut ledger = AnswerLedger::new();
    ledger.toggle_mark("q2");
    assert_eq!(ledger.answer("q2"), None);
    ledger.record_answer("q2", AnswerLetter::C);
    assert!(ledger.is_marked("q2"));
  }

  #[test]
  fn test_time_accumulates() {
    let mut ledger = AnswerLedger::new();
    ledger.add_time("q1", 30);
    ledger.add_time("q1", 12);
    ledger.add_time("q2", 0);
    assert_eq!(ledger.time_spent("q1"), 42);
    assert_eq!(ledger.time_spent("q2"), 0);
  }
}
