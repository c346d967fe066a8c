use crate::domain::Question;

/// Ordered, fixed question list with a clamped cursor.
///
/// The list never changes after construction. `advance` and `retreat` are
/// no-ops at the ends, so the cursor always stays within `0..len`.
#[derive(Debug, Clone)]
pub struct QuestionSequencer {
  questions: Vec<Question>,
  current: usize,
}

impl QuestionSequencer {
  pub fn new(questions: Vec<Question>) -> Self {
    Self { questions, current: 0 }
  }

  pub fn current_index(&self) -> usize {
    self.current
  }

  /// None only for an empty list
  pub fn current(&self) -> Option<&Question> {
    self.questions.get(self.current)
  }

  /// Move forward one question. Returns false at the last question.
  pub fn advance(&mut self) -> bool {
    if self.current + 1 < self.questions.len() {
      self.current += 1;
      true
    } else {
      false
    }
  }

  /// Move back one question. Returns false at the first question.
  pub fn retreat(&mut self) -> bool {
    if self.current > 0 {
      self.current -= 1;
      true
    } else {
      false
    }
  }

  pub fn is_first(&self) -> bool {
    self.current == 0
  }

  pub fn is_last(&self) -> bool {
    self.current + 1 >= self.questions.len()
  }

  pub fn len(&self) -> usize {
    self.questions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.questions.is_empty()
  }

  pub fn questions(&self) -> &[Question] {
    &self.questions
  }

  pub fn get(&self, question_id: &str) -> Option<&Question> {
    self.questions.iter().find(|q| q.id == question_id)
  }
}
