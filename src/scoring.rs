//! Linear section scoring.
//!
//! Each section maps `correct / total` onto 200..=800 and the total is the sum
//! of both sections. This is a flat approximation, not the adaptive curve of
//! the real exam. A section without questions scores 0 across the board.

use serde::{Deserialize, Serialize};

use crate::config::{SECTION_MIN_SCORE, SECTION_SCORE_RANGE};
use crate::domain::{AnswerLetter, Question, Section, TestAttempt};
use crate::session::AnswerLedger;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScore {
  pub correct: u32,
  pub total: u32,
  pub score: u32,
}

impl SectionScore {
  pub fn new(correct: u32, total: u32) -> Self {
    Self {
      correct,
      total,
      score: section_score(correct, total),
    }
  }

  /// Share of correct answers as a whole percentage, 0 for an empty section
  pub fn percent(&self) -> u32 {
    percent(self.correct, self.total)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
  pub reading_writing: SectionScore,
  pub math: SectionScore,
  pub total_score: u32,
}

impl ScoreReport {
  pub fn new(reading_writing: SectionScore, math: SectionScore) -> Self {
    Self {
      reading_writing,
      math,
      total_score: reading_writing.score + math.score,
    }
  }

  /// Scores as recorded on a completed attempt; missing columns read as 0
  pub fn from_attempt(attempt: &TestAttempt) -> Self {
    let stored = |correct: Option<u32>, total: Option<u32>, score: Option<u32>| SectionScore {
      correct: correct.unwrap_or(0),
      total: total.unwrap_or(0),
      score: score.unwrap_or(0),
    };
    Self {
      reading_writing: stored(attempt.rw_correct, attempt.rw_total, attempt.rw_score),
      math: stored(attempt.math_correct, attempt.math_total, attempt.math_score),
      total_score: attempt.total_score.unwrap_or(0),
    }
  }

  pub fn section(&self, section: Section) -> &SectionScore {
    match section {
      Section::ReadingWriting => &self.reading_writing,
      Section::Math => &self.math,
    }
  }
}

/// `round(200 + correct / total * 600)`, or 0 when `total == 0`.
///
/// Integer arithmetic, rounding halves up.
pub fn section_score(correct: u32, total: u32) -> u32 {
  if total == 0 {
    return 0;
  }
  let correct = correct.min(total) as u64;
  let total = total as u64;
  let scaled = (2 * correct * SECTION_SCORE_RANGE as u64 + total) / (2 * total);
  SECTION_MIN_SCORE + scaled as u32
}

/// Rounded percentage, guarded against empty denominators
pub fn percent(correct: u32, total: u32) -> u32 {
  if total == 0 {
    return 0;
  }
  ((200 * correct as u64 + total as u64) / (2 * total as u64)) as u32
}

/// Score a question list given a lookup of the selected answer per question
pub fn score_answers<F>(questions: &[Question], answer_of: F) -> ScoreReport
where
  F: Fn(&Question) -> Option<AnswerLetter>,
{
  let mut rw = (0u32, 0u32);
  let mut math = (0u32, 0u32);

  for question in questions {
    let tally = match question.section {
      Section::ReadingWriting => &mut rw,
      Section::Math => &mut math,
    };
    tally.1 += 1;
    if question.is_correct(answer_of(question)) {
      tally.0 += 1;
    }
  }

  ScoreReport::new(SectionScore::new(rw.0, rw.1), SectionScore::new(math.0, math.1))
}

/// Score the final state of an answer ledger
pub fn score_ledger(questions: &[Question], ledger: &AnswerLedger) -> ScoreReport {
  score_answers(questions, |q| ledger.answer(&q.id))
}
