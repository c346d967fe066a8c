//! Per-user, in-memory session state.
//!
//! A [`TestSession`] owns the question sequence, the answer ledger and the
//! countdown of one timed attempt. A [`PracticeSession`] is the untimed
//! topic-practice counterpart. Both live in a [`SessionStore`] between
//! requests and are keyed by their own id, never by ambient globals.

pub mod clock;
pub mod ledger;
pub mod practice;
pub mod sequencer;
pub mod store;
pub mod test_session;

use serde::Serialize;

use crate::domain::{AnswerOptions, Difficulty, Domain, Question, Section};

pub use clock::{format_hms, SessionClock};
pub use ledger::AnswerLedger;
pub use practice::{PracticeFeedback, PracticeSession, PracticeSummary, PracticeView};
pub use sequencer::QuestionSequencer;
pub use store::SessionStore;
pub use test_session::{NavigatorEntry, SessionView, TestSession};

/// A question as shown while it is being answered: no answer key, no explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
  pub id: String,
  pub section: Section,
  pub section_name: &'static str,
  pub module_number: u8,
  pub question_text: String,
  pub options: AnswerOptions,
  pub difficulty: Difficulty,
  pub domain: Option<Domain>,
  pub topic: Option<String>,
}

impl From<&Question> for QuestionView {
  fn from(q: &Question) -> Self {
    Self {
      id: q.id.clone(),
      section: q.section,
      section_name: q.section.display_name(),
      module_number: q.module_number,
      question_text: q.question_text.clone(),
      options: q.options.clone(),
      difficulty: q.difficulty,
      domain: q.domain,
      topic: q.topic.clone(),
    }
  }
}
