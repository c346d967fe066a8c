use serde::{Deserialize, Serialize};

/// Answer choice for a four-option multiple choice question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerLetter {
  A,
  B,
  C,
  D,
}

impl AnswerLetter {
  pub const ALL: [AnswerLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

  pub fn from_str(s: &str) -> Option<Self> {
    match s.trim() {
      "A" | "a" => Some(Self::A),
      "B" | "b" => Some(Self::B),
      "C" | "c" => Some(Self::C),
      "D" | "d" => Some(Self::D),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::A => "A",
      Self::B => "B",
      Self::C => "C",
      Self::D => "D",
    }
  }

  /// Position of this letter in the option array
  pub fn index(&self) -> usize {
    match self {
      Self::A => 0,
      Self::B => 1,
      Self::C => 2,
      Self::D => 3,
    }
  }
}

/// Test section a question belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
  ReadingWriting,
  Math,
}

impl Section {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "reading_writing" => Some(Self::ReadingWriting),
      "math" => Some(Self::Math),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::ReadingWriting => "reading_writing",
      Self::Math => "math",
    }
  }

  pub fn display_name(&self) -> &'static str {
    match self {
      Self::ReadingWriting => "Reading & Writing",
      Self::Math => "Math",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "easy" => Some(Self::Easy),
      "medium" => Some(Self::Medium),
      "hard" => Some(Self::Hard),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "easy",
      Self::Medium => "medium",
      Self::Hard => "hard",
    }
  }
}

/// Content classification of a question. Reading & Writing and Math
/// domains are disjoint; which family applies follows from the section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
  // Reading & Writing
  InformationIdeas,
  CraftStructure,
  ExpressionIdeas,
  StandardEnglish,
  // Math
  Algebra,
  AdvancedMath,
  ProblemSolvingData,
  GeometryTrig,
}

impl Domain {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "information_ideas" => Some(Self::InformationIdeas),
      "craft_structure" => Some(Self::CraftStructure),
      "expression_ideas" => Some(Self::ExpressionIdeas),
      "standard_english" => Some(Self::StandardEnglish),
      "algebra" => Some(Self::Algebra),
      "advanced_math" => Some(Self::AdvancedMath),
      "problem_solving_data" => Some(Self::ProblemSolvingData),
      "geometry_trig" => Some(Self::GeometryTrig),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::InformationIdeas => "information_ideas",
      Self::CraftStructure => "craft_structure",
      Self::ExpressionIdeas => "expression_ideas",
      Self::StandardEnglish => "standard_english",
      Self::Algebra => "algebra",
      Self::AdvancedMath => "advanced_math",
      Self::ProblemSolvingData => "problem_solving_data",
      Self::GeometryTrig => "geometry_trig",
    }
  }

  /// Section this domain classifies
  pub fn section(&self) -> Section {
    match self {
      Self::InformationIdeas | Self::CraftStructure | Self::ExpressionIdeas | Self::StandardEnglish => {
        Section::ReadingWriting
      }
      Self::Algebra | Self::AdvancedMath | Self::ProblemSolvingData | Self::GeometryTrig => Section::Math,
    }
  }
}

/// Four option texts, indexed by `AnswerLetter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOptions(pub [String; 4]);

impl AnswerOptions {
  pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>, d: impl Into<String>) -> Self {
    Self([a.into(), b.into(), c.into(), d.into()])
  }

  pub fn get(&self, letter: AnswerLetter) -> &str {
    &self.0[letter.index()]
  }

  pub fn iter(&self) -> impl Iterator<Item = (AnswerLetter, &str)> {
    AnswerLetter::ALL.into_iter().map(move |l| (l, self.get(l)))
  }
}

/// A single multiple choice question. Immutable once loaded into a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub section: Section,
  pub module_number: u8,
  pub question_text: String,
  pub options: AnswerOptions,
  pub correct_answer: AnswerLetter,
  pub explanation: String,
  pub difficulty: Difficulty,
  pub domain: Option<Domain>,
  pub topic: Option<String>,
  pub order_index: Option<i64>,
  /// Owning test; None for topic-practice pool questions
  pub test_id: Option<String>,
}

impl Question {
  pub fn is_correct(&self, selected: Option<AnswerLetter>) -> bool {
    selected == Some(self.correct_answer)
  }

  pub fn is_practice_pool(&self) -> bool {
    self.test_id.is_none()
  }

  /// Check the structural rules a stored question must satisfy.
  /// Returns the first violated rule as a message.
  pub fn validate(&self) -> Result<(), String> {
    if self.id.trim().is_empty() {
      return Err("Question id is required".to_string());
    }
    if !(1..=2).contains(&self.module_number) {
      return Err(format!("Module number must be 1 or 2, got {}", self.module_number));
    }
    if self.question_text.trim().is_empty() {
      return Err("Question text is required".to_string());
    }
    for (letter, text) in self.options.iter() {
      if text.trim().is_empty() {
        return Err(format!("Option {} is required", letter.as_str()));
      }
    }
    if self.explanation.trim().is_empty() {
      return Err("Explanation is required".to_string());
    }
    match self.domain {
      None => Err("Domain is required".to_string()),
      Some(domain) if domain.section() != self.section => Err(format!(
        "Domain '{}' does not belong to section '{}'",
        domain.as_str(),
        self.section.as_str()
      )),
      Some(_) => Ok(()),
    }
  }
}

/// Criteria for drawing topic-practice questions from the pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionFilter {
  pub section: Option<Section>,
  pub domain: Option<Domain>,
  pub difficulty: Option<Difficulty>,
  pub topic: Option<String>,
  pub limit: Option<u32>,
}

impl QuestionFilter {
  /// Requested limit clamped to 1..=MAX_PRACTICE_LIMIT
  pub fn effective_limit(&self) -> u32 {
    self
      .limit
      .unwrap_or(crate::config::DEFAULT_PRACTICE_LIMIT)
      .clamp(1, crate::config::MAX_PRACTICE_LIMIT)
  }
}
