pub mod attempt;
pub mod catalog;
pub mod question;
pub mod stats;

pub use attempt::{ReviewFilter, ReviewItem, TestAttempt, UserAnswer};
pub use catalog::PracticeTest;
pub use question::{AnswerLetter, AnswerOptions, Difficulty, Domain, Question, QuestionFilter, Section};
pub use stats::{Achievement, Notification, RequirementType, UserStats};
