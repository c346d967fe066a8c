use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full-length practice test as listed to users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeTest {
  pub id: String,
  pub title: String,
  pub description: Option<String>,
  pub is_published: bool,
  pub created_at: DateTime<Utc>,
  /// Number of questions currently attached to the test
  pub question_count: u32,
}
