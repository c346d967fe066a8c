use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config;

/// Per-user gamification totals. Created lazily on first read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
  pub user_id: String,
  pub level: u32,
  pub xp: u32,
  pub total_questions_answered: u32,
  pub streak_days: u32,
  pub last_activity_date: Option<NaiveDate>,
  /// Optimistic concurrency token, bumped on every successful write
  #[serde(skip)]
  pub version: i64,
}

impl UserStats {
  pub fn new(user_id: &str) -> Self {
    Self {
      user_id: user_id.to_string(),
      level: 1,
      xp: 0,
      total_questions_answered: 0,
      streak_days: 0,
      last_activity_date: None,
      version: 0,
    }
  }

  /// XP at which the next level-up happens
  pub fn next_level_xp(&self) -> u32 {
    self.level * config::XP_PER_LEVEL
  }

  pub fn xp_to_next_level(&self) -> u32 {
    self.next_level_xp().saturating_sub(self.xp)
  }
}

/// What an achievement's threshold is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
  QuestionsAnswered,
  TestsCompleted,
  StreakDays,
}

impl RequirementType {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "questions_answered" => Some(Self::QuestionsAnswered),
      "tests_completed" => Some(Self::TestsCompleted),
      "streak_days" => Some(Self::StreakDays),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::QuestionsAnswered => "questions_answered",
      Self::TestsCompleted => "tests_completed",
      Self::StreakDays => "streak_days",
    }
  }
}

/// Catalog entry describing an unlockable achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
  pub id: String,
  pub key: String,
  pub name: String,
  pub description: String,
  pub icon: String,
  pub xp_reward: u32,
  pub requirement_type: RequirementType,
  pub requirement_value: u32,
}

/// Events raised to the user by the gamification layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
  LevelUp {
    level: u32,
  },
  AchievementUnlocked {
    key: String,
    name: String,
    description: String,
    icon: String,
    xp_reward: u32,
  },
}

impl Notification {
  pub fn achievement(achievement: &Achievement) -> Self {
    Self::AchievementUnlocked {
      key: achievement.key.clone(),
      name: achievement.name.clone(),
      description: achievement.description.clone(),
      icon: achievement.icon.clone(),
      xp_reward: achievement.xp_reward,
    }
  }
}
