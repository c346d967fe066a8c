use std::collections::HashSet;

use crate::domain::{Achievement, RequirementType, UserStats};

/// Values achievement requirements are compared against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
  pub questions_answered: u32,
  pub streak_days: u32,
  /// Only known after a test completes; tests-completed achievements are
  /// skipped when absent
  pub tests_completed: Option<u32>,
}

impl Progress {
  pub fn from_stats(stats: &UserStats, tests_completed: Option<u32>) -> Self {
    Self {
      questions_answered: stats.total_questions_answered,
      streak_days: stats.streak_days,
      tests_completed,
    }
  }
}

pub fn is_satisfied(achievement: &Achievement, progress: &Progress) -> bool {
  let value = match achievement.requirement_type {
    RequirementType::QuestionsAnswered => progress.questions_answered,
    RequirementType::StreakDays => progress.streak_days,
    RequirementType::TestsCompleted => match progress.tests_completed {
      Some(count) => count,
      None => return false,
    },
  };
  value >= achievement.requirement_value
}

/// Catalog entries not yet unlocked whose requirement is now met, in catalog order
pub fn newly_satisfied<'a>(
  catalog: &'a [Achievement],
  unlocked_keys: &HashSet<String>,
  progress: &Progress,
) -> Vec<&'a Achievement> {
  catalog
    .iter()
    .filter(|a| !unlocked_keys.contains(&a.key))
    .filter(|a| is_satisfied(a, progress))
    .collect()
}
