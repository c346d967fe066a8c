//! XP, levels, streaks and achievements.
//!
//! Every stats write is a compare-and-swap on the row version: the engine
//! re-reads and re-applies its change when another writer got in first, and
//! gives up with `ConcurrentStatsRace` after `STATS_UPDATE_RETRIES` tries.

pub mod achievements;
pub mod leveling;
pub mod streak;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::STATS_UPDATE_RETRIES;
use crate::db::PracticeRepository;
use crate::domain::{Notification, UserStats};
use crate::error::AppError;

pub use achievements::{is_satisfied, newly_satisfied, Progress};
pub use leveling::apply_xp;
pub use streak::next_streak;

/// Stats after an event plus whatever the user should be told about
#[derive(Debug, Clone, Serialize)]
pub struct GamificationOutcome {
  pub stats: UserStats,
  pub notifications: Vec<Notification>,
}

pub struct GamificationEngine<'r, R: PracticeRepository + ?Sized> {
  repo: &'r R,
}

impl<'r, R: PracticeRepository + ?Sized> GamificationEngine<'r, R> {
  pub fn new(repo: &'r R) -> Self {
    Self { repo }
  }

  /// Stats for a user, creating the default row on first access
  pub fn load_stats(&self, user_id: &str) -> Result<UserStats, AppError> {
    match self.repo.get_user_stats(user_id)? {
      Some(stats) => Ok(stats),
      None => {
        tracing::debug!("Creating default stats for user {}", user_id);
        Ok(self.repo.create_default_user_stats(user_id)?)
      }
    }
  }

  /// A practice question was answered on `today` (UTC calendar date)
  pub fn on_question_answered(&self, user_id: &str, today: NaiveDate) -> Result<GamificationOutcome, AppError> {
    let (stats, ()) = self.update_with(user_id, |stats| {
      stats.total_questions_answered = stats.total_questions_answered.saturating_add(1);
      if stats.last_activity_date != Some(today) {
        stats.streak_days = next_streak(stats.streak_days, stats.last_activity_date, today);
      }
      stats.last_activity_date = Some(today);
    })?;
    self.evaluate(user_id, stats, None)
  }

  /// A timed attempt was completed; tests-completed achievements become eligible
  pub fn on_test_completed(&self, user_id: &str) -> Result<GamificationOutcome, AppError> {
    let completed = self.repo.count_completed_attempts(user_id)?;
    let stats = self.load_stats(user_id)?;
    self.evaluate(user_id, stats, Some(completed))
  }

  /// Add XP, raising a level-up notification when a threshold is crossed
  pub fn award_xp(&self, user_id: &str, amount: u32) -> Result<(UserStats, Option<Notification>), AppError> {
    let (stats, level_up) = self.update_with(user_id, |stats| apply_xp(stats, amount))?;
    if let Some(level) = level_up {
      tracing::info!("User {} reached level {}", user_id, level);
    }
    Ok((stats, level_up.map(|level| Notification::LevelUp { level })))
  }

  fn evaluate(
    &self,
    user_id: &str,
    mut stats: UserStats,
    tests_completed: Option<u32>,
  ) -> Result<GamificationOutcome, AppError> {
    let catalog = self.repo.list_achievements()?;
    let unlocked = self.repo.list_unlocked_keys(user_id)?;
    let progress = Progress::from_stats(&stats, tests_completed);

    let mut notifications = Vec::new();
    for achievement in newly_satisfied(&catalog, &unlocked, &progress) {
      // Lost the race to a concurrent evaluation: it already paid the XP
      if !self.repo.insert_unlock_record(user_id, &achievement.id)? {
        tracing::debug!("Achievement '{}' already recorded for {}", achievement.key, user_id);
        continue;
      }
      tracing::info!("User {} unlocked achievement '{}'", user_id, achievement.key);

      let (updated, level_up) = match self.award_xp(user_id, achievement.xp_reward) {
        Ok(awarded) => awarded,
        Err(err) => {
          // Release the unlock so a later evaluation pays the XP
          if let Err(e) = self.repo.delete_unlock_record(user_id, &achievement.id) {
            tracing::warn!("Failed to release achievement '{}' for {}: {}", achievement.key, user_id, e);
          }
          return Err(err);
        }
      };
      stats = updated;
      notifications.extend(level_up);
      notifications.push(Notification::achievement(achievement));
    }

    Ok(GamificationOutcome { stats, notifications })
  }

  /// Read-modify-write with optimistic concurrency
  fn update_with<T>(
    &self,
    user_id: &str,
    mut change: impl FnMut(&mut UserStats) -> T,
  ) -> Result<(UserStats, T), AppError> {
    for attempt in 1..=STATS_UPDATE_RETRIES {
      let mut stats = self.load_stats(user_id)?;
      let result = change(&mut stats);
      if self.repo.update_user_stats(&stats)? {
        stats.version += 1;
        return Ok((stats, result));
      }
      tracing::debug!(
        "Stats for {} changed concurrently (try {}/{})",
        user_id,
        attempt,
        STATS_UPDATE_RETRIES
      );
    }
    tracing::warn!("Giving up on stats update for {} after {} tries", user_id, STATS_UPDATE_RETRIES);
    Err(AppError::ConcurrentStatsRace(user_id.to_string()))
  }
}
