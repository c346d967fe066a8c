//! Persistence seam used by the session, submission and gamification layers.
//!
//! The core only talks to storage through [`PracticeRepository`], so tests can
//! wrap a real connection and inject failures at any step.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result};
use std::collections::HashSet;

use crate::domain::{
    Achievement, PracticeTest, Question, QuestionFilter, ReviewFilter, ReviewItem, TestAttempt, UserAnswer, UserStats,
};
use crate::scoring::ScoreReport;

use super::{achievements, attempts, questions, stats};

pub trait PracticeRepository {
    fn list_tests(&self, include_unpublished: bool) -> Result<Vec<PracticeTest>>;

    /// Questions of a test in sequencing order
    fn load_test_questions(&self, test_id: &str) -> Result<Vec<Question>>;

    /// Pool questions matching the filter, in storage order
    fn load_practice_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>>;

    /// Start an attempt: start timestamp set, completion empty
    fn create_attempt(&self, user_id: &str, test_id: &str, started_at: DateTime<Utc>) -> Result<TestAttempt>;

    fn get_attempt(&self, attempt_id: &str) -> Result<Option<TestAttempt>>;

    /// Idempotent bulk upsert keyed by (attempt, question)
    fn save_answers(&self, answers: &[UserAnswer]) -> Result<()>;

    /// Record scores and completion; false if the attempt was already completed
    fn complete_attempt(&self, attempt_id: &str, report: &ScoreReport, completed_at: DateTime<Utc>) -> Result<bool>;

    fn count_completed_attempts(&self, user_id: &str) -> Result<u32>;

    fn list_review_answers(&self, attempt_id: &str, filter: ReviewFilter) -> Result<Vec<ReviewItem>>;

    fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>>;

    fn create_default_user_stats(&self, user_id: &str) -> Result<UserStats>;

    /// Compare-and-swap on `stats.version`
    fn update_user_stats(&self, stats: &UserStats) -> Result<bool>;

    fn list_achievements(&self) -> Result<Vec<Achievement>>;

    fn list_unlocked_keys(&self, user_id: &str) -> Result<HashSet<String>>;

    /// True only when a new unlock row was written
    fn insert_unlock_record(&self, user_id: &str, achievement_id: &str) -> Result<bool>;

    fn delete_unlock_record(&self, user_id: &str, achievement_id: &str) -> Result<()>;
}

impl PracticeRepository for Connection {
    fn list_tests(&self, include_unpublished: bool) -> Result<Vec<PracticeTest>> {
        questions::list_tests(self, include_unpublished)
    }

    fn load_test_questions(&self, test_id: &str) -> Result<Vec<Question>> {
        questions::load_test_questions(self, test_id)
    }

    fn load_practice_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        questions::load_practice_questions(self, filter)
    }

    fn create_attempt(&self, user_id: &str, test_id: &str, started_at: DateTime<Utc>) -> Result<TestAttempt> {
        let attempt = TestAttempt::new(user_id, test_id, started_at);
        attempts::insert_attempt(self, &attempt)?;
        Ok(attempt)
    }

    fn get_attempt(&self, attempt_id: &str) -> Result<Option<TestAttempt>> {
        attempts::get_attempt(self, attempt_id)
    }

    fn save_answers(&self, answers: &[UserAnswer]) -> Result<()> {
        attempts::save_answers(self, answers)
    }

    fn complete_attempt(&self, attempt_id: &str, report: &ScoreReport, completed_at: DateTime<Utc>) -> Result<bool> {
        attempts::complete_attempt(self, attempt_id, report, completed_at)
    }

    fn count_completed_attempts(&self, user_id: &str) -> Result<u32> {
        attempts::count_completed_attempts(self, user_id)
    }

    fn list_review_answers(&self, attempt_id: &str, filter: ReviewFilter) -> Result<Vec<ReviewItem>> {
        attempts::list_review_answers(self, attempt_id, filter)
    }

    fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>> {
        stats::get_user_stats(self, user_id)
    }

    fn create_default_user_stats(&self, user_id: &str) -> Result<UserStats> {
        stats::create_default_user_stats(self, user_id)
    }

    fn update_user_stats(&self, updated: &UserStats) -> Result<bool> {
        stats::update_user_stats(self, updated)
    }

    fn list_achievements(&self) -> Result<Vec<Achievement>> {
        achievements::list_achievements(self)
    }

    fn list_unlocked_keys(&self, user_id: &str) -> Result<HashSet<String>> {
        achievements::list_unlocked_keys(self, user_id)
    }

    fn insert_unlock_record(&self, user_id: &str, achievement_id: &str) -> Result<bool> {
        achievements::insert_unlock_record(self, user_id, achievement_id)
    }

    fn delete_unlock_record(&self, user_id: &str, achievement_id: &str) -> Result<()> {
        achievements::delete_unlock_record(self, user_id, achievement_id)
    }
}
