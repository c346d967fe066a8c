//! Test utilities for database setup and failure injection.
//!
//! Reuses the authoritative schema initialization so tests never carry their
//! own copy of the tables.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result};
use std::cell::Cell;
use std::collections::HashSet;
use tempfile::TempDir;

use crate::db::PracticeRepository;
use crate::domain::{
    Achievement, AnswerLetter, AnswerOptions, Difficulty, Domain, PracticeTest, Question, QuestionFilter,
    ReviewFilter, ReviewItem, Section, TestAttempt, UserAnswer, UserStats,
};
use crate::scoring::ScoreReport;

/// Test environment with a fully migrated sat.db in a temporary directory.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub conn: Connection,
}

impl TestEnv {
    /// Migrated database with the default achievement catalog seeded
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("sat.db"))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        crate::db::run_migrations(&conn)?;
        crate::db::seed_achievements(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Insert a user and return its id
    pub fn create_user(&self, email: &str) -> String {
        crate::auth::db::create_user(&self.conn, email, None).unwrap()
    }
}

/// A valid question whose correct answer is always B
pub fn sample_question(id: &str, test_id: Option<&str>, section: Section) -> Question {
    let domain = match section {
        Section::ReadingWriting => Domain::CraftStructure,
        Section::Math => Domain::Algebra,
    };
    Question {
        id: id.to_string(),
        section,
        module_number: 1,
        question_text: format!("Question {}", id),
        options: AnswerOptions::new("first", "second", "third", "fourth"),
        correct_answer: AnswerLetter::B,
        explanation: "The second option is correct.".to_string(),
        difficulty: Difficulty::Medium,
        domain: Some(domain),
        topic: None,
        order_index: None,
        test_id: test_id.map(str::to_string),
    }
}

fn injected() -> rusqlite::Error {
    rusqlite::Error::InvalidQuery
}

/// Repository over a real connection that fails selected calls on demand.
///
/// Counters are consumed per call: `fail_save_answers(1)` fails the next
/// save and lets later ones through.
pub struct FlakyRepo<'a> {
    inner: &'a Connection,
    fail_save: Cell<usize>,
    fail_complete: Cell<usize>,
    stale_updates: Cell<usize>,
    save_calls: Cell<usize>,
}

impl<'a> FlakyRepo<'a> {
    pub fn new(inner: &'a Connection) -> Self {
        Self {
            inner,
            fail_save: Cell::new(0),
            fail_complete: Cell::new(0),
            stale_updates: Cell::new(0),
            save_calls: Cell::new(0),
        }
    }

    pub fn fail_save_answers(self, times: usize) -> Self {
        self.fail_save.set(times);
        self
    }

    pub fn fail_complete_attempt(self, times: usize) -> Self {
        self.fail_complete.set(times);
        self
    }

    /// Report the next `times` stats updates as lost races without writing
    pub fn stale_stats_updates(self, times: usize) -> Self {
        self.stale_updates.set(times);
        self
    }

    /// How many times `save_answers` was called, failed calls included
    pub fn save_calls(&self) -> usize {
        self.save_calls.get()
    }

    fn take(counter: &Cell<usize>) -> bool {
        let left = counter.get();
        if left > 0 {
            counter.set(left - 1);
            true
        } else {
            false
        }
    }
}

impl PracticeRepository for FlakyRepo<'_> {
    fn list_tests(&self, include_unpublished: bool) -> Result<Vec<PracticeTest>> {
        self.inner.list_tests(include_unpublished)
    }

    fn load_test_questions(&self, test_id: &str) -> Result<Vec<Question>> {
        self.inner.load_test_questions(test_id)
    }

    fn load_practice_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        self.inner.load_practice_questions(filter)
    }

    fn create_attempt(&self, user_id: &str, test_id: &str, started_at: DateTime<Utc>) -> Result<TestAttempt> {
        self.inner.create_attempt(user_id, test_id, started_at)
    }

    fn get_attempt(&self, attempt_id: &str) -> Result<Option<TestAttempt>> {
        self.inner.get_attempt(attempt_id)
    }

    fn save_answers(&self, answers: &[UserAnswer]) -> Result<()> {
        self.save_calls.set(self.save_calls.get() + 1);
        if Self::take(&self.fail_save) {
            return Err(injected());
        }
        self.inner.save_answers(answers)
    }

    fn complete_attempt(&self, attempt_id: &str, report: &ScoreReport, completed_at: DateTime<Utc>) -> Result<bool> {
        if Self::take(&self.fail_complete) {
            return Err(injected());
        }
        self.inner.complete_attempt(attempt_id, report, completed_at)
    }

    fn count_completed_attempts(&self, user_id: &str) -> Result<u32> {
        self.inner.count_completed_attempts(user_id)
    }

    fn list_review_answers(&self, attempt_id: &str, filter: ReviewFilter) -> Result<Vec<ReviewItem>> {
        self.inner.list_review_answers(attempt_id, filter)
    }

    fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>> {
        self.inner.get_user_stats(user_id)
    }

    fn create_default_user_stats(&self, user_id: &str) -> Result<UserStats> {
        self.inner.create_default_user_stats(user_id)
    }

    fn update_user_stats(&self, stats: &UserStats) -> Result<bool> {
        if Self::take(&self.stale_updates) {
            return Ok(false);
        }
        self.inner.update_user_stats(stats)
    }

    fn list_achievements(&self) -> Result<Vec<Achievement>> {
        self.inner.list_achievements()
    }

    fn list_unlocked_keys(&self, user_id: &str) -> Result<HashSet<String>> {
        self.inner.list_unlocked_keys(user_id)
    }

    fn insert_unlock_record(&self, user_id: &str, achievement_id: &str) -> Result<bool> {
        self.inner.insert_unlock_record(user_id, achievement_id)
    }

    fn delete_unlock_record(&self, user_id: &str, achievement_id: &str) -> Result<()> {
        self.inner.delete_unlock_record(user_id, achievement_id)
    }
}
