//! Application state shared by all handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::session::{PracticeSession, SessionStore, TestSession};

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared database (users, tests, attempts, stats)
    pub db: DbPool,

    pub config: Arc<AppConfig>,

    /// Live timed sessions keyed by attempt id
    pub test_sessions: SessionStore<TestSession>,

    /// Live topic-practice sessions keyed by practice id
    pub practice_sessions: SessionStore<PracticeSession>,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            test_sessions: SessionStore::new(),
            practice_sessions: SessionStore::new(),
        }
    }
}
