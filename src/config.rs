//! Application configuration constants.
//!
//! Runtime values (database path, port, session time limit) are loaded with
//! priority config.toml > environment (.env) > defaults. Everything else is a
//! compile-time constant.

use serde::Deserialize;
use std::path::PathBuf;

use crate::paths;

// ==================== File Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<DatabaseConfig>,
    server: Option<ServerConfig>,
    session: Option<SessionConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SessionConfig {
    time_limit_secs: Option<u32>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub port: u16,
    pub session_time_limit_secs: u32,
}

impl AppConfig {
    /// Load configuration with priority: config.toml > .env / environment > default
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let file = match std::fs::read_to_string("config.toml") {
            Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Ignoring invalid config.toml: {}", e);
                    None
                }
            },
            Err(_) => None,
        };

        Self::resolve(file.unwrap_or_default(), |key| std::env::var(key).ok())
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let database_path = match file.database.and_then(|d| d.path) {
            Some(path) => {
                tracing::info!("Using database from config.toml: {}", path);
                PathBuf::from(path)
            }
            None => match env("DATABASE_PATH") {
                Some(path) => {
                    tracing::info!("Using database from DATABASE_PATH env: {}", path);
                    PathBuf::from(path)
                }
                None => PathBuf::from(paths::db_path()),
            },
        };

        let port = file
            .server
            .and_then(|s| s.port)
            .or_else(|| env("PORT").and_then(|p| p.parse().ok()))
            .unwrap_or(SERVER_PORT);

        let session_time_limit_secs = file
            .session
            .and_then(|s| s.time_limit_secs)
            .or_else(|| env("SESSION_TIME_LIMIT_SECS").and_then(|v| v.parse().ok()))
            .unwrap_or(SESSION_TIME_LIMIT_SECS);

        Self {
            database_path,
            port,
            session_time_limit_secs,
        }
    }

    /// Full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", SERVER_ADDR, self.port)
    }
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Default server port
pub const SERVER_PORT: u16 = 3000;

/// Cookie carrying the auth session token
pub const SESSION_COOKIE_NAME: &str = "sat_session";

// ==================== Test Session Configuration ====================

/// Time budget of a full practice test: 2 hours 14 minutes
pub const SESSION_TIME_LIMIT_SECS: u32 = 2 * 60 * 60 + 14 * 60;

/// In-memory sessions untouched for this long are dropped
pub const SESSION_EXPIRY_HOURS: i64 = 4;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

/// Where the user is sent when a test cannot be loaded
pub const SAFE_LISTING_PATH: &str = "/tests";

// ==================== Scoring ====================

/// Lowest scaled score of a section
pub const SECTION_MIN_SCORE: u32 = 200;

/// Points spread between the lowest and highest section score (200..=800)
pub const SECTION_SCORE_RANGE: u32 = 600;

// ==================== Gamification ====================

/// XP needed per level: a user at level N levels up at N * XP_PER_LEVEL
pub const XP_PER_LEVEL: u32 = 100;

/// Attempts at an optimistic stats update before giving up
pub const STATS_UPDATE_RETRIES: usize = 3;

// ==================== Topic Practice ====================

/// Number of questions in a practice set when none is requested
pub const DEFAULT_PRACTICE_LIMIT: u32 = 10;

/// Upper bound on questions in one practice set
pub const MAX_PRACTICE_LIMIT: u32 = 50;
