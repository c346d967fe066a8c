//! In-memory storage for live sessions, keyed by session id.
//!
//! Entries expire after `SESSION_EXPIRY_HOURS` without access. Expired
//! entries are swept occasionally on access rather than by a background task.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config;

struct SessionEntry<S> {
  session: S,
  last_access: DateTime<Utc>,
}

/// Shared, cloneable handle to a session map
pub struct SessionStore<S> {
  entries: Arc<Mutex<HashMap<String, SessionEntry<S>>>>,
}

impl<S> Clone for SessionStore<S> {
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
    }
  }
}

impl<S> Default for SessionStore<S> {
  fn default() -> Self {
    Self::new()
  }
}

impl<S> SessionStore<S> {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry<S>>> {
    // Poisoned: keep serving with whatever state the panicking thread left
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn insert(&self, id: &str, session: S) {
    let mut entries = self.lock();
    entries.insert(
      id.to_string(),
      SessionEntry {
        session,
        last_access: Utc::now(),
      },
    );
  }

  /// Run `f` against the session with this id, if it is still live
  pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut S) -> T) -> Option<T> {
    let mut entries = self.lock();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      cleanup_expired(&mut entries, Utc::now());
    }

    entries.get_mut(id).map(|entry| {
      entry.last_access = Utc::now();
      f(&mut entry.session)
    })
  }

  pub fn remove(&self, id: &str) -> Option<S> {
    self.lock().remove(id).map(|entry| entry.session)
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drop every session idle since before `now - SESSION_EXPIRY_HOURS`
  pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
    let mut entries = self.lock();
    let before = entries.len();
    cleanup_expired(&mut entries, now);
    before - entries.len()
  }
}

fn cleanup_expired<S>(entries: &mut HashMap<String, SessionEntry<S>>, now: DateTime<Utc>) {
  let expiry = now - Duration::hours(config::SESSION_EXPIRY_HOURS);
  entries.retain(|_, entry| entry.last_access > expiry);
}
