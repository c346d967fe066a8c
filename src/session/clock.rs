use chrono::{DateTime, Duration, Utc};

/// One-second countdown for a timed test.
///
/// Purely informational: reaching zero marks the session expired but does
/// not submit it. Wall-clock time is folded in with [`SessionClock::catch_up`]
/// so a server-held session counts down between requests.
#[derive(Debug, Clone)]
pub struct SessionClock {
  remaining: u32,
  last_sync: DateTime<Utc>,
}

impl SessionClock {
  pub fn new(budget_secs: u32, now: DateTime<Utc>) -> Self {
    Self {
      remaining: budget_secs,
      last_sync: now,
    }
  }

  /// Count down one second, stopping at zero
  pub fn tick(&mut self) -> u32 {
    self.remaining = self.remaining.saturating_sub(1);
    self.remaining
  }

  /// Apply the whole seconds elapsed since the last sync. Returns them so the
  /// caller can attribute time to the current question. Sub-second remainders
  /// carry over to the next sync.
  pub fn catch_up(&mut self, now: DateTime<Utc>) -> u32 {
    let elapsed = (now - self.last_sync).num_seconds();
    if elapsed <= 0 {
      return 0;
    }
    let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
    self.remaining = self.remaining.saturating_sub(elapsed);
    self.last_sync += Duration::seconds(elapsed as i64);
    elapsed
  }

  pub fn remaining(&self) -> u32 {
    self.remaining
  }

  pub fn is_expired(&self) -> bool {
    self.remaining == 0
  }

  /// Remaining time as `H:MM:SS`
  pub fn display(&self) -> String {
    format_hms(self.remaining)
  }
}

pub fn format_hms(total_secs: u32) -> String {
  let hours = total_secs / 3600;
  let minutes = (total_secs % 3600) / 60;
  let seconds = total_secs % 60;
  format!("{}:{:02}:{:02}", hours, minutes, seconds)
}
