use chrono::NaiveDate;

/// Streak after activity on `today`.
///
/// Same-day activity leaves the streak alone, the next calendar day extends
/// it, and any longer gap (or no prior activity) restarts it at 1. A last
/// activity date in the future is treated like same-day.
pub fn next_streak(current: u32, last_activity: Option<NaiveDate>, today: NaiveDate) -> u32 {
  let Some(last) = last_activity else {
    return 1;
  };
  match (today - last).num_days() {
    1 => current.saturating_add(1),
    d if d > 1 => 1,
    _ => current,
  }
}
