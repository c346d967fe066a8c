use crate::domain::UserStats;

/// Add XP and level up at most once.
///
/// The threshold for level N is `N * XP_PER_LEVEL`. An award that crosses
/// several thresholds still only advances one level; the next award picks up
/// the remainder. Returns the new level when a level-up happened.
pub fn apply_xp(stats: &mut UserStats, amount: u32) -> Option<u32> {
  stats.xp = stats.xp.saturating_add(amount);
  if stats.xp >= stats.next_level_xp() {
    stats.level += 1;
    Some(stats.level)
  } else {
    None
  }
}
